//! Customer reviews for the practice website: a live review feed with
//! submission, sample seeding and aggregate ratings, rendered with Leptos.
pub mod api;
pub mod app;
pub mod config;
pub mod db;
pub mod error;
pub mod feed;
pub mod repository;
pub mod stats;
pub mod workflow;

pub mod models {
    pub mod review;
    pub mod service;
}

pub mod store {
    pub mod document;
    pub mod listeners;
    pub mod memory;
    pub mod remote;
}

pub mod components {
    pub mod all_reviews;
    pub mod feedback;
    pub mod review_carousel;
    pub mod review_form;
    pub mod reviews_list;
    pub mod star_rating;
    pub mod stats_panel;
}

/// Store backing the rendered pages: SQLite on the server, HTTP in the browser.
#[cfg(feature = "ssr")]
pub type AppStore = db::SqliteStore;
#[cfg(not(feature = "ssr"))]
pub type AppStore = store::remote::HttpStore;

#[cfg(feature = "hydrate")]
#[wasm_bindgen::prelude::wasm_bindgen]
pub fn hydrate() {
    use crate::app::App;

    console_error_panic_hook::set_once();
    leptos::mount_to_body(App);
}
