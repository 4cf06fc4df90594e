/// Application root: the home-page feedback section and the full reviews page.
use leptos::*;
use leptos_meta::*;
use leptos_router::*;
use crate::components::{all_reviews::AllReviews, feedback::Feedback};
use crate::config::{ReviewsConfig, CONFIG_ELEMENT_ID};

#[component]
pub fn App() -> impl IntoView {
    provide_meta_context();

    // The server hands the SQLite-backed repository and its settings in
    // through route context, and writes the settings into the page.
    #[cfg(feature = "ssr")]
    let config = use_context::<ReviewsConfig>().unwrap_or_default();

    // The browser picks the settings back up from the page and talks to the
    // same store over HTTP.
    #[cfg(not(feature = "ssr"))]
    let config = {
        use crate::repository::ReviewRepository;
        use crate::store::remote::HttpStore;

        let embedded = document()
            .get_element_by_id(CONFIG_ELEMENT_ID)
            .and_then(|el| el.text_content());
        let config = ReviewsConfig::from_page_json(embedded.as_deref());
        let store = HttpStore::new("", config.poll_interval());
        provide_context(ReviewRepository::with_collection(store, config.collection.clone()));
        provide_context(config.clone());
        config
    };

    view! {
        <Stylesheet id="leptos" href="/pkg/reviewdesk.css"/>
        <Title text="Client Reviews"/>
        <script id=CONFIG_ELEMENT_ID type="application/json" inner_html=config.to_page_json()></script>
        <Router>
            <main>
                <Routes>
                    <Route path="/" view=Feedback/>
                    <Route path="/reviews" view=AllReviews/>
                </Routes>
            </main>
        </Router>
    }
}
