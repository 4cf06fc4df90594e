use leptos::*;
use leptos_meta::Title;
use leptos_router::A;

use crate::components::review_form::ReviewForm;
use crate::components::reviews_list::{use_live_feed, ReviewsList};
use crate::components::stats_panel::StatsPanel;
use crate::feed::Feed;

/// Full reviews page: every review, with sample reviews written on first visit.
#[component]
pub fn AllReviews() -> impl IntoView {
    let feed = use_live_feed(Feed::unbounded(), true);

    view! {
        <Title text="Client Reviews"/>
        <section class="all-reviews">
            <A href="/">{ "← Back to home" }</A>
            <h1>{ "What Our Clients Say" }</h1>
            <StatsPanel feed=feed/>
            <ReviewForm feed=feed/>
            <ReviewsList feed=feed/>
        </section>
    }
}
