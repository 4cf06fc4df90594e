use leptos::*;
use leptos_router::A;

use crate::components::review_carousel::ReviewCarousel;
use crate::components::review_form::ReviewForm;
use crate::components::reviews_list::use_live_feed;
use crate::components::stats_panel::StatsPanel;
use crate::config::ReviewsConfig;
use crate::feed::Feed;

/// Home-page section: figures and a carousel over the latest reviews, next
/// to the form.
#[component]
pub fn Feedback() -> impl IntoView {
    let limit = expect_context::<ReviewsConfig>().carousel_limit;
    let feed = use_live_feed(Feed::bounded(limit), false);

    view! {
        <section class="feedback" id="feedback">
            <h2>{ "Client Feedback" }</h2>
            <StatsPanel feed=feed/>
            <div class="feedback-grid">
                <ReviewCarousel feed=feed/>
                <ReviewForm feed=feed show_email=true/>
            </div>
            <A href="/reviews">{ "View all reviews →" }</A>
        </section>
    }
}
