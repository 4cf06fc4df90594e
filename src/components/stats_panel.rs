use leptos::*;

use crate::feed::Feed;

/// Count, average and share of 4+ star ratings over the reviews in `feed`.
#[component]
pub fn StatsPanel(feed: RwSignal<Feed>) -> impl IntoView {
    let stats = create_memo(move |_| feed.with(|f| f.stats()));

    view! {
        <div class="stats-panel">
            <div class="stat">
                <span class="value">{move || stats.get().count}</span>
                <span class="label">{ "Reviews" }</span>
            </div>
            <div class="stat">
                <span class="value">{move || stats.get().average_label()}</span>
                <span class="label">{ "Average Rating" }</span>
            </div>
            <div class="stat">
                <span class="value">{move || format!("{}%", stats.get().satisfaction_rate)}</span>
                <span class="label">{ "Satisfied Clients" }</span>
            </div>
        </div>
    }
}
