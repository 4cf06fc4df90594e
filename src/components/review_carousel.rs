use leptos::leptos_dom::helpers::IntervalHandle;
use leptos::*;
use std::cell::Cell;
use std::rc::Rc;

use crate::components::reviews_list::ReviewCard;
use crate::config::ReviewsConfig;
use crate::feed::{Carousel, Feed, FeedStatus};

/// Shows one review at a time from the bounded feed and rotates through them.
#[component]
pub fn ReviewCarousel(feed: RwSignal<Feed>) -> impl IntoView {
    let interval = expect_context::<ReviewsConfig>().rotation_interval();
    let carousel = create_rw_signal(Carousel::default());
    let len = create_memo(move |_| feed.with(|f| f.len()));

    // A shorter snapshot must not leave the pointer past the end.
    create_effect(move |_| {
        let n = len.get();
        carousel.update(|c| c.clamp(n));
    });

    // Restart the timer whenever the number of slides changes.
    let timer: Rc<Cell<Option<IntervalHandle>>> = Rc::new(Cell::new(None));
    create_effect({
        let timer = timer.clone();
        move |_| {
            if let Some(handle) = timer.take() {
                handle.clear();
            }
            if !Carousel::rotates(len.get()) {
                return;
            }
            let tick = move || {
                carousel.try_update(|c| c.advance(len.get_untracked()));
            };
            timer.set(set_interval_with_handle(tick, interval).ok());
        }
    });
    on_cleanup(move || {
        if let Some(handle) = timer.take() {
            handle.clear();
        }
    });

    let slide = move || {
        let status = feed.with(|f| f.status().clone());
        match status {
            FeedStatus::Loading => view! { <p class="loading">{ "Loading reviews..." }</p> }.into_view(),
            FeedStatus::Failed(msg) => view! { <p class="error">{ msg }</p> }.into_view(),
            FeedStatus::Ready => {
                let index = carousel.with(|c| c.index());
                match feed.with(|f| f.current().get(index).cloned()) {
                    Some(review) => view! { <ReviewCard review=review/> }.into_view(),
                    None => view! {
                        <p class="empty">{ "No reviews yet. Be the first to share your experience!" }</p>
                    }
                    .into_view(),
                }
            }
        }
    };

    view! {
        <div class="carousel">
            <div class="slide">{slide}</div>
            <Show when=move || Carousel::rotates(len.get()) fallback=|| ()>
                <div class="controls">
                    <button
                        type="button"
                        class="prev"
                        on:click=move |_| carousel.update(|c| c.previous(len.get_untracked()))
                    >
                        { "‹" }
                    </button>
                    {move || {
                        let current = carousel.with(|c| c.index());
                        (0..len.get())
                            .map(|i| view! {
                                <button
                                    type="button"
                                    class="dot"
                                    class:active={i == current}
                                    on:click=move |_| carousel.update(|c| c.go_to(i, len.get_untracked()))
                                />
                            })
                            .collect::<Vec<_>>()
                    }}
                    <button
                        type="button"
                        class="next"
                        on:click=move |_| carousel.update(|c| c.advance(len.get_untracked()))
                    >
                        { "›" }
                    </button>
                </div>
            </Show>
        </div>
    }
}
