/// Review cards, the full review list, and the hook that keeps a page's feed
/// attached to a live query.
use futures::StreamExt;
use leptos::logging::log;
use leptos::*;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use wasm_bindgen_futures::spawn_local;

use crate::components::star_rating::Stars;
use crate::feed::{Feed, FeedStatus};
use crate::models::review::Review;
use crate::repository::ReviewRepository;
use crate::store::listeners::SubscriptionHandle;
use crate::AppStore;

/// Ties a live query to the lifetime of the surface showing it. Once closed,
/// a late subscription is released as soon as it is attached.
#[derive(Default)]
pub struct LiveFeedLease {
    closed: Cell<bool>,
    handle: RefCell<Option<SubscriptionHandle>>,
}

impl LiveFeedLease {
    pub fn is_open(&self) -> bool {
        !self.closed.get()
    }

    /// Returns false when the surface is already gone; the handle is released.
    pub fn attach(&self, handle: SubscriptionHandle) -> bool {
        if self.closed.get() {
            handle.release();
            return false;
        }
        *self.handle.borrow_mut() = Some(handle);
        true
    }

    pub fn close(&self) {
        self.closed.set(true);
        if let Some(handle) = self.handle.borrow_mut().take() {
            handle.release();
        }
    }
}

/// Creates a feed signal for the current surface and streams snapshots of the
/// newest reviews into it until the surface is disposed.
pub fn use_live_feed(initial: Feed, seed_first: bool) -> RwSignal<Feed> {
    let repository = expect_context::<ReviewRepository<AppStore>>();
    let limit = initial.limit();
    let feed = create_rw_signal(initial);
    let lease = Rc::new(LiveFeedLease::default());

    on_cleanup({
        let lease = lease.clone();
        move || lease.close()
    });

    // Effects only run in the browser.
    create_effect(move |_| {
        let repository = repository.clone();
        let lease = lease.clone();
        spawn_local(async move {
            if seed_first {
                repository.ensure_seeded().await;
            }
            if !lease.is_open() {
                return;
            }
            let mut stream = repository.subscribe(limit).await;
            if !lease.attach(stream.handle()) {
                return;
            }
            while let Some(update) = stream.next().await {
                if feed.try_update(|f| f.apply(update)).is_none() {
                    break;
                }
            }
            log!("[REVIEWS] Live feed closed");
        });
    });

    feed
}

#[component]
pub fn ReviewCard(review: Review) -> impl IntoView {
    let date = review.timestamp.format("%d %b %Y").to_string();
    view! {
        <article class="review-card">
            <header>
                <span class="avatar">{ review.initials() }</span>
                <div>
                    <strong>{ review.name.clone() }</strong>
                    <span class="service">{ review.service.label() }</span>
                </div>
            </header>
            <Stars rating=review.rating/>
            <p class="message">{ review.message.clone() }</p>
            <time class="date">{ date }</time>
        </article>
    }
}

/// Every review in the feed, newest first.
#[component]
pub fn ReviewsList(feed: RwSignal<Feed>) -> impl IntoView {
    view! {
        <div class="reviews-list">
            {move || {
                let status = feed.with(|f| f.status().clone());
                let reviews = feed.with(|f| f.current().to_vec());
                let banner = match status {
                    FeedStatus::Loading => Some(view! { <p class="loading">{ "Loading reviews..." }</p> }),
                    FeedStatus::Failed(msg) => Some(view! { <p class="error">{ msg }</p> }),
                    FeedStatus::Ready if reviews.is_empty() => Some(view! {
                        <p class="empty">{ "No reviews yet. Be the first to share your experience!" }</p>
                    }),
                    FeedStatus::Ready => None,
                };
                view! {
                    {banner}
                    <ul>
                        {reviews.into_iter().map(|review| view! {
                            <li key={review.id.clone()}>
                                <ReviewCard review=review/>
                            </li>
                        }).collect::<Vec<_>>()}
                    </ul>
                }
            }}
        </div>
    }
}
