/// Form for submitting a new review; a successful write is shown in `feed`
/// right away, ahead of the next live snapshot.
use gloo_timers::future::TimeoutFuture;
use leptos::ev::SubmitEvent;
use leptos::logging::log;
use leptos::*;
use wasm_bindgen_futures::spawn_local;

use crate::components::star_rating::StarRating;
use crate::config::ReviewsConfig;
use crate::feed::Feed;
use crate::models::service::Service;
use crate::repository::ReviewRepository;
use crate::workflow::{SubmissionWorkflow, SUCCESS_MESSAGE};
use crate::AppStore;

#[component]
pub fn ReviewForm(
    feed: RwSignal<Feed>,
    #[prop(optional)] show_email: bool,
) -> impl IntoView {
    let repository = expect_context::<ReviewRepository<AppStore>>();
    let flash_ms = u32::try_from(expect_context::<ReviewsConfig>().success_flash().as_millis())
        .unwrap_or(u32::MAX);
    let workflow = create_rw_signal(SubmissionWorkflow::new());

    let submitting = move || workflow.with(|w| w.is_submitting());

    let handle_submit = move |ev: SubmitEvent| {
        ev.prevent_default();
        let review = match workflow.try_update(|w| w.begin()) {
            Some(Ok(review)) => review,
            Some(Err(err)) => {
                log!("[REVIEWS] Submission rejected: {}", err);
                return;
            }
            None => return,
        };
        let repository = repository.clone();
        spawn_local(async move {
            let outcome = repository.submit(&review).await;
            if let Ok(written) = &outcome {
                feed.try_update(|f| f.insert_optimistic(written.clone()));
            }
            let succeeded = outcome.is_ok();
            // The form may already be gone; nothing is left to update then.
            if workflow.try_update(|w| w.complete(&outcome)).is_none() || !succeeded {
                return;
            }
            TimeoutFuture::new(flash_ms).await;
            workflow.try_update(|w| w.expire_success());
        });
    };

    view! {
        <form class="review-form" on:submit=handle_submit>
            <h3>{ "Share Your Experience" }</h3>

            <label for="review-name">{ "Name *" }</label>
            <input
                type="text"
                id="review-name"
                placeholder="Enter your name"
                prop:value=move || workflow.with(|w| w.draft().name.clone())
                prop:disabled=submitting
                on:input=move |ev| {
                    let value = event_target_value(&ev);
                    workflow.update(|w| w.edit(|d| d.name = value));
                }
            />

            {show_email.then(|| view! {
                <label for="review-email">{ "Email" }</label>
                <input
                    type="email"
                    id="review-email"
                    placeholder="Enter your email (optional)"
                    prop:value=move || workflow.with(|w| w.draft().email.clone())
                    prop:disabled=submitting
                    on:input=move |ev| {
                        let value = event_target_value(&ev);
                        workflow.update(|w| w.edit(|d| d.email = value));
                    }
                />
            })}

            <label>{ "Rating *" }</label>
            <StarRating
                rating=Signal::derive(move || workflow.with(|w| w.draft().rating))
                on_select=Callback::new(move |star: u8| workflow.update(|w| w.edit(|d| d.rating = star)))
            />

            <label for="review-service">{ "Service" }</label>
            <select
                id="review-service"
                prop:disabled=submitting
                prop:value=move || workflow.with(|w| {
                    w.draft().service.map(|s| s.label().to_string()).unwrap_or_default()
                })
                on:change=move |ev| {
                    let label = event_target_value(&ev);
                    let service = (!label.is_empty()).then(|| Service::from_label(&label));
                    workflow.update(|w| w.edit(|d| d.service = service));
                }
            >
                <option value="">{ "Select a service" }</option>
                {Service::ALL.iter().map(|service| view! {
                    <option value={service.label()}>{ service.label() }</option>
                }).collect::<Vec<_>>()}
            </select>

            <label for="review-message">{ "Your Review *" }</label>
            <textarea
                id="review-message"
                rows="4"
                placeholder="Tell us about your experience"
                prop:value=move || workflow.with(|w| w.draft().message.clone())
                prop:disabled=submitting
                on:input=move |ev| {
                    let value = event_target_value(&ev);
                    workflow.update(|w| w.edit(|d| d.message = value));
                }
            />

            {move || workflow.with(|w| w.error_message().map(str::to_string)).map(|msg| view! {
                <p class="banner error">{ msg }</p>
            })}
            {move || workflow.with(|w| w.succeeded()).then(|| view! {
                <p class="banner success">{ SUCCESS_MESSAGE }</p>
            })}

            <button type="submit" prop:disabled=submitting>
                {move || if submitting() { "Submitting..." } else { "Submit Review" }}
            </button>
        </form>
    }
}
