use leptos::*;

/// Five clickable stars; hovering previews a rating without picking it.
#[component]
pub fn StarRating(
    #[prop(into)] rating: Signal<u8>,
    on_select: Callback<u8>,
) -> impl IntoView {
    let (hovered, set_hovered) = create_signal(0u8);

    view! {
        <div class="star-rating">
            {(1..=5u8)
                .map(|star| {
                    let lit = move || {
                        let shown = if hovered.get() > 0 { hovered.get() } else { rating.get() };
                        star <= shown
                    };
                    view! {
                        <button
                            type="button"
                            class="star"
                            class:lit=lit
                            on:click=move |_| on_select.call(star)
                            on:mouseenter=move |_| set_hovered.set(star)
                            on:mouseleave=move |_| set_hovered.set(0)
                        >
                            { "★" }
                        </button>
                    }
                })
                .collect::<Vec<_>>()}
        </div>
    }
}

/// Read-only stars for a stored rating.
#[component]
pub fn Stars(rating: u8) -> impl IntoView {
    let filled = "★".repeat(usize::from(rating.min(5)));
    let empty = "☆".repeat(usize::from(5 - rating.min(5)));
    view! {
        <span class="stars" title=format!("{}/5", rating)>
            {filled}{empty}
        </span>
    }
}
