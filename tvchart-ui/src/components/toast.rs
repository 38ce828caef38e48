//! Toast Notification Component

use leptos::*;

use crate::state::global::GlobalState;

/// Error toast, cleared by [`GlobalState::show_error`]'s timeout
#[component]
pub fn Toast() -> impl IntoView {
    let state = use_context::<GlobalState>().expect("GlobalState not found");

    view! {
        <div class="fixed bottom-20 right-4 z-50 space-y-2">
            {move || {
                state.error.get().map(|msg| view! {
                    <div class="flex items-center space-x-3 bg-red-600 text-white px-4 py-3 \
                                rounded-lg shadow-lg animate-slide-in">
                        <span class="text-lg">"✕"</span>
                        <span class="text-sm font-medium">{msg}</span>
                    </div>
                })
            }}
        </div>
    }
}
