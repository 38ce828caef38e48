//! Instrument and interval selectors
//!
//! Each selection updates the shared binding; the chart component rebinds
//! its widget in response.

use leptos::*;

use crate::state::global::{GlobalState, INSTRUMENTS};

/// Intervals offered in the toolbar, as (label, resolution)
const INTERVALS: [(&str, &str); 5] = [
    ("15m", "15"),
    ("1H", "60"),
    ("4H", "240"),
    ("1D", "D"),
    ("1W", "W"),
];

#[component]
pub fn InstrumentPicker() -> impl IntoView {
    let state = use_context::<GlobalState>().expect("GlobalState not found");
    let binding = state.binding;

    view! {
        <div class="flex space-x-2">
            {INSTRUMENTS
                .iter()
                .map(|&(symbol, instrument_id)| {
                    let state = state.clone();
                    let selected = move || binding.with(|b| b.instrument_id == instrument_id);
                    view! {
                        <button
                            class=move || picker_class(selected())
                            on:click=move |_| state.select_instrument(symbol, instrument_id)
                        >
                            {symbol}
                        </button>
                    }
                })
                .collect_view()}
        </div>
    }
}

#[component]
pub fn IntervalPicker() -> impl IntoView {
    let state = use_context::<GlobalState>().expect("GlobalState not found");
    let binding = state.binding;

    view! {
        <div class="flex space-x-1">
            {INTERVALS
                .iter()
                .map(|&(label, interval)| {
                    let state = state.clone();
                    let selected = move || binding.with(|b| b.interval == interval);
                    view! {
                        <button
                            class=move || picker_class(selected())
                            on:click=move |_| state.select_interval(interval)
                        >
                            {label}
                        </button>
                    }
                })
                .collect_view()}
        </div>
    }
}

fn picker_class(selected: bool) -> &'static str {
    if selected {
        "px-3 py-1 rounded bg-primary-600 text-white text-sm font-medium"
    } else {
        "px-3 py-1 rounded bg-gray-800 text-gray-300 hover:bg-gray-700 text-sm"
    }
}
