//! TV Chart Page
//!
//! Client-side rendered Leptos application that embeds the TradingView
//! charting library and drives it through the `tvchart` controller.
//!
//! The page expects the host server to provide the library under
//! `/charting_library/` and a `window.createDatafeed(instrumentId)`
//! function returning a datafeed object.

use leptos::*;

mod app;
mod bridge;
mod components;
mod state;

fn main() {
    // Set up panic hook for better error messages in WASM
    console_error_panic_hook::set_once();

    mount_to_body(|| view! { <app::App /> });
}
