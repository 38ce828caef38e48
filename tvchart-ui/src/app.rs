//! App Root Component

use leptos::*;

use crate::components::{InstrumentPicker, IntervalPicker, Toast, TradingViewChart};
use crate::state::global::{provide_global_state, GlobalState};

/// Root application component
#[component]
pub fn App() -> impl IntoView {
    provide_global_state();

    view! {
        <div class="min-h-screen bg-gray-900 text-white flex flex-col">
            <header class="bg-gray-800 border-b border-gray-700 px-4 py-3">
                <div class="container mx-auto flex flex-wrap items-center justify-between gap-3">
                    <h1 class="text-lg font-bold">"TV Chart"</h1>
                    <InstrumentPicker />
                    <IntervalPicker />
                </div>
            </header>

            <main class="flex-1 container mx-auto px-4 py-6 pb-24">
                <TradingViewChart />
            </main>

            <Footer />
            <Toast />
        </div>
    }
}

/// Footer showing what the chart is bound to and its lifecycle state
#[component]
fn Footer() -> impl IntoView {
    let state = use_context::<GlobalState>().expect("GlobalState not found");
    let binding = state.binding;
    let status = state.chart_status;

    view! {
        <footer class="fixed bottom-0 left-0 right-0 bg-gray-800 border-t border-gray-700 py-3 px-4">
            <div class="container mx-auto flex items-center justify-between text-sm">
                <div class="text-gray-400">
                    {move || binding.with(|b| format!("{} · {}", b.symbol, b.interval))}
                </div>

                {move || {
                    let (dot, text) = match status.get() {
                        "active" => ("bg-green-400", "text-green-400"),
                        "failed" => ("bg-red-400", "text-red-400"),
                        _ => ("bg-yellow-400", "text-yellow-400"),
                    };
                    view! {
                        <span class=format!("flex items-center space-x-1 {}", text)>
                            <span class=format!("w-2 h-2 rounded-full {}", dot) />
                            <span>{status.get()}</span>
                        </span>
                    }
                }}
            </div>
        </footer>
    }
}
