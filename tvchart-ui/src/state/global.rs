//! Global Application State
//!
//! Reactive state management using Leptos signals.

use leptos::*;
use tvchart::ChartBinding;

/// Instruments offered in the symbol picker
pub const INSTRUMENTS: [(&str, &str); 3] = [
    ("BTC/USDT", "btc-usdt"),
    ("ETH/USDT", "eth-usdt"),
    ("SOL/USDT", "sol-usdt"),
];

/// Global application state provided to all components
#[derive(Clone)]
pub struct GlobalState {
    /// What the chart is bound to; changing it rebinds the widget
    pub binding: RwSignal<ChartBinding>,
    /// Lifecycle state name of the chart controller
    pub chart_status: RwSignal<&'static str>,
    /// Error message to display
    pub error: RwSignal<Option<String>>,
}

/// Provide global state to the component tree
pub fn provide_global_state() {
    let (symbol, instrument) = INSTRUMENTS[0];

    let state = GlobalState {
        binding: create_rw_signal(ChartBinding::new(symbol, instrument, "60")),
        chart_status: create_rw_signal("idle"),
        error: create_rw_signal(None),
    };

    provide_context(state);
}

impl GlobalState {
    /// Switch instrument, keeping the interval
    pub fn select_instrument(&self, symbol: &str, instrument_id: &str) {
        self.binding.update(|b| {
            b.symbol = symbol.to_string();
            b.instrument_id = instrument_id.to_string();
        });
    }

    /// Switch interval, keeping the instrument
    pub fn select_interval(&self, interval: &str) {
        self.binding.update(|b| b.interval = interval.to_string());
    }

    /// Show an error message (auto-clears after timeout)
    pub fn show_error(&self, message: &str) {
        self.error.set(Some(message.to_string()));

        let error_signal = self.error;
        gloo_timers::callback::Timeout::new(5000, move || {
            error_signal.set(None);
        })
        .forget();
    }
}
