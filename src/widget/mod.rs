//! Widget Lifecycle
//!
//! - **ChartBinding**: what a widget shows (symbol, instrument, interval)
//! - **WidgetHandle**: exclusive ownership of one live external widget
//! - **WidgetController**: the state machine that creates and tears down
//!   widgets
//!
//! # Example
//!
//! ```rust,ignore
//! let settings = ChartSettings::from(&config);
//! let controller = WidgetController::new(engine, feeds, loader.clone(), settings);
//! controller.capture_viewport(ViewportState::new(1280, 800).unwrap());
//! let binding = ChartBinding::new("BTC/USDT", "btc-usdt", "60");
//! controller.mount(binding, timezone::local_offset_hours())?;
//! // ...hosting view removed
//! controller.dispose();
//! ```

mod controller;
mod handle;

pub use controller::{ChartSettings, LifecycleState, WidgetController};
pub use handle::WidgetHandle;

use serde::{Deserialize, Serialize};

use crate::error::{WidgetError, WidgetResult};

/// What a widget instance is bound to. Any change needs a new instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartBinding {
    /// Symbol shown by the engine, e.g. "BTC/USDT"
    pub symbol: String,
    /// Key the datafeed uses to look up bars
    pub instrument_id: String,
    /// Bar resolution, e.g. "60" or "D"
    pub interval: String,
}

impl ChartBinding {
    pub fn new(symbol: &str, instrument_id: &str, interval: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            instrument_id: instrument_id.to_string(),
            interval: interval.to_string(),
        }
    }

    /// Symbol and interval must be non-empty
    pub fn validate(&self) -> WidgetResult<()> {
        if self.symbol.trim().is_empty() {
            return Err(WidgetError::InvalidBinding("symbol is empty".to_string()));
        }
        if self.interval.trim().is_empty() {
            return Err(WidgetError::InvalidBinding("interval is empty".to_string()));
        }
        Ok(())
    }
}
