//! UI Components

pub mod chart;
pub mod picker;
pub mod toast;

pub use chart::TradingViewChart;
pub use picker::{InstrumentPicker, IntervalPicker};
pub use toast::Toast;
