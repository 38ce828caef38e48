//! Widget error types
//!
//! Every failure the lifecycle controller can hit. All of them are terminal
//! for the current widget instance; nothing here is retried automatically.

use thiserror::Error;

/// Errors that can occur while loading or driving a chart widget
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WidgetError {
    /// The engine global is still missing after the script finished loading
    #[error("Charting engine unavailable: global `{0}` not found after script load")]
    EngineUnavailable(String),

    /// The bootstrap script failed to fetch or execute
    #[error("Script load failed: {0}")]
    ScriptLoadFailed(String),

    /// No timezone identifier is mapped for this UTC offset (hours)
    #[error("Unsupported UTC offset: {0}h")]
    UnsupportedOffset(f64),

    /// Symbol or interval is empty
    #[error("Invalid chart binding: {0}")]
    InvalidBinding(String),

    /// The engine rejected the widget options
    #[error("Engine error: {0}")]
    Engine(String),

    /// A lifecycle call was made in a state that does not allow it
    #[error("Cannot {action} while {state}")]
    InvalidTransition {
        state: &'static str,
        action: &'static str,
    },
}

/// Result type alias for widget operations
pub type WidgetResult<T> = Result<T, WidgetError>;
