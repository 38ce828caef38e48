//! Charting Engine Interface
//!
//! The charting engine and the data-feed adapter are external. The
//! controller only sees them through these traits:
//!
//! - **ChartEngine**: builds one widget from [`WidgetOptions`] and a datafeed
//! - **WidgetInstance**: a live widget that can be removed
//! - **DatafeedFactory**: produces the opaque datafeed for an instrument
//!
//! The browser frontend implements them over `TradingView.widget`; tests
//! implement them with counters.

mod options;

pub use options::{default_overrides, default_time_frames, Theme, TimeFrame, WidgetOptions};

use crate::error::WidgetResult;

/// Constructor side of the external charting engine
pub trait ChartEngine {
    /// Datafeed object the engine consumes. Opaque to the controller.
    type Datafeed;

    /// A live widget created by this engine
    type Widget: WidgetInstance;

    /// Construct exactly one widget
    fn construct(
        &self,
        options: &WidgetOptions,
        datafeed: Self::Datafeed,
    ) -> WidgetResult<Self::Widget>;
}

/// A live external widget
pub trait WidgetInstance {
    /// Release the external instance and everything it rendered
    fn remove(self);
}

/// Builds datafeed adapters keyed by instrument
pub trait DatafeedFactory {
    type Datafeed;

    fn datafeed(&self, instrument_id: &str) -> Self::Datafeed;
}

impl<D, F> DatafeedFactory for F
where
    F: Fn(&str) -> D,
{
    type Datafeed = D;

    fn datafeed(&self, instrument_id: &str) -> D {
        self(instrument_id)
    }
}
