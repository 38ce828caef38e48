//! # tvchart
//!
//! Lifecycle controller for an embedded TradingView price chart. The
//! charting engine is loaded at runtime, configured for a symbol and a
//! data feed, and torn down again when the hosting view goes away.
//!
//! ## Modules
//!
//! - [`timezone`]: UTC offset → engine timezone identifier
//! - [`layout`]: responsive chart dimensions from viewport breakpoints
//! - [`loader`]: single-flight loading of the engine bootstrap script
//! - [`engine`]: traits for the external engine and datafeed, plus widget options
//! - [`widget`]: widget handle and the lifecycle controller
//! - [`config`]: TOML configuration with environment overrides
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::rc::Rc;
//! use tvchart::*;
//!
//! let config = Config::load_default();
//! let loader = ScriptLoader::new(Rc::new(host), config.loader.clone());
//! let controller = WidgetController::new(engine, feeds, loader, ChartSettings::from(&config));
//!
//! controller.capture_viewport(ViewportState::new(1280, 800).unwrap());
//! let binding = ChartBinding::new("BTC/USDT", "btc-usdt", "60");
//! controller.mount(binding, timezone::local_offset_hours())?;
//!
//! // Later, when the view is removed
//! controller.dispose();
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod layout;
pub mod loader;
pub mod timezone;
pub mod widget;

pub use config::{
    generate_default_config, ChartConfig, Config, ConfigError, LayoutConfig, LoaderConfig,
    LoggingConfig,
};

pub use engine::{
    default_overrides, default_time_frames, ChartEngine, DatafeedFactory, Theme, TimeFrame,
    WidgetInstance, WidgetOptions,
};

pub use error::{WidgetError, WidgetResult};

pub use layout::{Breakpoints, ChartDimensions, Dimension, ResponsiveSizer, ViewportState};

pub use loader::{InjectDone, ScriptHost, ScriptLoadState, ScriptLoader, Subscription};

pub use widget::{ChartBinding, ChartSettings, LifecycleState, WidgetController, WidgetHandle};
