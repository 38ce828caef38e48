//! Widget options
//!
//! The configuration record handed to the engine constructor. Field names
//! follow the engine's own (`library_path`, `time_frames`, ...), so the
//! serialized form can be passed straight through.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;

use crate::config::ChartConfig;
use crate::layout::{ChartDimensions, Dimension};
use crate::widget::ChartBinding;

/// Engine color theme
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

/// A selectable time-frame preset in the chart toolbar
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeFrame {
    /// Toolbar label, e.g. "5d"
    pub text: String,
    /// Bar resolution used for the range, e.g. "60" or "D"
    pub resolution: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl TimeFrame {
    pub fn new(text: &str, resolution: &str) -> Self {
        Self {
            text: text.to_string(),
            resolution: resolution.to_string(),
            description: None,
        }
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }
}

/// Built-in presets: 6m, 3m, 1m, 5d, 1d
pub fn default_time_frames() -> Vec<TimeFrame> {
    vec![
        TimeFrame::new("6m", "120"),
        TimeFrame::new("3m", "60"),
        TimeFrame::new("1m", "30"),
        TimeFrame::new("5d", "D").description("5 days"),
        TimeFrame::new("1d", "D").description("1 day"),
    ]
}

/// Built-in dark palette
pub fn default_overrides() -> BTreeMap<String, Value> {
    const BACKGROUND: &str = "#0b1217";
    const GRID: &str = "#E3E3E5";
    const UP: &str = "#11CC9A";
    const DOWN: &str = "#E20E7C";

    [
        ("paneProperties.rightMargin", json!(0)),
        ("paneProperties.background", json!(BACKGROUND)),
        ("paneProperties.backgroundType", json!("solid")),
        ("paneProperties.backgroundGradientEndColor", json!(BACKGROUND)),
        ("paneProperties.backgroundGradientStartColor", json!(BACKGROUND)),
        ("paneProperties.vertGridProperties.color", json!(GRID)),
        ("paneProperties.horzGridProperties.color", json!(GRID)),
        ("mainSeriesProperties.candleStyle.upColor", json!(UP)),
        ("mainSeriesProperties.candleStyle.downColor", json!(DOWN)),
        ("mainSeriesProperties.candleStyle.borderUpColor", json!(UP)),
        ("mainSeriesProperties.candleStyle.borderDownColor", json!(DOWN)),
        ("mainSeriesProperties.candleStyle.drawBorder", json!(false)),
        ("mainSeriesProperties.minTick", json!("100000000,1,false")),
        ("scalesProperties.textSize", json!(18)),
        ("scalesProperties.showLeftScale", json!(false)),
    ]
    .into_iter()
    .map(|(key, value)| (key.to_string(), value))
    .collect()
}

/// Everything the engine constructor takes except the datafeed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WidgetOptions {
    pub symbol: String,
    pub interval: String,
    pub fullscreen: bool,
    pub container: String,
    pub width: Dimension,
    pub height: Dimension,
    pub library_path: String,
    pub toolbar_bg: String,
    pub overrides: BTreeMap<String, Value>,
    pub disabled_features: Vec<String>,
    pub time_frames: Vec<TimeFrame>,
    pub theme: Theme,
    pub timezone: String,
}

impl WidgetOptions {
    /// Merge fixed chart settings with a binding, timezone and size
    pub fn build(
        chart: &ChartConfig,
        binding: &ChartBinding,
        timezone: &str,
        dimensions: ChartDimensions,
    ) -> Self {
        let mut overrides = default_overrides();
        overrides.extend(chart.overrides.clone());

        Self {
            symbol: binding.symbol.clone(),
            interval: binding.interval.clone(),
            fullscreen: chart.fullscreen,
            container: chart.container_id.clone(),
            width: dimensions.width,
            height: dimensions.height,
            library_path: chart.library_path.clone(),
            toolbar_bg: chart.toolbar_bg.clone(),
            overrides,
            disabled_features: chart.disabled_features.clone(),
            time_frames: chart.time_frames.clone(),
            theme: chart.theme,
            timezone: timezone.to_string(),
        }
    }

    /// JSON form for the engine constructor
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
