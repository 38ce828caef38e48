//! Responsive Sizer
//!
//! Derives chart pixel dimensions from the viewport and two width
//! breakpoints ("narrow" and "book").
//!
//! ```text
//! book   narrow   width                     height
//! no     -        caller fallback           default_height
//! yes    no       viewport                  default_height
//! yes    yes      viewport - narrow_margin  narrow_height
//! ```
//!
//! Height follows the narrow breakpoint only.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::LayoutConfig;

/// Viewport size in CSS pixels. Both sides are non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewportState {
    pub width: u32,
    pub height: u32,
}

impl ViewportState {
    /// Returns `None` for a zero-sized viewport
    pub fn new(width: u32, height: u32) -> Option<Self> {
        (width > 0 && height > 0).then_some(Self { width, height })
    }
}

/// Breakpoint flags for the current viewport width
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Breakpoints {
    /// width ≤ `narrow_max_width`
    pub narrow: bool,
    /// width ≤ `book_max_width`
    pub book: bool,
}

impl Breakpoints {
    pub fn from_width(width: u32, layout: &LayoutConfig) -> Self {
        Self {
            narrow: width <= layout.narrow_max_width,
            book: width <= layout.book_max_width,
        }
    }
}

/// A widget dimension: pixels, or any CSS length the engine accepts ("100%")
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Dimension {
    Pixels(u32),
    Css(String),
}

impl Dimension {
    /// CSS form, suitable for an inline `style` attribute
    pub fn to_css(&self) -> String {
        match self {
            Dimension::Pixels(px) => format!("{px}px"),
            Dimension::Css(value) => value.clone(),
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_css())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartDimensions {
    pub width: Dimension,
    pub height: Dimension,
}

impl ChartDimensions {
    pub fn new(width: Dimension, height: Dimension) -> Self {
        Self { width, height }
    }
}

/// Tracks viewport and breakpoints and computes chart dimensions
#[derive(Debug, Clone)]
pub struct ResponsiveSizer {
    layout: LayoutConfig,
    viewport: Option<ViewportState>,
    breakpoints: Breakpoints,
}

impl ResponsiveSizer {
    pub fn new(layout: LayoutConfig) -> Self {
        Self {
            layout,
            viewport: None,
            breakpoints: Breakpoints::default(),
        }
    }

    /// Record the viewport at mount and derive breakpoints from it
    pub fn capture(&mut self, viewport: ViewportState) {
        self.viewport = Some(viewport);
        self.breakpoints = Breakpoints::from_width(viewport.width, &self.layout);
    }

    /// Handle a window resize.
    ///
    /// With `track_resize` the stored viewport follows the window. Without
    /// it only the breakpoints move and the mount-time size is kept.
    /// Returns true when the computed dimensions may have changed.
    pub fn on_resize(&mut self, viewport: ViewportState) -> bool {
        if self.viewport.is_none() {
            self.capture(viewport);
            return true;
        }

        let crossed = self.set_breakpoints(Breakpoints::from_width(viewport.width, &self.layout));
        if self.layout.track_resize && self.viewport != Some(viewport) {
            self.viewport = Some(viewport);
            return true;
        }
        crossed
    }

    /// Apply breakpoint flags reported by the host (media queries).
    /// Returns true when either flag changed.
    pub fn set_breakpoints(&mut self, breakpoints: Breakpoints) -> bool {
        let changed = self.breakpoints != breakpoints;
        self.breakpoints = breakpoints;
        changed
    }

    pub fn breakpoints(&self) -> Breakpoints {
        self.breakpoints
    }

    pub fn viewport(&self) -> Option<ViewportState> {
        self.viewport
    }

    /// Compute dimensions, falling back to `fallback` where the viewport is
    /// not needed or not yet known.
    pub fn dimensions(&self, fallback: &ChartDimensions) -> ChartDimensions {
        let Breakpoints { narrow, book } = self.breakpoints;
        let height = Dimension::Pixels(if narrow {
            self.layout.narrow_height
        } else {
            self.layout.default_height
        });

        if !book {
            return ChartDimensions::new(fallback.width.clone(), height);
        }

        match self.viewport {
            None => fallback.clone(),
            Some(viewport) => {
                let width = if narrow {
                    viewport.width.saturating_sub(self.layout.narrow_margin)
                } else {
                    viewport.width
                };
                ChartDimensions::new(Dimension::Pixels(width), height)
            }
        }
    }
}
