//! State Management
//!
//! Global application state shared by the page components.

pub mod global;

pub use global::{provide_global_state, GlobalState, INSTRUMENTS};
