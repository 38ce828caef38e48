//! Browser Bindings
//!
//! Implements the core's host traits on top of the DOM and the
//! TradingView globals.

mod engine;
mod script;

pub use engine::{GlobalDatafeedFactory, JsWidget, TradingViewEngine};
pub use script::BrowserScriptHost;

use std::cell::RefCell;
use std::rc::Rc;

use tvchart::{LoaderConfig, ScriptLoader, WidgetController};
use wasm_bindgen::JsValue;

/// Controller type used by the page
pub type TvController = WidgetController<TradingViewEngine, GlobalDatafeedFactory>;

thread_local! {
    static LOADER: RefCell<Option<ScriptLoader>> = const { RefCell::new(None) };
}

/// The page-wide script loader. The first call fixes its configuration.
pub fn shared_loader(config: &LoaderConfig) -> ScriptLoader {
    LOADER.with(|slot| {
        slot.borrow_mut()
            .get_or_insert_with(|| {
                let host = BrowserScriptHost::new(&config.engine_global);
                ScriptLoader::new(Rc::new(host), config.clone())
            })
            .clone()
    })
}

/// Render a JS exception for logs and error messages
pub(crate) fn describe(value: &JsValue) -> String {
    value
        .as_string()
        .or_else(|| {
            js_sys::Reflect::get(value, &JsValue::from_str("message"))
                .ok()
                .and_then(|m| m.as_string())
        })
        .unwrap_or_else(|| format!("{:?}", value))
}

/// Look up a property on `window`
pub(crate) fn window_global(name: &str) -> Option<JsValue> {
    let window = web_sys::window()?;
    js_sys::Reflect::get(&window, &JsValue::from_str(name))
        .ok()
        .filter(|v| !v.is_undefined() && !v.is_null())
}
