//! `TradingView.widget` constructor binding.

use js_sys::{Array, Function, Reflect};
use tvchart::{
    ChartEngine, DatafeedFactory, WidgetError, WidgetInstance, WidgetOptions, WidgetResult,
};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use super::{describe, window_global};

/// Builds widgets through `new window[global].widget(options)`
pub struct TradingViewEngine {
    global: String,
}

impl TradingViewEngine {
    pub fn new(global: &str) -> Self {
        Self {
            global: global.to_string(),
        }
    }

    fn constructor(&self) -> WidgetResult<Function> {
        let namespace = window_global(&self.global)
            .ok_or_else(|| WidgetError::EngineUnavailable(self.global.clone()))?;
        Reflect::get(&namespace, &JsValue::from_str("widget"))
            .ok()
            .and_then(|ctor| ctor.dyn_into::<Function>().ok())
            .ok_or_else(|| WidgetError::EngineUnavailable(format!("{}.widget", self.global)))
    }
}

impl ChartEngine for TradingViewEngine {
    type Datafeed = JsValue;
    type Widget = JsWidget;

    fn construct(&self, options: &WidgetOptions, datafeed: JsValue) -> WidgetResult<JsWidget> {
        let ctor = self.constructor()?;

        let json = options
            .to_json()
            .map_err(|e| WidgetError::Engine(format!("options serialization: {}", e)))?;
        let js_options = js_sys::JSON::parse(&json).map_err(|e| WidgetError::Engine(describe(&e)))?;
        Reflect::set(&js_options, &JsValue::from_str("datafeed"), &datafeed)
            .map_err(|e| WidgetError::Engine(describe(&e)))?;

        let widget = Reflect::construct(&ctor, &Array::of1(&js_options))
            .map_err(|e| WidgetError::Engine(describe(&e)))?;

        Ok(JsWidget(widget))
    }
}

/// A live `TradingView.widget` instance
pub struct JsWidget(JsValue);

impl WidgetInstance for JsWidget {
    fn remove(self) {
        let remove = Reflect::get(&self.0, &JsValue::from_str("remove"))
            .ok()
            .and_then(|f| f.dyn_into::<Function>().ok());

        match remove {
            Some(remove) => {
                if let Err(e) = remove.call0(&self.0) {
                    let message = format!("widget.remove() threw: {}", describe(&e));
                    web_sys::console::error_1(&message.into());
                }
            }
            None => web_sys::console::warn_1(&"Widget has no remove()".into()),
        }
    }
}

/// Calls a page-provided `window[function](instrumentId)` to build datafeeds
pub struct GlobalDatafeedFactory {
    function: String,
}

impl GlobalDatafeedFactory {
    pub fn new(function: &str) -> Self {
        Self {
            function: function.to_string(),
        }
    }
}

impl DatafeedFactory for GlobalDatafeedFactory {
    type Datafeed = JsValue;

    fn datafeed(&self, instrument_id: &str) -> JsValue {
        let factory = window_global(&self.function).and_then(|f| f.dyn_into::<Function>().ok());
        let Some(factory) = factory else {
            let message = format!("Datafeed factory `{}` not found", self.function);
            web_sys::console::error_1(&message.into());
            return JsValue::UNDEFINED;
        };

        factory
            .call1(&JsValue::NULL, &JsValue::from_str(instrument_id))
            .unwrap_or_else(|e| {
                let message = format!("Datafeed factory threw: {}", describe(&e));
                web_sys::console::error_1(&message.into());
                JsValue::UNDEFINED
            })
    }
}
