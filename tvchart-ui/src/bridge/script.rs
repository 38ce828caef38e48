//! `<script>` injection for the charting library bootstrap.

use std::cell::RefCell;
use std::rc::Rc;

use tvchart::{InjectDone, ScriptHost};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::HtmlScriptElement;

use super::window_global;

pub struct BrowserScriptHost {
    engine_global: String,
}

impl BrowserScriptHost {
    pub fn new(engine_global: &str) -> Self {
        Self {
            engine_global: engine_global.to_string(),
        }
    }

    fn append_script(
        &self,
        src: &str,
        done: Rc<RefCell<Option<InjectDone>>>,
    ) -> Result<(), JsValue> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| JsValue::from_str("no document"))?;
        let body = document.body().ok_or_else(|| JsValue::from_str("no body"))?;

        let script: HtmlScriptElement = document
            .create_element("script")?
            .dyn_into()
            .map_err(|_| JsValue::from_str("not a script element"))?;
        script.set_src(src);
        script.set_async(true);

        // On load
        let done_clone = Rc::clone(&done);
        let on_load = Closure::wrap(Box::new(move |_: web_sys::Event| {
            if let Some(done) = done_clone.borrow_mut().take() {
                done(Ok(()));
            }
        }) as Box<dyn FnMut(web_sys::Event)>);
        script.set_onload(Some(on_load.as_ref().unchecked_ref()));
        on_load.forget();

        // On error
        let src_owned = src.to_string();
        let on_error = Closure::wrap(Box::new(move |_: web_sys::Event| {
            if let Some(done) = done.borrow_mut().take() {
                done(Err(format!("failed to load {}", src_owned)));
            }
        }) as Box<dyn FnMut(web_sys::Event)>);
        script.set_onerror(Some(on_error.as_ref().unchecked_ref()));
        on_error.forget();

        body.append_child(&script)?;
        Ok(())
    }
}

impl ScriptHost for BrowserScriptHost {
    fn engine_present(&self) -> bool {
        window_global(&self.engine_global).is_some()
    }

    fn inject(&self, src: &str, done: InjectDone) {
        let done = Rc::new(RefCell::new(Some(done)));
        if let Err(e) = self.append_script(src, Rc::clone(&done)) {
            let message = super::describe(&e);
            web_sys::console::error_1(&format!("Script injection failed: {}", message).into());
            if let Some(done) = done.borrow_mut().take() {
                done(Err(message));
            }
        }
    }
}
