//! TradingView Chart Component
//!
//! Hosts one widget controller on a fixed container element. The
//! controller is rebound whenever the selected instrument or interval
//! changes and disposed when the component unmounts.

use leptos::*;
use gloo_timers::callback::Timeout;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use tvchart::{
    timezone, Breakpoints, ChartDimensions, ChartSettings, Config, LifecycleState, ViewportState,
};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Event, EventTarget, MediaQueryList};

use crate::bridge::{shared_loader, GlobalDatafeedFactory, TradingViewEngine, TvController};
use crate::state::global::GlobalState;

/// Page function that builds a datafeed for an instrument id
const DATAFEED_FACTORY: &str = "createDatafeed";

const RESIZE_DEBOUNCE_MS: u32 = 150;

/// TradingView chart component
#[component]
pub fn TradingViewChart() -> impl IntoView {
    let state = use_context::<GlobalState>().expect("GlobalState not found");
    let config = Config::default();
    let container_id = config.chart.container_id.clone();
    let container_ref = create_node_ref::<html::Div>();

    let controller = Rc::new(TvController::new(
        TradingViewEngine::new(&config.loader.engine_global),
        GlobalDatafeedFactory::new(DATAFEED_FACTORY),
        shared_loader(&config.loader),
        ChartSettings::from(&config),
    ));

    // Mirror lifecycle into the status signal and the toast
    {
        let state = state.clone();
        controller.set_observer(move |lifecycle: &LifecycleState| {
            state.chart_status.try_set(lifecycle.name());
            if let Some(e) = lifecycle.error() {
                state.show_error(&format!("Chart unavailable: {}", e));
            }
        });
    }

    if let Some(viewport) = current_viewport() {
        controller.capture_viewport(viewport);
    }
    let dimensions = create_rw_signal(controller.dimensions());
    let listeners = watch_viewport(&config, &controller, dimensions);

    let alive = Rc::new(Cell::new(true));

    // Mount once the container exists, rebind on every binding change
    {
        let controller = Rc::clone(&controller);
        let alive = Rc::clone(&alive);
        let selected = state.binding;
        create_effect(move |_| {
            let binding = selected.get();
            if container_ref.get().is_none() {
                return;
            }

            // The widget looks its container up by id, so wait for layout
            let controller = Rc::clone(&controller);
            let alive = Rc::clone(&alive);
            request_animation_frame(move || {
                if !alive.get() {
                    return;
                }
                if let Err(e) = controller.rebind(binding, local_offset_hours()) {
                    web_sys::console::warn_1(&format!("Chart rebind skipped: {}", e).into());
                }
            });
        });
    }

    on_cleanup(move || {
        alive.set(false);
        drop(listeners);
        controller.dispose();
    });

    let status = state.chart_status;

    view! {
        <div class="relative">
            <div
                id=container_id
                node_ref=container_ref
                style=move || {
                    let d = dimensions.get();
                    format!("width: {}; height: {}; background-color: black;", d.width, d.height)
                }
            />

            {move || {
                (status.get() == "initializing").then(|| view! {
                    <div class="absolute inset-0 flex items-center justify-center text-gray-400">
                        <div class="loading-spinner w-6 h-6 mr-2" />
                        <span>"Loading chart..."</span>
                    </div>
                })
            }}
        </div>
    }
}

/// Host UTC offset in hours, from the browser clock
fn local_offset_hours() -> f64 {
    let minutes_behind_utc = js_sys::Date::new_0().get_timezone_offset();
    timezone::offset_hours_from_host(minutes_behind_utc as i32)
}

fn current_viewport() -> Option<ViewportState> {
    let window = web_sys::window()?;
    let width = window.inner_width().ok()?.as_f64()?;
    let height = window.inner_height().ok()?.as_f64()?;
    ViewportState::new(width as u32, height as u32)
}

fn media_query(window: &web_sys::Window, max_width: u32) -> Option<MediaQueryList> {
    window
        .match_media(&format!("(max-width: {}px)", max_width))
        .ok()
        .flatten()
}

fn breakpoints(narrow: &Option<MediaQueryList>, book: &Option<MediaQueryList>) -> Breakpoints {
    Breakpoints {
        narrow: narrow.as_ref().is_some_and(|m| m.matches()),
        book: book.as_ref().is_some_and(|m| m.matches()),
    }
}

/// An event listener removed from its target on drop
struct Listener {
    target: EventTarget,
    event: &'static str,
    callback: Closure<dyn FnMut(Event)>,
}

impl Listener {
    fn attach(
        target: EventTarget,
        event: &'static str,
        callback: impl FnMut(Event) + 'static,
    ) -> Option<Self> {
        let callback = Closure::wrap(Box::new(callback) as Box<dyn FnMut(Event)>);
        target
            .add_event_listener_with_callback(event, callback.as_ref().unchecked_ref())
            .ok()?;
        Some(Self {
            target,
            event,
            callback,
        })
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        let callback = self.callback.as_ref().unchecked_ref();
        let _ = self.target.remove_event_listener_with_callback(self.event, callback);
    }
}

/// Feed breakpoint crossings and window resizes into the controller
fn watch_viewport(
    config: &Config,
    controller: &Rc<TvController>,
    dimensions: RwSignal<ChartDimensions>,
) -> Vec<Listener> {
    let Some(window) = web_sys::window() else {
        return Vec::new();
    };

    let narrow = media_query(&window, config.layout.narrow_max_width);
    let book = media_query(&window, config.layout.book_max_width);
    if let Some(dims) = controller.set_breakpoints(breakpoints(&narrow, &book)) {
        dimensions.set(dims);
    }

    let mut listeners = Vec::new();

    for query in [narrow.clone(), book.clone()].into_iter().flatten() {
        let controller = Rc::clone(controller);
        let (narrow, book) = (narrow.clone(), book.clone());
        let listener = Listener::attach(query.into(), "change", move |_| {
            if let Some(dims) = controller.set_breakpoints(breakpoints(&narrow, &book)) {
                dimensions.set(dims);
            }
        });
        listeners.extend(listener);
    }

    // A size change rebuilds the widget, so wait for the drag to settle
    let controller = Rc::clone(controller);
    let pending: RefCell<Option<Timeout>> = RefCell::new(None);
    let listener = Listener::attach(window.into(), "resize", move |_| {
        let controller = Rc::clone(&controller);
        let timeout = Timeout::new(RESIZE_DEBOUNCE_MS, move || {
            let resized = current_viewport().and_then(|viewport| controller.on_resize(viewport));
            if let Some(dims) = resized {
                dimensions.set(dims);
            }
        });
        // Dropping the previous timeout cancels it
        pending.replace(Some(timeout));
    });
    listeners.extend(listener);

    listeners
}
