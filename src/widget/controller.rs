//! Widget Lifecycle Controller
//!
//! ```text
//!            mount                 script ready + construct
//!   Idle ───────────▶ Initializing ─────────────────────────▶ Active
//!                        │    ▲                                 │
//!        load/engine err │    └──────────── rebind ─────────────┤
//!                        ▼                                      │ dispose
//!                      Failed                                Disposed
//! ```
//!
//! The controller owns at most one [`WidgetHandle`]. A new widget is only
//! constructed after the previous handle has been released, and disposing
//! while the script is still loading cancels the pending subscription so a
//! late ready signal cannot build a widget for a torn-down view. Each
//! initialization also carries a generation number; signals for an older
//! generation are ignored.

use std::cell::RefCell;
use std::rc::Rc;

use crate::config::{ChartConfig, Config, LayoutConfig};
use crate::engine::{ChartEngine, DatafeedFactory, WidgetOptions};
use crate::error::{WidgetError, WidgetResult};
use crate::layout::{Breakpoints, ChartDimensions, ResponsiveSizer, ViewportState};
use crate::loader::{ScriptLoader, Subscription};
use crate::timezone;

use super::{ChartBinding, WidgetHandle};

/// Fixed settings a controller is created with
#[derive(Debug, Clone, Default)]
pub struct ChartSettings {
    pub chart: ChartConfig,
    pub layout: LayoutConfig,
}

impl From<&Config> for ChartSettings {
    fn from(config: &Config) -> Self {
        Self {
            chart: config.chart.clone(),
            layout: config.layout.clone(),
        }
    }
}

/// Controller lifecycle. `Disposed` and `Failed` are terminal.
#[derive(Debug, Clone, PartialEq)]
pub enum LifecycleState {
    Idle,
    Initializing,
    Active,
    Disposed,
    Failed(WidgetError),
}

impl LifecycleState {
    pub fn name(&self) -> &'static str {
        match self {
            LifecycleState::Idle => "idle",
            LifecycleState::Initializing => "initializing",
            LifecycleState::Active => "active",
            LifecycleState::Disposed => "disposed",
            LifecycleState::Failed(_) => "failed",
        }
    }

    pub fn error(&self) -> Option<&WidgetError> {
        match self {
            LifecycleState::Failed(e) => Some(e),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Bound {
    binding: ChartBinding,
    timezone: &'static str,
}

type Observer = Rc<dyn Fn(&LifecycleState)>;

struct ControllerInner<E: ChartEngine, F> {
    engine: E,
    feeds: F,
    loader: ScriptLoader,
    chart: ChartConfig,
    sizer: ResponsiveSizer,
    state: LifecycleState,
    generation: u64,
    bound: Option<Bound>,
    subscription: Option<Subscription>,
    handle: Option<WidgetHandle<E::Widget>>,
    /// Dimensions the live widget was built with
    built_with: Option<ChartDimensions>,
    observer: Option<Observer>,
    /// Set while `start` runs, so a synchronous settle leaves the single
    /// notification to the caller
    defer_notify: bool,
}

/// Drives one chart widget on one render surface.
///
/// Dropping the controller disposes it.
pub struct WidgetController<E, F>
where
    E: ChartEngine + 'static,
    F: DatafeedFactory<Datafeed = E::Datafeed> + 'static,
{
    inner: Rc<RefCell<ControllerInner<E, F>>>,
}

impl<E, F> WidgetController<E, F>
where
    E: ChartEngine + 'static,
    F: DatafeedFactory<Datafeed = E::Datafeed> + 'static,
{
    pub fn new(engine: E, feeds: F, loader: ScriptLoader, settings: ChartSettings) -> Self {
        Self {
            inner: Rc::new(RefCell::new(ControllerInner {
                engine,
                feeds,
                loader,
                chart: settings.chart,
                sizer: ResponsiveSizer::new(settings.layout),
                state: LifecycleState::Idle,
                generation: 0,
                bound: None,
                subscription: None,
                handle: None,
                built_with: None,
                observer: None,
                defer_notify: false,
            })),
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.inner.borrow().state.clone()
    }

    /// Binding of the current or pending widget
    pub fn binding(&self) -> Option<ChartBinding> {
        self.inner.borrow().bound.as_ref().map(|b| b.binding.clone())
    }

    /// Whether a live widget exists
    pub fn has_widget(&self) -> bool {
        self.inner.borrow().handle.is_some()
    }

    /// Current dimensions for the render surface
    pub fn dimensions(&self) -> ChartDimensions {
        self.inner.borrow().dimensions()
    }

    /// Call `observer` after every state transition, including the ones
    /// triggered later by the script load. It runs with no borrow held, so
    /// it may call back into the controller.
    pub fn set_observer<O>(&self, observer: O)
    where
        O: Fn(&LifecycleState) + 'static,
    {
        self.inner.borrow_mut().observer = Some(Rc::new(observer));
    }

    /// Record the viewport at mount
    pub fn capture_viewport(&self, viewport: ViewportState) -> ChartDimensions {
        let mut inner = self.inner.borrow_mut();
        inner.sizer.capture(viewport);
        inner.dimensions()
    }

    /// Feed a window resize. Returns the new dimensions if they may have changed.
    ///
    /// An active widget whose dimensions changed is rebuilt with the new size.
    pub fn on_resize(&self, viewport: ViewportState) -> Option<ChartDimensions> {
        let dims = {
            let mut inner = self.inner.borrow_mut();
            if !inner.sizer.on_resize(viewport) {
                return None;
            }
            inner.dimensions()
        };
        self.refit();
        Some(dims)
    }

    /// Feed breakpoint flags from the host. Returns the new dimensions if
    /// either flag changed.
    pub fn set_breakpoints(&self, breakpoints: Breakpoints) -> Option<ChartDimensions> {
        let dims = {
            let mut inner = self.inner.borrow_mut();
            if !inner.sizer.set_breakpoints(breakpoints) {
                return None;
            }
            inner.dimensions()
        };
        self.refit();
        Some(dims)
    }

    /// Start the first widget. Only valid from `Idle`.
    ///
    /// `Ok` means initialization started; the widget may already be active
    /// (engine loaded) or still waiting for the script. Check
    /// [`state`](Self::state) for the outcome.
    pub fn mount(&self, binding: ChartBinding, utc_offset_hours: f64) -> WidgetResult<()> {
        let state = self.state();
        if state != LifecycleState::Idle {
            return Err(WidgetError::InvalidTransition {
                state: state.name(),
                action: "mount",
            });
        }

        // Both checks happen before any script load or engine call
        let timezone = match prepare(&binding, utc_offset_hours) {
            Ok(timezone) => timezone,
            Err(e) => {
                self.inner.borrow_mut().fail(e.clone());
                self.notify();
                return Err(e);
            }
        };
        self.start(binding, timezone);
        self.notify();
        Ok(())
    }

    /// Replace the widget with one for a new binding.
    ///
    /// Releases the current widget (or cancels the pending load) before
    /// starting again. Rebinding to the same binding and timezone is a no-op.
    /// A binding or offset that cannot be built is rejected and the current
    /// widget is kept.
    pub fn rebind(&self, binding: ChartBinding, utc_offset_hours: f64) -> WidgetResult<()> {
        match self.state() {
            LifecycleState::Idle => return self.mount(binding, utc_offset_hours),
            LifecycleState::Failed(_) => {
                return Err(WidgetError::InvalidTransition {
                    state: "failed",
                    action: "rebind",
                })
            }
            LifecycleState::Active | LifecycleState::Initializing | LifecycleState::Disposed => {}
        }

        let timezone = prepare(&binding, utc_offset_hours).map_err(|e| {
            tracing::warn!(error = %e, symbol = %binding.symbol, "Rebind rejected");
            e
        })?;

        let unchanged = self.inner.borrow().bound.as_ref().is_some_and(|bound| {
            bound.binding == binding && bound.timezone == timezone
        });
        if unchanged {
            return Ok(());
        }

        tracing::info!(
            symbol = %binding.symbol,
            interval = %binding.interval,
            "Rebinding chart widget"
        );
        self.teardown(LifecycleState::Disposed);
        self.start(binding, timezone);
        self.notify();
        Ok(())
    }

    /// Tear down for good: cancel any pending load and release the widget.
    ///
    /// The external widget has been removed when this returns. A failed
    /// controller stays `Failed`.
    pub fn dispose(&self) {
        match self.state() {
            LifecycleState::Disposed => {}
            LifecycleState::Failed(e) => self.teardown(LifecycleState::Failed(e)),
            _ => {
                self.teardown(LifecycleState::Disposed);
                tracing::info!("Chart widget disposed");
                self.notify();
            }
        }
    }

    fn notify(&self) {
        let pending = {
            let inner = self.inner.borrow();
            inner.observer.clone().map(|o| (o, inner.state.clone()))
        };
        if let Some((observer, state)) = pending {
            observer(&state);
        }
    }

    /// Rebuild an active widget whose dimensions no longer match
    fn refit(&self) {
        let failed = {
            let mut inner = self.inner.borrow_mut();
            let dims = inner.dimensions();
            if inner.state != LifecycleState::Active || inner.built_with.as_ref() == Some(&dims) {
                return;
            }

            tracing::debug!(width = %dims.width, height = %dims.height, "Resizing chart widget");
            if let Some(handle) = inner.handle.take() {
                handle.release();
            }
            inner.construct();
            inner.state != LifecycleState::Active
        };
        if failed {
            self.notify();
        }
    }

    fn start(&self, binding: ChartBinding, timezone: &'static str) {
        let (loader, generation) = {
            let mut inner = self.inner.borrow_mut();
            inner.generation += 1;
            inner.bound = Some(Bound { binding, timezone });
            inner.state = LifecycleState::Initializing;
            inner.defer_notify = true;
            tracing::debug!(generation = inner.generation, timezone, "Chart widget initializing");
            (inner.loader.clone(), inner.generation)
        };

        let weak = Rc::downgrade(&self.inner);
        let subscription = loader.ensure_loaded(move |result| {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            let notify = {
                let mut guard = inner.borrow_mut();
                if guard.on_script_settled(generation, result) && !guard.defer_notify {
                    guard.observer.clone().map(|o| (o, guard.state.clone()))
                } else {
                    None
                }
            };
            if let Some((observer, state)) = notify {
                observer(&state);
            }
        });

        let mut inner = self.inner.borrow_mut();
        inner.defer_notify = false;
        if inner.state == LifecycleState::Initializing && inner.generation == generation {
            inner.subscription = Some(subscription);
        }
    }

    fn teardown(&self, next: LifecycleState) {
        let (subscription, handle) = {
            let mut inner = self.inner.borrow_mut();
            inner.generation += 1;
            inner.bound = None;
            inner.state = next;
            (inner.subscription.take(), inner.handle.take())
        };

        drop(subscription);
        if let Some(handle) = handle {
            handle.release();
        }
    }
}

/// Validate a binding and resolve its timezone
fn prepare(binding: &ChartBinding, utc_offset_hours: f64) -> WidgetResult<&'static str> {
    binding.validate()?;
    timezone::resolve(utc_offset_hours)
}

impl<E, F> Drop for WidgetController<E, F>
where
    E: ChartEngine + 'static,
    F: DatafeedFactory<Datafeed = E::Datafeed> + 'static,
{
    fn drop(&mut self) {
        self.dispose();
    }
}

impl<E, F> ControllerInner<E, F>
where
    E: ChartEngine,
    F: DatafeedFactory<Datafeed = E::Datafeed>,
{
    fn dimensions(&self) -> ChartDimensions {
        let fallback = ChartDimensions::new(
            self.chart.fallback_width.clone(),
            self.chart.fallback_height.clone(),
        );
        self.sizer.dimensions(&fallback)
    }

    /// Returns false for a stale signal that changed nothing
    fn on_script_settled(&mut self, generation: u64, result: WidgetResult<()>) -> bool {
        if self.generation != generation || self.state != LifecycleState::Initializing {
            tracing::debug!(
                generation,
                current = self.generation,
                state = self.state.name(),
                "Ignoring stale script signal"
            );
            return false;
        }

        self.subscription = None;
        match result {
            Ok(()) => self.construct(),
            Err(e) => self.fail(e),
        }
        true
    }

    fn construct(&mut self) {
        let Some(bound) = self.bound.clone() else {
            return self.fail(WidgetError::InvalidTransition {
                state: self.state.name(),
                action: "construct without a binding",
            });
        };

        // At most one live instance: the previous one goes first
        if let Some(previous) = self.handle.take() {
            tracing::warn!(
                generation = previous.generation(),
                "Releasing stale widget before construct"
            );
            previous.release();
        }

        let options = WidgetOptions::build(
            &self.chart,
            &bound.binding,
            bound.timezone,
            self.dimensions(),
        );
        let datafeed = self.feeds.datafeed(&bound.binding.instrument_id);

        let dims = ChartDimensions::new(options.width.clone(), options.height.clone());
        match self.engine.construct(&options, datafeed) {
            Ok(widget) => {
                self.handle = Some(WidgetHandle::new(widget, self.generation));
                self.built_with = Some(dims);
                self.state = LifecycleState::Active;
                tracing::info!(
                    symbol = %bound.binding.symbol,
                    interval = %bound.binding.interval,
                    timezone = bound.timezone,
                    generation = self.generation,
                    "Chart widget active"
                );
            }
            Err(e) => self.fail(e),
        }
    }

    fn fail(&mut self, error: WidgetError) {
        tracing::error!(error = %error, state = self.state.name(), "Chart widget failed");
        self.subscription = None;
        if let Some(handle) = self.handle.take() {
            handle.release();
        }
        self.state = LifecycleState::Failed(error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LoaderConfig;
    use crate::engine::WidgetInstance;
    use crate::layout::Dimension;
    use crate::loader::testing::FakeHost;
    use std::cell::Cell;

    #[derive(Default)]
    struct Stats {
        live: Cell<usize>,
        max_live: Cell<usize>,
        removed: Cell<usize>,
        fail_next: Cell<bool>,
        built: RefCell<Vec<WidgetOptions>>,
        datafeeds: RefCell<Vec<String>>,
    }

    #[derive(Clone, Default)]
    struct FakeEngine {
        stats: Rc<Stats>,
    }

    struct FakeWidget {
        stats: Rc<Stats>,
    }

    impl WidgetInstance for FakeWidget {
        fn remove(self) {
            self.stats.live.set(self.stats.live.get() - 1);
            self.stats.removed.set(self.stats.removed.get() + 1);
        }
    }

    impl ChartEngine for FakeEngine {
        type Datafeed = String;
        type Widget = FakeWidget;

        fn construct(&self, options: &WidgetOptions, datafeed: String) -> WidgetResult<FakeWidget> {
            if self.stats.fail_next.replace(false) {
                return Err(WidgetError::Engine("container not found".to_string()));
            }
            let live = self.stats.live.get() + 1;
            self.stats.live.set(live);
            self.stats.max_live.set(self.stats.max_live.get().max(live));
            self.stats.built.borrow_mut().push(options.clone());
            self.stats.datafeeds.borrow_mut().push(datafeed);
            Ok(FakeWidget {
                stats: Rc::clone(&self.stats),
            })
        }
    }

    fn feed(instrument_id: &str) -> String {
        format!("feed:{instrument_id}")
    }

    type TestController = WidgetController<FakeEngine, fn(&str) -> String>;

    fn controller(engine: &FakeEngine, loader: &ScriptLoader) -> TestController {
        WidgetController::new(
            engine.clone(),
            feed as fn(&str) -> String,
            loader.clone(),
            ChartSettings::default(),
        )
    }

    fn btc() -> ChartBinding {
        ChartBinding::new("BTC/USDT", "btc-usdt", "60")
    }

    fn setup(host: &Rc<FakeHost>) -> (FakeEngine, ScriptLoader) {
        (
            FakeEngine::default(),
            ScriptLoader::new(host.clone(), LoaderConfig::default()),
        )
    }

    #[test]
    fn test_mount_with_engine_present() {
        let host = FakeHost::with_engine();
        let (engine, loader) = setup(&host);
        let c = controller(&engine, &loader);

        c.mount(btc(), 2.0).unwrap();

        assert_eq!(c.state(), LifecycleState::Active);
        assert!(c.has_widget());
        assert_eq!(engine.stats.live.get(), 1);
        assert_eq!(*engine.stats.datafeeds.borrow(), vec!["feed:btc-usdt"]);

        let built = engine.stats.built.borrow();
        assert_eq!(built[0].symbol, "BTC/USDT");
        assert_eq!(built[0].interval, "60");
        assert_eq!(built[0].timezone, "Europe/Belgrade");
        assert!(host.injected.borrow().is_empty());
    }

    #[test]
    fn test_mount_waits_for_script() {
        let host = FakeHost::new();
        let (engine, loader) = setup(&host);
        let c = controller(&engine, &loader);

        c.mount(btc(), 9.0).unwrap();
        assert_eq!(c.state(), LifecycleState::Initializing);
        assert!(engine.stats.built.borrow().is_empty());

        host.complete(Ok(()));
        assert_eq!(c.state(), LifecycleState::Active);
        assert_eq!(engine.stats.built.borrow()[0].timezone, "Asia/Tokyo");
    }

    #[test]
    fn test_dispose_while_initializing_cancels() {
        let host = FakeHost::new();
        let (engine, loader) = setup(&host);
        let c = controller(&engine, &loader);

        c.mount(btc(), 2.0).unwrap();
        c.dispose();
        assert_eq!(c.state(), LifecycleState::Disposed);
        assert_eq!(loader.pending_waiters(), 0);

        host.complete(Ok(()));
        assert!(engine.stats.built.borrow().is_empty());
        assert_eq!(c.state(), LifecycleState::Disposed);
    }

    #[test]
    fn test_drop_while_initializing_cancels() {
        let host = FakeHost::new();
        let (engine, loader) = setup(&host);

        {
            let c = controller(&engine, &loader);
            c.mount(btc(), 2.0).unwrap();
        }

        host.complete(Ok(()));
        assert!(engine.stats.built.borrow().is_empty());
        assert_eq!(loader.state(), crate::loader::ScriptLoadState::Ready);
    }

    #[test]
    fn test_mount_unmount_mount_never_overlaps() {
        let host = FakeHost::with_engine();
        let (engine, loader) = setup(&host);

        let first = controller(&engine, &loader);
        first.mount(btc(), 2.0).unwrap();
        first.dispose();
        assert_eq!(engine.stats.live.get(), 0);
        assert_eq!(engine.stats.removed.get(), 1);

        let second = controller(&engine, &loader);
        second.mount(btc(), 2.0).unwrap();

        assert_eq!(engine.stats.live.get(), 1);
        assert_eq!(engine.stats.max_live.get(), 1);
        assert_eq!(engine.stats.built.borrow().len(), 2);
    }

    #[test]
    fn test_drop_releases_widget() {
        let host = FakeHost::with_engine();
        let (engine, loader) = setup(&host);

        let c = controller(&engine, &loader);
        c.mount(btc(), 2.0).unwrap();
        drop(c);

        assert_eq!(engine.stats.live.get(), 0);
        assert_eq!(engine.stats.removed.get(), 1);
    }

    #[test]
    fn test_invalid_binding_never_loads() {
        let host = FakeHost::new();
        let (engine, loader) = setup(&host);
        let c = controller(&engine, &loader);

        let err = c.mount(ChartBinding::new("", "btc", "60"), 2.0).unwrap_err();

        assert!(matches!(err, WidgetError::InvalidBinding(_)));
        assert_eq!(c.state(), LifecycleState::Failed(err));
        assert!(host.injected.borrow().is_empty());
        assert!(engine.stats.built.borrow().is_empty());
        assert!(!c.has_widget());
    }

    #[test]
    fn test_unsupported_offset_never_loads() {
        let host = FakeHost::new();
        let (engine, loader) = setup(&host);
        let c = controller(&engine, &loader);

        let err = c.mount(btc(), 13.0).unwrap_err();

        assert_eq!(err, WidgetError::UnsupportedOffset(13.0));
        assert_eq!(c.state().error(), Some(&err));
        assert_eq!(loader.state(), crate::loader::ScriptLoadState::NotRequested);
        assert!(engine.stats.built.borrow().is_empty());
    }

    #[test]
    fn test_script_failure_fails_every_controller() {
        let host = FakeHost::new();
        let (engine, loader) = setup(&host);
        let a = controller(&engine, &loader);
        let b = controller(&engine, &loader);

        a.mount(btc(), 2.0).unwrap();
        b.mount(ChartBinding::new("ETH/USDT", "eth-usdt", "D"), 2.0).unwrap();
        host.complete(Err("network error".to_string()));

        let expected =
            LifecycleState::Failed(WidgetError::ScriptLoadFailed("network error".to_string()));
        assert_eq!(a.state(), expected);
        assert_eq!(b.state(), expected);
        assert_eq!(host.injected.borrow().len(), 1);
        assert!(engine.stats.built.borrow().is_empty());
    }

    #[test]
    fn test_engine_unavailable_after_load() {
        let host = FakeHost::new();
        host.defines_global.set(false);
        let (engine, loader) = setup(&host);
        let c = controller(&engine, &loader);

        c.mount(btc(), 2.0).unwrap();
        host.complete(Ok(()));

        assert!(matches!(
            c.state(),
            LifecycleState::Failed(WidgetError::EngineUnavailable(_))
        ));
    }

    #[test]
    fn test_construction_error() {
        let host = FakeHost::with_engine();
        let (engine, loader) = setup(&host);
        engine.stats.fail_next.set(true);
        let c = controller(&engine, &loader);

        c.mount(btc(), 2.0).unwrap();

        assert!(matches!(c.state(), LifecycleState::Failed(WidgetError::Engine(_))));
        assert_eq!(engine.stats.live.get(), 0);
        assert!(!c.has_widget());
    }

    #[test]
    fn test_rebind_replaces_widget() {
        let host = FakeHost::with_engine();
        let (engine, loader) = setup(&host);
        let c = controller(&engine, &loader);

        c.mount(btc(), 2.0).unwrap();
        c.rebind(ChartBinding::new("ETH/USDT", "eth-usdt", "D"), 2.0).unwrap();

        assert_eq!(c.state(), LifecycleState::Active);
        assert_eq!(engine.stats.live.get(), 1);
        assert_eq!(engine.stats.max_live.get(), 1);
        assert_eq!(engine.stats.removed.get(), 1);
        assert_eq!(engine.stats.built.borrow()[1].symbol, "ETH/USDT");
        assert_eq!(c.binding().unwrap().instrument_id, "eth-usdt");
    }

    #[test]
    fn test_rebind_same_binding_is_noop() {
        let host = FakeHost::with_engine();
        let (engine, loader) = setup(&host);
        let c = controller(&engine, &loader);

        c.mount(btc(), 2.0).unwrap();
        c.rebind(btc(), 2.0).unwrap();
        assert_eq!(engine.stats.built.borrow().len(), 1);

        // A new timezone is a different widget
        c.rebind(btc(), 3.0).unwrap();
        assert_eq!(engine.stats.built.borrow().len(), 2);
        assert_eq!(engine.stats.built.borrow()[1].timezone, "Asia/Bahrain");
    }

    #[test]
    fn test_rebind_while_initializing() {
        let host = FakeHost::new();
        let (engine, loader) = setup(&host);
        let c = controller(&engine, &loader);

        c.mount(btc(), 2.0).unwrap();
        c.rebind(ChartBinding::new("ETH/USDT", "eth-usdt", "D"), 2.0).unwrap();
        assert_eq!(c.state(), LifecycleState::Initializing);
        assert_eq!(loader.pending_waiters(), 1);

        host.complete(Ok(()));

        let built = engine.stats.built.borrow();
        assert_eq!(built.len(), 1);
        assert_eq!(built[0].symbol, "ETH/USDT");
    }

    #[test]
    fn test_rebind_after_dispose() {
        let host = FakeHost::with_engine();
        let (engine, loader) = setup(&host);
        let c = controller(&engine, &loader);

        c.mount(btc(), 2.0).unwrap();
        c.dispose();
        c.rebind(btc(), 2.0).unwrap();

        assert_eq!(c.state(), LifecycleState::Active);
        assert_eq!(engine.stats.max_live.get(), 1);
    }

    #[test]
    fn test_invalid_transitions() {
        let host = FakeHost::with_engine();
        let (engine, loader) = setup(&host);
        let c = controller(&engine, &loader);

        c.mount(btc(), 2.0).unwrap();
        assert!(matches!(
            c.mount(btc(), 2.0),
            Err(WidgetError::InvalidTransition { action: "mount", .. })
        ));

        let failed = controller(&engine, &loader);
        let _ = failed.mount(btc(), 13.0);
        assert!(matches!(
            failed.rebind(btc(), 2.0),
            Err(WidgetError::InvalidTransition { state: "failed", .. })
        ));
        failed.dispose();
        assert!(matches!(failed.state(), LifecycleState::Failed(_)));
    }

    #[test]
    fn test_observer_sees_async_transitions() {
        let host = FakeHost::new();
        let (engine, loader) = setup(&host);
        let c = Rc::new(controller(&engine, &loader));

        let seen = Rc::new(RefCell::new(Vec::new()));
        {
            let seen = Rc::clone(&seen);
            let weak = Rc::downgrade(&c);
            c.set_observer(move |state| {
                seen.borrow_mut().push(state.name());
                // Re-entrant reads are allowed
                if let Some(c) = weak.upgrade() {
                    assert_eq!(c.state().name(), state.name());
                }
            });
        }

        c.mount(btc(), 2.0).unwrap();
        host.complete(Ok(()));
        c.dispose();

        assert_eq!(*seen.borrow(), vec!["initializing", "active", "disposed"]);
    }

    #[test]
    fn test_rebind_rejects_invalid_binding_and_keeps_widget() {
        let host = FakeHost::with_engine();
        let (engine, loader) = setup(&host);
        let c = controller(&engine, &loader);
        c.mount(btc(), 2.0).unwrap();

        let err = c.rebind(ChartBinding::new("", "x", "60"), 2.0).unwrap_err();
        assert!(matches!(err, WidgetError::InvalidBinding(_)));

        let err = c.rebind(btc(), 13.0).unwrap_err();
        assert_eq!(err, WidgetError::UnsupportedOffset(13.0));

        assert_eq!(c.state(), LifecycleState::Active);
        assert!(c.has_widget());
        assert_eq!(engine.stats.live.get(), 1);
        assert_eq!(engine.stats.removed.get(), 0);
        assert_eq!(c.binding(), Some(btc()));
    }

    #[test]
    fn test_rebind_rejected_while_initializing_keeps_pending_load() {
        let host = FakeHost::new();
        let (engine, loader) = setup(&host);
        let c = controller(&engine, &loader);
        c.mount(btc(), 2.0).unwrap();

        assert!(c.rebind(ChartBinding::new("ETH/USDT", "eth-usdt", " "), 2.0).is_err());
        assert_eq!(c.state(), LifecycleState::Initializing);
        assert_eq!(loader.pending_waiters(), 1);

        host.complete(Ok(()));
        assert_eq!(c.state(), LifecycleState::Active);
        assert_eq!(engine.stats.built.borrow()[0].symbol, "BTC/USDT");
    }

    #[test]
    fn test_resize_rebuilds_active_widget() {
        let host = FakeHost::with_engine();
        let (engine, loader) = setup(&host);
        let c = controller(&engine, &loader);
        c.capture_viewport(ViewportState::new(750, 900).unwrap());
        c.mount(btc(), 2.0).unwrap();
        assert_eq!(engine.stats.built.borrow()[0].width, Dimension::Pixels(750));

        let dims = c.on_resize(ViewportState::new(600, 900).unwrap()).unwrap();
        assert_eq!(dims.width, Dimension::Pixels(540));

        {
            let built = engine.stats.built.borrow();
            assert_eq!(built.len(), 2);
            assert_eq!(built[1].width, Dimension::Pixels(540));
            assert_eq!(built[1].height, Dimension::Pixels(600));
        }
        assert_eq!(c.state(), LifecycleState::Active);
        assert_eq!(engine.stats.live.get(), 1);
        assert_eq!(engine.stats.max_live.get(), 1);

        // Same computed size: the widget is left alone
        assert!(c.on_resize(ViewportState::new(600, 950).unwrap()).is_some());
        assert_eq!(engine.stats.built.borrow().len(), 2);
    }

    #[test]
    fn test_resize_while_initializing_waits_for_construct() {
        let host = FakeHost::new();
        let (engine, loader) = setup(&host);
        let c = controller(&engine, &loader);
        c.capture_viewport(ViewportState::new(750, 900).unwrap());
        c.mount(btc(), 2.0).unwrap();

        c.on_resize(ViewportState::new(600, 900).unwrap());
        assert!(engine.stats.built.borrow().is_empty());

        host.complete(Ok(()));
        let built = engine.stats.built.borrow();
        assert_eq!(built.len(), 1);
        assert_eq!(built[0].width, Dimension::Pixels(540));
    }

    #[test]
    fn test_observer_fires_once_on_synchronous_paths() {
        let host = FakeHost::with_engine();
        let (engine, loader) = setup(&host);

        let active = controller(&engine, &loader);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        active.set_observer(move |state| sink.borrow_mut().push(state.name()));
        active.mount(btc(), 2.0).unwrap();
        assert_eq!(*seen.borrow(), vec!["active"]);

        engine.stats.fail_next.set(true);
        let failing = controller(&engine, &loader);
        let errors = Rc::new(Cell::new(0));
        let sink = Rc::clone(&errors);
        failing.set_observer(move |state| {
            if state.error().is_some() {
                sink.set(sink.get() + 1);
            }
        });
        failing.mount(btc(), 2.0).unwrap();
        assert_eq!(errors.get(), 1);
    }

    #[test]
    fn test_dimensions_reach_options() {
        let host = FakeHost::with_engine();
        let (engine, loader) = setup(&host);
        let c = controller(&engine, &loader);

        let dims = c.capture_viewport(ViewportState::new(500, 900).unwrap());
        assert_eq!(dims.width, Dimension::Pixels(440));

        c.mount(btc(), 2.0).unwrap();
        let built = engine.stats.built.borrow();
        assert_eq!(built[0].width, Dimension::Pixels(440));
        assert_eq!(built[0].height, Dimension::Pixels(600));
    }

    #[test]
    fn test_breakpoint_changes() {
        let host = FakeHost::with_engine();
        let (engine, loader) = setup(&host);
        let c = controller(&engine, &loader);
        c.capture_viewport(ViewportState::new(750, 900).unwrap());

        assert_eq!(
            c.set_breakpoints(Breakpoints {
                narrow: false,
                book: true
            }),
            None
        );

        let dims = c
            .set_breakpoints(Breakpoints {
                narrow: true,
                book: true,
            })
            .unwrap();
        assert_eq!(dims.width, Dimension::Pixels(690));
        assert_eq!(dims.height, Dimension::Pixels(600));
    }
}
