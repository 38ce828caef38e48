//! Script Loader
//!
//! Single-flight loading of the charting engine's bootstrap script.
//!
//! ```text
//! NotRequested ──ensure_loaded──▶ Loading ──onload + global──▶ Ready
//!       │                            └──onerror / no global──▶ Failed
//!       └──global already present──────────────────────────▶ Ready
//! ```
//!
//! The state only moves forward. Every caller that arrives while `Loading`
//! joins the waiter list and receives the same outcome; callers arriving
//! after settlement are answered immediately. The script is injected at most
//! once per loader.
//!
//! Everything runs on one thread (the UI event loop), so the loader is
//! `Rc<RefCell<_>>` and callbacks are plain `FnOnce`.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::config::LoaderConfig;
use crate::error::WidgetError;

/// Completion callback for a script injection
pub type InjectDone = Box<dyn FnOnce(Result<(), String>)>;

/// The page the script is injected into
pub trait ScriptHost {
    /// Whether the engine global is defined right now
    fn engine_present(&self) -> bool;

    /// Append the script and call `done` once it loads or fails.
    /// `done` may run synchronously.
    fn inject(&self, src: &str, done: InjectDone);
}

/// Process-wide load state
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptLoadState {
    NotRequested,
    Loading,
    Ready,
    Failed(WidgetError),
}

impl ScriptLoadState {
    pub fn is_settled(&self) -> bool {
        matches!(self, ScriptLoadState::Ready | ScriptLoadState::Failed(_))
    }
}

type Waiter = Box<dyn FnOnce(Result<(), WidgetError>)>;

struct LoaderInner {
    host: Rc<dyn ScriptHost>,
    config: LoaderConfig,
    state: ScriptLoadState,
    waiters: Vec<(u64, Waiter)>,
    next_waiter: u64,
    injections: usize,
}

/// Shared handle to the loader. Clones refer to the same state.
#[derive(Clone)]
pub struct ScriptLoader {
    inner: Rc<RefCell<LoaderInner>>,
}

impl ScriptLoader {
    pub fn new(host: Rc<dyn ScriptHost>, config: LoaderConfig) -> Self {
        Self {
            inner: Rc::new(RefCell::new(LoaderInner {
                host,
                config,
                state: ScriptLoadState::NotRequested,
                waiters: Vec::new(),
                next_waiter: 0,
                injections: 0,
            })),
        }
    }

    pub fn state(&self) -> ScriptLoadState {
        self.inner.borrow().state.clone()
    }

    /// Number of script injections performed so far (0 or 1)
    pub fn injections(&self) -> usize {
        self.inner.borrow().injections
    }

    /// Number of callers still waiting on the load
    pub fn pending_waiters(&self) -> usize {
        self.inner.borrow().waiters.len()
    }

    /// Request the engine and get `on_settled` called once it is ready or
    /// has failed.
    ///
    /// If the load has already settled, `on_settled` runs before this
    /// returns. The returned [`Subscription`] cancels the callback when
    /// cancelled or dropped.
    pub fn ensure_loaded<F>(&self, on_settled: F) -> Subscription
    where
        F: FnOnce(Result<(), WidgetError>) + 'static,
    {
        let mut inner = self.inner.borrow_mut();

        match inner.state.clone() {
            ScriptLoadState::Ready => {
                drop(inner);
                on_settled(Ok(()));
                Subscription::settled()
            }
            ScriptLoadState::Failed(e) => {
                drop(inner);
                on_settled(Err(e));
                Subscription::settled()
            }
            ScriptLoadState::Loading => {
                let id = inner.push_waiter(Box::new(on_settled));
                tracing::debug!(waiter = id, "Joined pending script load");
                Subscription::pending(Rc::downgrade(&self.inner), id)
            }
            ScriptLoadState::NotRequested => {
                if inner.host.engine_present() {
                    inner.state = ScriptLoadState::Ready;
                    drop(inner);
                    tracing::info!("Charting engine already present, skipping script load");
                    on_settled(Ok(()));
                    return Subscription::settled();
                }

                inner.state = ScriptLoadState::Loading;
                inner.injections += 1;
                let id = inner.push_waiter(Box::new(on_settled));
                let host = Rc::clone(&inner.host);
                let src = inner.config.script_src.clone();
                drop(inner);

                tracing::info!(src = %src, "Injecting charting engine script");

                let weak = Rc::downgrade(&self.inner);
                host.inject(
                    &src,
                    Box::new(move |result| {
                        if let Some(inner) = weak.upgrade() {
                            ScriptLoader { inner }.settle(result);
                        }
                    }),
                );

                Subscription::pending(Rc::downgrade(&self.inner), id)
            }
        }
    }

    fn settle(&self, result: Result<(), String>) {
        let host = Rc::clone(&self.inner.borrow().host);
        let engine_global = self.inner.borrow().config.engine_global.clone();

        let outcome = match result {
            Ok(()) if host.engine_present() => Ok(()),
            Ok(()) => Err(WidgetError::EngineUnavailable(engine_global)),
            Err(e) => Err(WidgetError::ScriptLoadFailed(e)),
        };

        let waiters = {
            let mut inner = self.inner.borrow_mut();
            if inner.state != ScriptLoadState::Loading {
                tracing::warn!(state = ?inner.state, "Ignoring duplicate script completion");
                return;
            }
            inner.state = match &outcome {
                Ok(()) => ScriptLoadState::Ready,
                Err(e) => ScriptLoadState::Failed(e.clone()),
            };
            std::mem::take(&mut inner.waiters)
        };

        match &outcome {
            Ok(()) => tracing::info!(waiters = waiters.len(), "Charting engine loaded"),
            Err(e) => tracing::error!(
                waiters = waiters.len(),
                error = %e,
                "Charting engine failed to load"
            ),
        }

        for (_, waiter) in waiters {
            waiter(outcome.clone());
        }
    }
}

impl LoaderInner {
    fn push_waiter(&mut self, waiter: Waiter) -> u64 {
        let id = self.next_waiter;
        self.next_waiter += 1;
        self.waiters.push((id, waiter));
        id
    }
}

/// A pending interest in the load outcome.
///
/// Dropping it cancels the callback if it has not run yet.
#[must_use = "dropping a Subscription cancels it"]
pub struct Subscription {
    loader: Weak<RefCell<LoaderInner>>,
    id: Option<u64>,
}

impl Subscription {
    fn pending(loader: Weak<RefCell<LoaderInner>>, id: u64) -> Self {
        Self {
            loader,
            id: Some(id),
        }
    }

    fn settled() -> Self {
        Self {
            loader: Weak::new(),
            id: None,
        }
    }

    /// Whether the callback is still queued
    pub fn is_pending(&self) -> bool {
        match (self.id, self.loader.upgrade()) {
            (Some(id), Some(loader)) => loader.borrow().waiters.iter().any(|(w, _)| *w == id),
            _ => false,
        }
    }

    pub fn cancel(mut self) {
        self.detach();
    }

    fn detach(&mut self) {
        let Some(id) = self.id.take() else {
            return;
        };
        if let Some(loader) = self.loader.upgrade() {
            let removed = {
                let mut inner = loader.borrow_mut();
                let before = inner.waiters.len();
                inner.waiters.retain(|(w, _)| *w != id);
                before != inner.waiters.len()
            };
            if removed {
                tracing::debug!(waiter = id, "Cancelled script load subscription");
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.detach();
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{loader, FakeHost};
    use super::*;

    fn recorder() -> (
        Rc<RefCell<Vec<Result<(), WidgetError>>>>,
        impl Fn() -> Box<dyn FnOnce(Result<(), WidgetError>)>,
    ) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_clone = Rc::clone(&seen);
        let make = move || {
            let seen = Rc::clone(&seen_clone);
            Box::new(move |r| seen.borrow_mut().push(r)) as Box<dyn FnOnce(Result<(), WidgetError>)>
        };
        (seen, make)
    }

    #[test]
    fn test_single_flight() {
        let host = FakeHost::new();
        let loader = loader(&host);
        let (seen, make) = recorder();

        let subs: Vec<_> = (0..3).map(|_| loader.ensure_loaded(make())).collect();
        assert_eq!(loader.state(), ScriptLoadState::Loading);
        assert_eq!(loader.pending_waiters(), 3);
        assert!(subs.iter().all(Subscription::is_pending));
        assert!(seen.borrow().is_empty());

        host.complete(Ok(()));

        assert_eq!(host.injected.borrow().len(), 1);
        assert_eq!(loader.injections(), 1);
        assert_eq!(loader.state(), ScriptLoadState::Ready);
        assert_eq!(*seen.borrow(), vec![Ok(()), Ok(()), Ok(())]);
        assert!(!subs.iter().any(Subscription::is_pending));
    }

    #[test]
    fn test_late_caller_answered_immediately() {
        let host = FakeHost::new();
        let loader = loader(&host);
        let (seen, make) = recorder();

        let _first = loader.ensure_loaded(make());
        host.complete(Ok(()));

        let late = loader.ensure_loaded(make());
        assert!(!late.is_pending());
        assert_eq!(seen.borrow().len(), 2);
        assert_eq!(host.injected.borrow().len(), 1);
    }

    #[test]
    fn test_engine_already_present() {
        let host = FakeHost::with_engine();
        let loader = loader(&host);
        let (seen, make) = recorder();

        let _sub = loader.ensure_loaded(make());

        assert_eq!(loader.state(), ScriptLoadState::Ready);
        assert_eq!(loader.injections(), 0);
        assert!(host.injected.borrow().is_empty());
        assert_eq!(*seen.borrow(), vec![Ok(())]);
    }

    #[test]
    fn test_failure_reaches_all_waiters() {
        let host = FakeHost::new();
        let loader = loader(&host);
        let (seen, make) = recorder();

        let _a = loader.ensure_loaded(make());
        let _b = loader.ensure_loaded(make());
        host.complete(Err("404".to_string()));

        let expected = Err(WidgetError::ScriptLoadFailed("404".to_string()));
        assert_eq!(*seen.borrow(), vec![expected.clone(), expected.clone()]);
        assert_eq!(
            loader.state(),
            ScriptLoadState::Failed(WidgetError::ScriptLoadFailed("404".to_string()))
        );

        // No retry on a later call
        let _c = loader.ensure_loaded(make());
        assert_eq!(seen.borrow().last(), Some(&expected));
        assert_eq!(host.injected.borrow().len(), 1);
    }

    #[test]
    fn test_missing_global_after_load() {
        let host = FakeHost::new();
        host.defines_global.set(false);
        let loader = loader(&host);
        let (seen, make) = recorder();

        let _sub = loader.ensure_loaded(make());
        host.complete(Ok(()));

        assert_eq!(
            *seen.borrow(),
            vec![Err(WidgetError::EngineUnavailable("TradingView".to_string()))]
        );
        assert!(loader.state().is_settled());
    }

    #[test]
    fn test_cancelled_waiter_not_called() {
        let host = FakeHost::new();
        let loader = loader(&host);
        let (seen, make) = recorder();

        let keep = loader.ensure_loaded(make());
        let cancelled = loader.ensure_loaded(make());
        cancelled.cancel();
        {
            let _dropped = loader.ensure_loaded(make());
        }
        assert_eq!(loader.pending_waiters(), 1);

        host.complete(Ok(()));
        assert_eq!(seen.borrow().len(), 1);
        drop(keep);
    }

    #[test]
    fn test_synchronous_inject() {
        struct InstantHost;
        impl ScriptHost for InstantHost {
            fn engine_present(&self) -> bool {
                false
            }
            fn inject(&self, _src: &str, done: InjectDone) {
                done(Err("blocked by CSP".to_string()));
            }
        }

        let loader = ScriptLoader::new(Rc::new(InstantHost), LoaderConfig::default());
        let (seen, make) = recorder();

        let sub = loader.ensure_loaded(make());
        assert!(!sub.is_pending());
        assert_eq!(
            *seen.borrow(),
            vec![Err(WidgetError::ScriptLoadFailed("blocked by CSP".to_string()))]
        );
    }
}
