//! # Event bus: the public router.
//!
//! [`Bus`] ties the [`Registry`] and the dispatcher together. It knows nothing
//! about event semantics: `publish` looks up the subscriptions for the event name
//! and hands them to the dispatcher.
//!
//! ## Architecture
//! ```text
//! Publishers (many):                         Subscribers (many):
//!   publish(name, payload) ──┐                 subscribe(name, handler) ──┐
//!                            ▼                                            ▼
//!                 ┌─────────────────────┐                   ┌──────────────────────┐
//!                 │ Bus                 │──handlers_for()──►│ Registry (COW slices)│
//!                 │  - recursion guard  │                   └──────────────────────┘
//!                 │  - config           │
//!                 └─────────┬───────────┘
//!                           ▼
//!                 Dispatcher (sync | concurrent, isolated | fail-fast)
//!                           ▼
//!                     PublishReport
//! ```
//!
//! ## Rules
//! - **No subscribers is not an error**: `publish` returns an empty report.
//! - **Handler failures are data**: under `Isolated` they only appear in the report.
//! - **Publishing never mutates the registry**; subscriptions added while a publish is
//!   in flight are not seen by it.
//! - **Cloneable**: clones share one registry; separate `Bus::new` calls share nothing.

use std::any::Any;
use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::core::builder::BusBuilder;
use crate::core::config::BusConfig;
use crate::core::dispatcher::Dispatcher;
use crate::core::guard::DispatchChain;
use crate::core::registry::{Registry, Snapshot};
use crate::core::report::PublishReport;
use crate::core::subscription::{SubscribeOptions, SubscriptionId};
use crate::error::{BusError, HandlerError};
use crate::events::Event;
use crate::handlers::{HandlerFn, HandlerRef};

struct Inner {
    cfg: BusConfig,
    registry: Registry,
    dispatcher: Dispatcher,
}

/// In-process publish/subscribe bus.
///
/// # Example
/// ```rust
/// use herald::{Bus, BusConfig, Event, HandlerError};
/// use tokio_util::sync::CancellationToken;
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() -> Result<(), herald::BusError> {
///     let bus = Bus::new(BusConfig::default());
///
///     bus.subscribe_fn("order_create", "charge_client", |ev: Event, _ctx: CancellationToken| async move {
///         let id = ev.payload::<u64>().copied().ok_or_else(|| HandlerError::fail("no id"))?;
///         assert_eq!(id, 42);
///         Ok::<(), HandlerError>(())
///     })?;
///
///     let report = bus.publish("order_create", 42u64).await?;
///     assert!(report.all_succeeded());
///     assert_eq!(report.len(), 1);
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct Bus {
    inner: Arc<Inner>,
}

impl Bus {
    /// Creates a bus with the given configuration.
    pub fn new(cfg: BusConfig) -> Self {
        let dispatcher = Dispatcher::new(&cfg);
        Self {
            inner: Arc::new(Inner {
                cfg,
                registry: Registry::new(),
                dispatcher,
            }),
        }
    }

    /// Starts a [`BusBuilder`] from `cfg`.
    pub fn builder(cfg: BusConfig) -> BusBuilder {
        BusBuilder::new(cfg)
    }

    pub fn config(&self) -> &BusConfig {
        &self.inner.cfg
    }

    // ---------------------------
    // Subscriber-facing
    // ---------------------------

    /// Subscribes `handler` to `event_name` with default options.
    pub fn subscribe(
        &self,
        event_name: &str,
        handler: HandlerRef,
    ) -> Result<SubscriptionId, BusError> {
        self.subscribe_with(event_name, handler, SubscribeOptions::default())
    }

    /// Subscribes `handler` to `event_name` with explicit priority/timeout.
    pub fn subscribe_with(
        &self,
        event_name: &str,
        handler: HandlerRef,
        opts: SubscribeOptions,
    ) -> Result<SubscriptionId, BusError> {
        let handler_name = handler.name().to_string();
        let id = self
            .inner
            .registry
            .subscribe(event_name, handler, opts)
            .inspect_err(|e| {
                warn!(event = %event_name, handler = %handler_name, error = %e, "subscribe rejected");
            })?;
        debug!(
            event = %event_name,
            subscription = %id,
            handler = %handler_name,
            priority = opts.priority,
            "subscribed"
        );
        Ok(id)
    }

    /// Subscribes a closure; shorthand for [`HandlerFn::arc`] + [`Bus::subscribe`].
    pub fn subscribe_fn<F, Fut>(
        &self,
        event_name: &str,
        handler_name: impl Into<Cow<'static, str>>,
        f: F,
    ) -> Result<SubscriptionId, BusError>
    where
        F: Fn(Event, CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
    {
        self.subscribe(event_name, HandlerFn::arc(handler_name, f))
    }

    /// Removes a subscription. Returns `false` if the id is unknown.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let removed = self.inner.registry.unsubscribe(id);
        debug!(subscription = %id, removed, "unsubscribe");
        removed
    }

    /// Ordered, immutable snapshot of the subscriptions for `event_name`.
    pub fn handlers_for(&self, event_name: &str) -> Snapshot {
        self.inner.registry.handlers_for(event_name)
    }

    pub fn subscriber_count(&self, event_name: &str) -> usize {
        self.inner.registry.subscriber_count(event_name)
    }

    /// Sorted names of events that have at least one subscriber.
    pub fn event_names(&self) -> Vec<String> {
        self.inner.registry.event_names()
    }

    /// Removes every subscription.
    pub fn clear(&self) {
        self.inner.registry.clear();
        debug!("registry cleared");
    }

    // ---------------------------
    // Publisher-facing
    // ---------------------------

    /// Builds an [`Event`] and publishes it.
    pub async fn publish<T>(
        &self,
        name: impl Into<Arc<str>>,
        payload: T,
    ) -> Result<PublishReport, BusError>
    where
        T: Any + Send + Sync,
    {
        self.publish_event(Event::new(name, payload)).await
    }

    /// Publishes a prepared event to every subscriber of its name.
    ///
    /// ### Errors
    /// - [`BusError::CyclicDispatch`] if called from a handler at `max_dispatch_depth`
    ///   and the event has subscribers (an event nobody listens to cannot recurse).
    /// - [`BusError::HandlerFailed`] on the first handler failure, fail-fast policy only.
    pub async fn publish_event(&self, event: Event) -> Result<PublishReport, BusError> {
        let snapshot = self.inner.registry.handlers_for(event.name());
        if snapshot.is_empty() {
            trace!(event = %event.name(), "no subscribers");
            return Ok(PublishReport::empty(event));
        }

        let max_depth = self.inner.cfg.max_dispatch_depth_clamped();
        let chain = DispatchChain::current()
            .enter(event.name(), max_depth)
            .inspect_err(|e| warn!(event = %event.name(), error = %e, "publish rejected"))?;

        debug!(
            event = %event.name(),
            correlation_id = %event.correlation_id(),
            handlers = snapshot.len(),
            depth = chain.depth(),
            "publishing"
        );
        let report = self.inner.dispatcher.dispatch(event, snapshot, chain).await?;
        debug!(
            event = %report.event.name(),
            handlers = report.len(),
            failed = report.failed().count(),
            "published"
        );
        Ok(report)
    }
}

impl Default for Bus {
    fn default() -> Self {
        Self::new(BusConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use crate::error::DispatchError;
    use crate::policies::DispatchPolicy;

    fn recorder(log: &Arc<Mutex<Vec<&'static str>>>, tag: &'static str) -> HandlerRef {
        let log = Arc::clone(log);
        HandlerFn::arc(tag, move |_ev: Event, _ctx: CancellationToken| {
            let log = Arc::clone(&log);
            async move {
                log.lock().unwrap().push(tag);
                Ok::<(), HandlerError>(())
            }
        })
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_empty() {
        let bus = Bus::default();
        let report = bus.publish("nobody_listens", 1u8).await.unwrap();
        assert!(report.is_empty());
        assert_eq!(report.event.name(), "nobody_listens");
    }

    #[tokio::test]
    async fn synchronous_order_matches_registration() {
        let bus = Bus::default();
        let log = Arc::new(Mutex::new(Vec::new()));
        for tag in ["h1", "h2", "h3", "h4"] {
            bus.subscribe("evt", recorder(&log, tag)).unwrap();
        }

        let report = bus.publish("evt", ()).await.unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["h1", "h2", "h3", "h4"]);
        let order: Vec<&str> = report.results.iter().map(|r| r.handler.as_str()).collect();
        assert_eq!(order, vec!["h1", "h2", "h3", "h4"]);
    }

    #[tokio::test]
    async fn priority_overrides_registration_order() {
        let bus = Bus::default();
        let log = Arc::new(Mutex::new(Vec::new()));
        bus.subscribe("evt", recorder(&log, "normal")).unwrap();
        bus.subscribe_with(
            "evt",
            recorder(&log, "urgent"),
            SubscribeOptions::default().with_priority(1),
        )
        .unwrap();

        bus.publish("evt", ()).await.unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["urgent", "normal"]);
    }

    #[tokio::test]
    async fn isolated_failure_does_not_stop_others() {
        let bus = Bus::default();
        let log = Arc::new(Mutex::new(Vec::new()));
        bus.subscribe("evt", recorder(&log, "before")).unwrap();
        bus.subscribe_fn("evt", "broken", |_ev: Event, _ctx: CancellationToken| async {
            Err::<(), _>(HandlerError::fail("inventory offline"))
        })
        .unwrap();
        bus.subscribe_fn("evt", "panics", |_ev: Event, _ctx: CancellationToken| async {
            if true {
                panic!("bug");
            }
            Ok::<(), HandlerError>(())
        })
        .unwrap();
        bus.subscribe("evt", recorder(&log, "after")).unwrap();

        let report = bus.publish("evt", ()).await.unwrap();
        assert_eq!(report.len(), 4);
        assert_eq!(report.failed().count(), 2);
        assert_eq!(*log.lock().unwrap(), vec!["before", "after"]);
        assert_eq!(
            report.results[1].error,
            Some(DispatchError::Handler {
                error: "inventory offline".into()
            })
        );
        assert!(matches!(
            report.results[2].error,
            Some(DispatchError::Panicked { .. })
        ));
    }

    #[tokio::test]
    async fn unsubscribed_handler_is_never_invoked() {
        let bus = Bus::default();
        let calls = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&calls);
        let id = bus
            .subscribe_fn("evt", "counter", move |_ev: Event, _ctx: CancellationToken| {
                let c = Arc::clone(&c);
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            })
            .unwrap();

        bus.publish("evt", ()).await.unwrap();
        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        let report = bus.publish("evt", ()).await.unwrap();

        assert!(report.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn fail_fast_skips_remaining_handlers() {
        let bus = Bus::builder(BusConfig::default())
            .with_policy(DispatchPolicy::FailFast)
            .build();
        let log = Arc::new(Mutex::new(Vec::new()));
        bus.subscribe("evt", recorder(&log, "first")).unwrap();
        let second = bus
            .subscribe_fn("evt", "second", |_ev: Event, _ctx: CancellationToken| async {
                Err::<(), _>(HandlerError::fail("declined"))
            })
            .unwrap();
        bus.subscribe("evt", recorder(&log, "third")).unwrap();

        let err = bus.publish("evt", ()).await.unwrap_err();
        match &err {
            BusError::HandlerFailed {
                subscription,
                handler,
                report,
                ..
            } => {
                assert_eq!(*subscription, second);
                assert_eq!(handler, "second");
                assert_eq!(report.len(), 2);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(*log.lock().unwrap(), vec!["first"]);
    }

    #[tokio::test]
    async fn subscriber_added_mid_dispatch_is_not_invoked() {
        let bus = Bus::default();
        let late_calls = Arc::new(AtomicUsize::new(0));

        let inner_bus = bus.clone();
        let late = Arc::clone(&late_calls);
        bus.subscribe_fn("evt", "adds_late", move |_ev: Event, _ctx: CancellationToken| {
            let bus = inner_bus.clone();
            let late = Arc::clone(&late);
            async move {
                bus.subscribe_fn("evt", "late", move |_ev: Event, _ctx: CancellationToken| {
                    let late = Arc::clone(&late);
                    async move {
                        late.fetch_add(1, Ordering::SeqCst);
                        Ok(())
                    }
                })?;
                Ok::<(), HandlerError>(())
            }
        })
        .unwrap();

        let report = bus.publish("evt", ()).await.unwrap();
        assert_eq!(report.len(), 1);
        assert_eq!(late_calls.load(Ordering::SeqCst), 0);
        assert_eq!(bus.subscriber_count("evt"), 2);
    }

    #[tokio::test]
    async fn separate_buses_share_nothing() {
        let a = Bus::default();
        let b = Bus::default();
        a.subscribe("evt", recorder(&Arc::new(Mutex::new(Vec::new())), "x"))
            .unwrap();

        assert_eq!(a.subscriber_count("evt"), 1);
        assert_eq!(b.subscriber_count("evt"), 0);
        assert!(b.publish("evt", ()).await.unwrap().is_empty());

        a.clear();
        assert!(a.event_names().is_empty());
    }

    #[tokio::test]
    async fn unsubscribed_event_at_max_depth_is_empty_report() {
        let bus = Bus::builder(BusConfig::default())
            .with_max_dispatch_depth(1)
            .build();
        let nested: Arc<Mutex<Option<Result<usize, &'static str>>>> = Arc::new(Mutex::new(None));

        let inner_bus = bus.clone();
        let out = Arc::clone(&nested);
        bus.subscribe_fn("a", "forwards", move |_ev: Event, _ctx: CancellationToken| {
            let bus = inner_bus.clone();
            let out = Arc::clone(&out);
            async move {
                let res = bus.publish("nobody", ()).await;
                *out.lock().unwrap() = Some(res.as_ref().map(|r| r.len()).map_err(|e| e.as_label()));
                res?;
                Ok::<(), HandlerError>(())
            }
        })
        .unwrap();

        let report = bus.publish("a", ()).await.unwrap();
        assert!(report.all_succeeded());
        assert_eq!(*nested.lock().unwrap(), Some(Ok(0)));
    }

    #[tokio::test(start_paused = true)]
    async fn bus_handler_timeout_applies_unless_subscription_overrides() {
        let bus = Bus::builder(BusConfig::default())
            .with_handler_timeout(Duration::from_millis(50))
            .build();
        let slow = bus
            .subscribe_fn("evt", "slow", |_ev: Event, _ctx: CancellationToken| async {
                tokio::time::sleep(Duration::from_millis(200)).await;
                Ok::<(), HandlerError>(())
            })
            .unwrap();
        let patient = bus
            .subscribe_with(
                "evt",
                HandlerFn::arc("patient", |_ev: Event, _ctx: CancellationToken| async {
                    tokio::time::sleep(Duration::from_millis(100)).await;
                    Ok::<(), HandlerError>(())
                }),
                SubscribeOptions::default().with_timeout(Duration::from_millis(300)),
            )
            .unwrap();

        let report = bus.publish("evt", ()).await.unwrap();
        assert_eq!(report.len(), 2);

        let slow = report.result_for(slow).unwrap();
        assert_eq!(
            slow.error,
            Some(DispatchError::Timeout {
                timeout: Duration::from_millis(50)
            })
        );
        assert!(report.result_for(patient).unwrap().is_success());
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn dispatch_states_are_traced() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let guard = tracing::subscriber::set_default(subscriber);

        let bus = Bus::builder(BusConfig::default())
            .with_concurrency(crate::policies::Concurrency::Concurrent { pool_size: 1 })
            .build();
        bus.subscribe_fn("evt", "fine", |_ev: Event, _ctx: CancellationToken| async {
            Ok::<(), HandlerError>(())
        })
        .unwrap();
        bus.subscribe_fn("evt", "broken", |_ev: Event, _ctx: CancellationToken| async {
            Err::<(), _>(HandlerError::fail("nope"))
        })
        .unwrap();
        bus.publish("evt", ()).await.unwrap();
        drop(guard);

        let out = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        for state in ["pending", "running", "succeeded", "failed"] {
            assert!(out.contains(&format!("state={state}")), "missing {state} in:\n{out}");
        }
    }
}
