//! # Order Flow Example
//!
//! Wires a small checkout pipeline onto one bus:
//! - `order_create` fans out to billing, inventory and an auditing handler
//! - billing publishes `order_charged` from inside its handler (nested dispatch)
//! - inventory is slow and gets cut off by its per-subscription timeout
//!
//! ## Run
//! ```bash
//! RUST_LOG=herald=debug cargo run --example order_flow
//! ```

use std::{
    sync::Arc,
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use herald::{
    Bus, BusConfig, Concurrency, Event, Handler, HandlerError, PublishReport, SubscribeOptions,
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
struct OrderCreated {
    id: u64,
    amount_cents: u64,
}

#[derive(Debug)]
struct OrderCharged {
    id: u64,
}

/// Handler with its own state, implemented through the trait.
struct Audit {
    seen: AtomicU64,
}

#[async_trait::async_trait]
impl Handler for Audit {
    fn name(&self) -> &str {
        "audit"
    }

    async fn handle(&self, event: &Event, _ctx: CancellationToken) -> Result<(), HandlerError> {
        let n = self.seen.fetch_add(1, Ordering::Relaxed) + 1;
        println!(
            "[audit] #{n} {} (corr={})",
            event.name(),
            event.correlation_id()
        );
        Ok(())
    }
}

fn print_report(report: &PublishReport) {
    println!();
    println!("Report for '{}':", report.event.name());
    for r in &report.results {
        match &r.error {
            None => println!(" ├─► {:<10} {} in {:?}", r.handler, r.state(), r.elapsed),
            Some(e) => println!(" ├─► {:<10} {} ({})", r.handler, r.state(), e.as_message()),
        }
    }
    println!(
        " └─► {} succeeded, {} failed",
        report.succeeded().count(),
        report.failed().count()
    );
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let bus = Bus::builder(BusConfig::default())
        .with_concurrency(Concurrency::Concurrent { pool_size: 4 })
        .with_handler_timeout(Duration::from_secs(1))
        .with_publish_timeout(Duration::from_secs(2))
        .build();

    let audit = Arc::new(Audit {
        seen: AtomicU64::new(0),
    });
    bus.subscribe_with(
        "order_create",
        audit.clone(),
        SubscribeOptions::default().with_priority(10),
    )?;
    bus.subscribe("order_charged", audit)?;

    let billing = bus.clone();
    bus.subscribe_fn("order_create", "billing", move |ev: Event, _ctx: CancellationToken| {
        let bus = billing.clone();
        async move {
            let order = ev
                .payload::<OrderCreated>()
                .cloned()
                .ok_or_else(|| HandlerError::fail("payload is not OrderCreated"))?;
            println!("[billing] charging {} cents for order {}", order.amount_cents, order.id);

            let charged = Event::new("order_charged", OrderCharged { id: order.id })
                .with_correlation_id(ev.correlation_id());
            bus.publish_event(charged).await?;
            Ok::<(), HandlerError>(())
        }
    })?;

    bus.subscribe_with(
        "order_create",
        herald::HandlerFn::arc("inventory", |_ev: Event, ctx: CancellationToken| async move {
            tokio::select! {
                _ = ctx.cancelled() => Err(HandlerError::Canceled),
                _ = tokio::time::sleep(Duration::from_millis(500)) => Ok(()),
            }
        }),
        SubscribeOptions::default().with_timeout(Duration::from_millis(100)),
    )?;

    bus.subscribe_fn("order_charged", "receipt", |ev: Event, _ctx: CancellationToken| async move {
        if let Some(charged) = ev.payload::<OrderCharged>() {
            println!("[receipt] order {} paid", charged.id);
        }
        Ok::<(), HandlerError>(())
    })?;

    println!("Subscribed events: {:?}", bus.event_names());

    let report = bus
        .publish(
            "order_create",
            OrderCreated {
                id: 42,
                amount_cents: 1999,
            },
        )
        .await?;
    print_report(&report);
    Ok(())
}
