//! # Example: fault_burst
//!
//! Many ranks of one job report the same fault within a few milliseconds.
//! The service coalesces the burst and delivers it once, listing every rank.
//!
//! Shows how to:
//! - Register a single-code handler and the built-in [`LogHandler`] as fallback.
//! - Watch the monitor bus while reports merge.
//! - Get the final [`Delivery`] through a receipt.
//!
//! ## Flow
//! ```text
//! rank 0..7 ── report(LINK_DOWN) ──► EventCache (merge, timer reset each time)
//!                                        └─ quiet for W ─► chain: "link-down" handler
//! rank 3   ── report(NODE_SLOW)  ──► EventCache ─► chain: LogHandler (unclaimed)
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example fault_burst --features logging
//! ```

use std::time::Duration;

use eventvisor::{
    Config, Delivery, EventService, Flow, HandlerFn, HandlerSpec, Info, LogHandler, MonitorKind,
    Notification, ProcId, Report, StatusCode,
};

const LINK_DOWN: StatusCode = StatusCode(-101);
const NODE_SLOW: StatusCode = StatusCode(-205);

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("eventvisor=debug"))
        .init();

    let mut cfg = Config::default();
    cfg.coalescing_window = Duration::from_millis(50);
    cfg.max_coalescing_delay = Duration::from_millis(500);

    let svc = EventService::builder(cfg)
        .with_handler(LogHandler::spec("fallback-log"))
        .build()?;

    svc.register_handler(
        HandlerSpec::new(
            "link-down",
            HandlerFn::arc(|n: &mut Notification| {
                let ranks: Vec<String> = n.payload().sources().map(|p| p.to_string()).collect();
                println!("[handler] link down reported by {} ranks: {ranks:?}", ranks.len());
                n.push_result(Info::new("action", "reroute"));
                Ok(Flow::Continue)
            }),
        )
        .with_code(LINK_DOWN)
        .with_locator("demos/fault_burst.rs"),
    )
    .await?;

    let mut monitor = svc.subscribe();
    tokio::spawn(async move {
        while let Ok(ev) = monitor.recv().await {
            if matches!(ev.kind, MonitorKind::EventMerged) {
                println!(
                    "[monitor] merged: code={:?} sources={:?} flush_in={:?}ms",
                    ev.code, ev.count, ev.delay_ms
                );
            }
        }
    });

    let receipt = svc
        .report_with_receipt(Report::new(LINK_DOWN, ProcId::new("job-1", 0)))
        .await?;
    for rank in 1..8 {
        tokio::time::sleep(Duration::from_millis(5)).await;
        svc.report_event(Report::new(LINK_DOWN, ProcId::new("job-1", rank)))
            .await?;
    }
    svc.report_event(
        Report::new(NODE_SLOW, ProcId::new("job-1", 3)).with_info(Info::new("load", 97u64)),
    )
    .await?;

    let delivery: Delivery = receipt.await?;
    println!(
        "[receipt] code={} visited={:?} results={:?} outcome={:?}",
        delivery.code, delivery.visited, delivery.results, delivery.outcome
    );

    svc.shutdown().await?;
    Ok(())
}
