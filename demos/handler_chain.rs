//! # Example: handler_chain
//!
//! Demonstrates dispatch order, early termination and follow-up events.
//!
//! Shows how to:
//! - Pin handlers first/last and order the rest by precedence.
//! - Stop a chain with [`Flow::EndChain`].
//! - Raise a follow-up event from inside a handler through an [`EventHandle`].
//! - Read the [`Delivery`] handed to a completion.
//!
//! ## Flow
//! ```text
//! report(ABORT) ─► "audit" (First) ─► "cleanup" (prec 10) ─► "escalate" (prec 20, EndChain)
//!                                                              │       ✗ "notify" (Last)
//!                                                              └─► try_report(ESCALATED)
//! report(ESCALATED) ─► "audit" (First) ─► "pager" ─► "notify" (Last)
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example handler_chain
//! ```

use std::time::Duration;

use eventvisor::{
    Config, EventService, Flow, HandlerError, HandlerFn, HandlerRef, HandlerSpec, Info, Notification,
    Placement, ProcId, Report, StatusCode,
};

const ABORT: StatusCode = StatusCode(-1);
const ESCALATED: StatusCode = StatusCode(-2);

fn printer(name: &'static str, flow: Flow) -> HandlerRef {
    HandlerFn::arc(move |n: &mut Notification| {
        println!(
            "[{name}] code={} source={} results-so-far={}",
            n.code(),
            n.source(),
            n.results().len()
        );
        Ok(flow)
    })
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut cfg = Config::default();
    cfg.coalescing_window = Duration::from_millis(10);
    let svc = EventService::builder(cfg).build()?;
    let handle = svc.handle();

    svc.register_handler(
        HandlerSpec::new("audit", printer("audit", Flow::Continue))
            .with_placement(Placement::First),
    )
    .await?;
    svc.register_handler(
        HandlerSpec::new("notify", printer("notify", Flow::Continue))
            .with_placement(Placement::Last),
    )
    .await?;
    svc.register_handler(
        HandlerSpec::new("cleanup", printer("cleanup", Flow::Continue))
            .with_code(ABORT)
            .with_placement(Placement::Precedence(10)),
    )
    .await?;
    svc.register_handler(
        HandlerSpec::new(
            "escalate",
            HandlerFn::arc(move |n: &mut Notification| {
                println!("[escalate] raising follow-up for {}", n.source());
                n.push_result(Info::new("escalated", true));
                handle
                    .try_report(Report::new(ESCALATED, n.source().clone()))
                    .map_err(|e| HandlerError::fail(e.as_message()))?;
                Ok(Flow::EndChain)
            }),
        )
        .with_code(ABORT)
        .with_placement(Placement::Precedence(20)),
    )
    .await?;
    svc.register_handler(
        HandlerSpec::new("pager", printer("pager", Flow::Continue))
            .with_code(ESCALATED),
    )
    .await?;

    let first = svc
        .report_with_receipt(Report::new(ABORT, ProcId::new("job-7", 2)))
        .await?
        .await?;
    println!("[done] {:?} after {:?}", first.outcome, first.visited);

    tokio::time::sleep(Duration::from_millis(50)).await;
    println!("[done] pending after follow-up: {}", svc.force_flush_all().await?);

    svc.shutdown().await?;
    Ok(())
}
