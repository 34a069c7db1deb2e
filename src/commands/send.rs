//! Run one dispatch cycle and record its outcome.

use tracing::{error, info, warn};

use crate::dispatch::{DispatchOutcome, DispatchResult, Dispatcher};
use crate::error::{Error, Result};
use crate::metrics;

/// CLI entry point
///
/// A greeting configured on the dispatcher goes out only when the catalog
/// was read and has a pending promotion. Returns the cycle result; the
/// caller decides the exit status.
pub async fn run(dispatcher: &Dispatcher<'_>) -> Result<DispatchResult> {
    let result = match dispatcher.run_once().await {
        Ok(result) => result,
        Err(e) => {
            if matches!(e, Error::SourceUnavailable(_)) {
                metrics::record_source_unavailable();
            }
            error!(error = %e, "Dispatch cycle aborted");
            return Err(e);
        }
    };

    metrics::record_cycle(result.outcome);
    report(&result);
    Ok(result)
}

fn report(result: &DispatchResult) {
    let row = result.item.as_ref().map(|i| i.row);
    let name = result.item.as_ref().map(|i| i.name.as_str()).unwrap_or("");
    let error = result.error.as_deref().unwrap_or("");

    match result.outcome {
        DispatchOutcome::Sent => info!(?row, name, "Cycle finished: sent"),
        DispatchOutcome::NothingPending => info!("Cycle finished: nothing pending"),
        DispatchOutcome::DeliveryFailed => {
            error!(?row, name, error, "Cycle finished: delivery failed")
        }
        DispatchOutcome::AckFailed => warn!(?row, name, error, "Cycle finished: ack failed"),
    }
}
