// self
use crate::obs::{FlowKind, FlowOutcome};

/// Records a flow outcome via the global metrics recorder (when enabled).
pub fn record_flow_outcome(kind: FlowKind, outcome: FlowOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"booking_client_flow_total",
			"flow" => kind.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}

/// Records how many queued requests a settled refresh cycle released, labeled by `outcome`.
pub fn record_refresh_released(outcome: FlowOutcome, released: usize) {
	#[cfg(feature = "metrics")]
	{
		metrics::histogram!(
			"booking_client_refresh_released_requests",
			"outcome" => outcome.as_str()
		)
		.record(released as f64);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (outcome, released);
	}
}
