// self
use crate::obs::{FlowOutcome, FlowPhase};

/// Name of the flow counter.
pub const FLOW_COUNTER: &str = "oauth2_azure_ad_flow_total";

/// Increments [`FLOW_COUNTER`] for `phase`/`outcome` on the global recorder.
pub fn record_flow_outcome(phase: FlowPhase, outcome: FlowOutcome) {
	#[cfg(feature = "metrics")]
	metrics::counter!(FLOW_COUNTER, "phase" => phase.as_str(), "outcome" => outcome.as_str())
		.increment(1);
	#[cfg(not(feature = "metrics"))]
	let _ = (phase, outcome);
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn recording_without_a_recorder_is_a_noop() {
		record_flow_outcome(FlowPhase::Request, FlowOutcome::Attempt);
		record_flow_outcome(FlowPhase::Callback, FlowOutcome::Failure);
	}
}
