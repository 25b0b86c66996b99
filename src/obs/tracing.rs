// self
use crate::{
	_prelude::*,
	obs::{self, FlowOutcome, FlowPhase},
};

/// Future returned by [`FlowSpan::instrument`].
#[cfg(feature = "tracing")]
pub type InstrumentedFlow<F> = tracing::instrument::Instrumented<F>;
/// Future returned by [`FlowSpan::instrument`].
#[cfg(not(feature = "tracing"))]
pub type InstrumentedFlow<F> = F;

/// One phase of one flow: span plus attempt/outcome counters.
#[derive(Clone, Debug)]
pub struct FlowSpan {
	phase: FlowPhase,
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl FlowSpan {
	/// Opens the span and counts the attempt.
	pub fn start(phase: FlowPhase, strategy: &str) -> Self {
		obs::record_flow_outcome(phase, FlowOutcome::Attempt);

		#[cfg(feature = "tracing")]
		let span = tracing::info_span!(
			"oauth2_azure_ad.flow",
			phase = phase.as_str(),
			strategy,
			outcome = tracing::field::Empty,
		);
		#[cfg(not(feature = "tracing"))]
		let _ = strategy;

		Self {
			phase,
			#[cfg(feature = "tracing")]
			span,
		}
	}

	/// Phase this span covers.
	pub fn phase(&self) -> FlowPhase {
		self.phase
	}

	/// Runs synchronous work inside the span.
	pub fn in_scope<R>(&self, work: impl FnOnce() -> R) -> R {
		#[cfg(feature = "tracing")]
		return self.span.in_scope(work);
		#[cfg(not(feature = "tracing"))]
		work()
	}

	/// Attaches the span to `fut` without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedFlow<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		return tracing::Instrument::instrument(fut, self.span.clone());
		#[cfg(not(feature = "tracing"))]
		fut
	}

	/// Records the final outcome on the span and the counter.
	pub fn finish(&self, outcome: FlowOutcome) {
		obs::record_flow_outcome(self.phase, outcome);

		#[cfg(feature = "tracing")]
		self.span.record("outcome", outcome.as_str());
	}
}

/// Emits a debug event for a callback state change.
pub fn trace_transition(from: &'static str, to: &'static str) {
	#[cfg(feature = "tracing")]
	tracing::debug!(from, to, "callback state transition");
	#[cfg(not(feature = "tracing"))]
	let _ = (from, to);
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn sync_work_runs_inside_the_span() {
		let span = FlowSpan::start(FlowPhase::Request, "azure_activedirectory_v2");
		let value = span.in_scope(|| 7);

		span.finish(FlowOutcome::Success);

		assert_eq!(value, 7);
		assert_eq!(span.phase(), FlowPhase::Request);
	}

	#[tokio::test]
	async fn instrumented_futures_pass_output_through() {
		let span = FlowSpan::start(FlowPhase::Callback, "azure_activedirectory_v2");
		let value = span.instrument(async { 42 }).await;

		span.finish(FlowOutcome::Failure);

		assert_eq!(value, 42);
	}

	#[cfg(feature = "tracing")]
	#[test]
	fn span_carries_phase_strategy_and_outcome_fields() {
		let span = FlowSpan::start(FlowPhase::Callback, "azure_activedirectory_v2");
		let metadata = span.span.metadata().expect("Span should keep its callsite metadata.");
		let fields = metadata.fields().iter().map(|field| field.name()).collect::<Vec<_>>();

		assert_eq!(metadata.name(), "oauth2_azure_ad.flow");
		assert_eq!(fields, ["phase", "strategy", "outcome"]);
	}
}
