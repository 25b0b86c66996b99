//! Flow observability.
//!
//! With the `tracing` feature every phase runs inside an `oauth2_azure_ad.flow` span
//! carrying `phase`, `strategy`, and (once known) `outcome`; callback state transitions
//! and ignored token decode failures are emitted as debug events. With the `metrics`
//! feature the `oauth2_azure_ad_flow_total` counter is incremented per attempt and per
//! outcome, labeled by `phase` and `outcome`. Without either feature everything here
//! compiles down to nothing.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

/// Half of the sign-in a measurement belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowPhase {
	/// Provider resolution and authorize redirect.
	Request,
	/// Code exchange, claim extraction, verification.
	Callback,
}
impl FlowPhase {
	/// Label used for span fields and metric labels.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowPhase::Request => "request",
			FlowPhase::Callback => "callback",
		}
	}
}

/// Outcome label.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Phase entered.
	Attempt,
	/// Phase finished without error.
	Success,
	/// Phase ended in a failure reported to the host.
	Failure,
}
impl FlowOutcome {
	/// Label used for span fields and metric labels.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
			FlowOutcome::Success => "success",
			FlowOutcome::Failure => "failure",
		}
	}

	/// `Success` for `Ok`, `Failure` for `Err`.
	pub fn of<T, E>(result: &Result<T, E>) -> Self {
		if result.is_ok() { FlowOutcome::Success } else { FlowOutcome::Failure }
	}
}
