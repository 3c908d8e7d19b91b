//! Metric emitters for gateway stages, refresh fan-out, and session endings.

// self
use crate::obs::{GatewayStage, StageOutcome};

/// Bumps `certdesk_gateway_total{stage, outcome}`.
pub fn record_stage_outcome(stage: GatewayStage, outcome: StageOutcome) {
	#[cfg(feature = "metrics")]
	metrics::counter!(
		"certdesk_gateway_total",
		"stage" => stage.as_str(),
		"outcome" => outcome.as_str()
	)
	.increment(1);
	#[cfg(not(feature = "metrics"))]
	let _ = (stage, outcome);
}

/// Records how many parked requests one refresh exchange released.
pub fn record_refresh_fan_out(released: usize) {
	#[cfg(feature = "metrics")]
	metrics::histogram!("certdesk_refresh_waiters").record(released as f64);
	#[cfg(not(feature = "metrics"))]
	let _ = released;
}

/// Bumps `certdesk_session_invalidated_total{reason}`; fires once per ended session.
pub fn record_session_invalidated(reason: &'static str) {
	#[cfg(feature = "metrics")]
	metrics::counter!("certdesk_session_invalidated_total", "reason" => reason).increment(1);
	#[cfg(not(feature = "metrics"))]
	let _ = reason;
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn emitters_are_noops_without_recorder() {
		record_stage_outcome(GatewayStage::Refresh, StageOutcome::Coalesced);
		record_refresh_fan_out(4);
		record_session_invalidated("refresh_failed");
	}
}
