//! Span and event helpers for gateway stages.

// self
use crate::{_prelude::*, obs::GatewayStage};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedStage<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedStage<F> = F;

/// A span builder used by gateway stages.
#[derive(Clone, Debug)]
pub struct StageSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl StageSpan {
	/// Creates a new span tagged with the provided stage + call site.
	pub fn new(stage: GatewayStage, op: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("certdesk.gateway", stage = stage.as_str(), op);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (stage, op);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedStage<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Emits a warning when a session ends; `reason` is a stable label.
pub fn note_session_invalidated(reason: &'static str) {
	#[cfg(feature = "tracing")]
	tracing::warn!(reason, "Session invalidated; stored credentials were cleared.");
	#[cfg(not(feature = "tracing"))]
	let _ = reason;
}

/// Emits a warning for a store failure that cannot be surfaced to the caller.
pub fn note_store_failure(op: &'static str, error: &dyn StdError) {
	#[cfg(feature = "tracing")]
	tracing::warn!(op, error = %error, "Credential store operation failed.");
	#[cfg(not(feature = "tracing"))]
	let _ = (op, error);
}

/// Emits a debug event when a request is parked behind an in-flight refresh.
pub fn note_coalesced(pending: usize) {
	#[cfg(feature = "tracing")]
	tracing::debug!(pending, "Request queued behind in-flight token refresh.");
	#[cfg(not(feature = "tracing"))]
	let _ = pending;
}
