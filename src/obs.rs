//! Optional observability helpers for gateway stages.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `certdesk.gateway` with the `stage` and
//!   `op` (call site) fields, plus `warn` events when a session is invalidated.
//! - Enable `metrics` to increment the `certdesk_gateway_total` counter for every
//!   attempt/success/failure, labeled by `stage` + `outcome`, plus
//!   `certdesk_session_invalidated_total{reason}` and the `certdesk_refresh_waiters`
//!   histogram of requests released per refresh exchange.

mod counter;
mod span;

pub use counter::*;
pub use span::*;

// self
use crate::_prelude::*;

/// Gateway stages observed by the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GatewayStage {
	/// Authenticated request through the gateway.
	Request,
	/// Refresh-token exchange.
	Refresh,
	/// Password login.
	Login,
	/// Unauthenticated public lookup.
	Public,
}
impl GatewayStage {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			GatewayStage::Request => "request",
			GatewayStage::Refresh => "refresh",
			GatewayStage::Login => "login",
			GatewayStage::Public => "public",
		}
	}
}
impl Display for GatewayStage {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StageOutcome {
	/// Entry to a gateway helper.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
	/// Joined an exchange another request was already running.
	Coalesced,
}
impl StageOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			StageOutcome::Attempt => "attempt",
			StageOutcome::Success => "success",
			StageOutcome::Failure => "failure",
			StageOutcome::Coalesced => "coalesced",
		}
	}
}
impl Display for StageOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
