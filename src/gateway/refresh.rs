//! Coalesced refresh exchange.
//!
//! The first request that needs a new access token leads the exchange; every request that
//! hits `401` while the exchange is in flight parks on a one-shot channel and is released
//! in arrival order with the leader's outcome. The state lock is only taken in synchronous
//! sections, never across an `.await`.

mod metrics;

pub use metrics::RefreshMetrics;

// std
use std::mem;
// crates.io
use tokio::sync::oneshot;
// self
use crate::{
	_prelude::*,
	auth::{CredentialPair, TokenSecret},
	error::RefreshFailure,
	gateway::{Attempt, Gateway},
	http::{ApiRequest, ApiTransport, OutboundRequest},
	obs::{self, GatewayStage, StageOutcome, StageSpan},
};

type RefreshOutcome = std::result::Result<TokenSecret, RefreshFailure>;
type Waiter = oneshot::Sender<RefreshOutcome>;

/// Token grant returned by the login and refresh endpoints.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenGrant {
	#[serde(alias = "jwt_token")]
	pub(crate) access_token: TokenSecret,
	#[serde(default)]
	pub(crate) refresh_token: Option<TokenSecret>,
}
impl TokenGrant {
	/// Drops an empty refresh token so it never overwrites a usable one.
	pub(crate) fn rotated_refresh(&mut self) -> Option<TokenSecret> {
		self.refresh_token.take().filter(|token| !token.expose().is_empty())
	}
}

#[derive(Debug, Default)]
enum Phase {
	#[default]
	Idle,
	InFlight(Vec<Waiter>),
}

/// What a request that received `401` should do next.
#[derive(Debug)]
pub(crate) enum RefreshClaim {
	/// Run the exchange with this refresh token; every later claimant waits on it.
	Lead(TokenSecret),
	/// Wait for the exchange already in flight; carries the queue position.
	Wait(oneshot::Receiver<RefreshOutcome>, usize),
	/// A refresh finished after the request was sent; replay with this token.
	Rotated(TokenSecret),
	/// An exchange failed after the request was sent; share its failure.
	Failed(RefreshFailure),
	/// Nothing to share and no refresh token to lead with.
	Unavailable,
}

/// Per-gateway refresh bookkeeping.
#[derive(Debug, Default)]
pub(crate) struct RefreshState {
	phase: Phase,
	epoch: u64,
	latest: Option<TokenSecret>,
	/// Bumped whenever an exchange ends, successfully or not.
	settled: u64,
	failure: Option<RefreshFailure>,
}
impl RefreshState {
	/// Number of successful exchanges so far.
	pub(crate) fn epoch(&self) -> u64 {
		self.epoch
	}

	/// Number of exchanges that have ended so far.
	pub(crate) fn settled(&self) -> u64 {
		self.settled
	}

	/// Queues a waiter on the exchange in flight, if any.
	pub(crate) fn join(&mut self) -> Option<(oneshot::Receiver<RefreshOutcome>, usize)> {
		let Phase::InFlight(waiters) = &mut self.phase else {
			return None;
		};
		let (tx, rx) = oneshot::channel();

		waiters.push(tx);

		Some((rx, waiters.len()))
	}

	/// Decides how a rejected request recovers.
	///
	/// `sent_epoch` and `sent_settled` are [`RefreshState::epoch`] and
	/// [`RefreshState::settled`] as observed when the request was first sent; an exchange
	/// that ended since then is shared instead of repeated.
	pub(crate) fn claim(
		&mut self,
		sent_epoch: u64,
		sent_settled: u64,
		refresh_token: Option<TokenSecret>,
	) -> RefreshClaim {
		if let Some((rx, position)) = self.join() {
			return RefreshClaim::Wait(rx, position);
		}
		if let Some(token) = self.latest.as_ref().filter(|_| self.epoch != sent_epoch) {
			return RefreshClaim::Rotated(token.clone());
		}
		if let Some(failure) = self.failure.as_ref().filter(|_| self.settled != sent_settled) {
			return RefreshClaim::Failed(failure.clone());
		}

		let Some(refresh_token) = refresh_token else {
			return RefreshClaim::Unavailable;
		};

		self.phase = Phase::InFlight(Vec::new());

		RefreshClaim::Lead(refresh_token)
	}

	/// Ends the in-flight exchange and releases the waiters in arrival order.
	///
	/// Returns how many waiters were released.
	pub(crate) fn settle(&mut self, outcome: &RefreshOutcome) -> usize {
		let waiters = self.take_waiters();

		self.settled += 1;

		match outcome {
			Ok(token) => {
				self.epoch += 1;
				self.latest = Some(token.clone());
				self.failure = None;
			},
			Err(failure) => {
				self.latest = None;
				self.failure = Some(failure.clone());
			},
		}

		let released = waiters.len();

		for waiter in waiters {
			// A waiter whose request was dropped has nothing left to receive.
			let _ = waiter.send(outcome.clone());
		}

		released
	}

	/// Ends the in-flight exchange without an outcome; waiters see their channel close and
	/// claim again.
	pub(crate) fn abandon(&mut self) {
		drop(self.take_waiters());
	}

	/// Forgets the last refresh outcome after credentials were replaced externally.
	pub(crate) fn rebase(&mut self) {
		self.epoch += 1;
		self.latest = None;
		self.failure = None;
	}

	fn take_waiters(&mut self) -> Vec<Waiter> {
		match mem::take(&mut self.phase) {
			Phase::InFlight(waiters) => waiters,
			Phase::Idle => Vec::new(),
		}
	}
}

/// Releases the in-flight exchange if the leader is dropped before it settles explicitly,
/// so waiting requests can take over instead of hanging.
struct RefreshLease {
	state: Arc<Mutex<RefreshState>>,
	settled: bool,
}
impl RefreshLease {
	fn new(state: Arc<Mutex<RefreshState>>) -> Self {
		Self { state, settled: false }
	}

	fn settle(mut self, outcome: &RefreshOutcome) -> usize {
		self.settled = true;

		self.state.lock().settle(outcome)
	}
}
impl Drop for RefreshLease {
	fn drop(&mut self) {
		if !self.settled {
			self.state.lock().abandon();
		}
	}
}

impl<T> Gateway<T>
where
	T: ?Sized + ApiTransport,
{
	/// Handles a `401` for `attempt` and returns the token to replay it with.
	///
	/// Terminal outcomes clear the stored credentials and notify observers before the
	/// error is returned. A request waiting on an exchange whose leader was dropped claims
	/// again and may lead the next exchange itself.
	pub(crate) async fn recover(&self, attempt: &mut Attempt) -> Result<TokenSecret> {
		if attempt.retried {
			return Err(self.invalidate_session(Error::SessionExpired).await);
		}

		loop {
			// Joining before reading the store keeps a request that lands while the failing
			// leader clears credentials coalesced onto that failure.
			let joined = self.refresh_state.lock().join();
			let (receiver, position) = match joined {
				Some(waiter) => waiter,
				None => {
					let refresh_token = self.store.refresh().await?;
					let claim =
						self.refresh_state.lock().claim(attempt.epoch, attempt.settled, refresh_token);

					match claim {
						RefreshClaim::Lead(refresh_token) => {
							attempt.retried = true;

							return self.lead_refresh(refresh_token).await;
						},
						RefreshClaim::Wait(receiver, position) => (receiver, position),
						RefreshClaim::Rotated(token) => {
							attempt.retried = true;

							return Ok(token);
						},
						RefreshClaim::Failed(failure) => return Err(Error::RefreshFailed(failure)),
						RefreshClaim::Unavailable =>
							return Err(self.invalidate_session(Error::NoRefreshToken).await),
					}
				},
			};

			self.refresh_metrics.record_coalesced();
			obs::record_stage_outcome(GatewayStage::Refresh, StageOutcome::Coalesced);
			obs::note_coalesced(position);

			// A closed channel means the leader was dropped; claim again.
			if let Ok(outcome) = receiver.await {
				attempt.retried = true;

				return outcome.map_err(Error::RefreshFailed);
			}
		}
	}

	async fn lead_refresh(&self, refresh_token: TokenSecret) -> Result<TokenSecret> {
		const STAGE: GatewayStage = GatewayStage::Refresh;

		let lease = RefreshLease::new(self.refresh_state.clone());
		let span = StageSpan::new(STAGE, "lead_refresh");

		obs::record_stage_outcome(STAGE, StageOutcome::Attempt);
		self.refresh_metrics.record_attempt();

		let outcome = span
			.instrument(async {
				let grant = self.exchange_refresh(&refresh_token).await?;

				self.persist_grant(grant).await
			})
			.await;

		match outcome {
			Ok(token) => {
				self.refresh_metrics.record_success();
				obs::record_stage_outcome(STAGE, StageOutcome::Success);
				obs::record_refresh_fan_out(lease.settle(&Ok(token.clone())));

				Ok(token)
			},
			Err(failure) => {
				self.refresh_metrics.record_failure();
				obs::record_stage_outcome(STAGE, StageOutcome::Failure);
				// Cleared before settling so no request can read the old refresh token and
				// start a second exchange.
				self.clear_credentials().await;
				obs::record_refresh_fan_out(lease.settle(&Err(failure.clone())));
				self.notify_session_invalid("refresh_failed");

				Err(Error::RefreshFailed(failure))
			},
		}
	}

	async fn exchange_refresh(
		&self,
		refresh_token: &TokenSecret,
	) -> std::result::Result<TokenGrant, RefreshFailure> {
		let request = ApiRequest::post(self.descriptor.endpoints.refresh.as_str())
			.query("refresh_token", refresh_token.expose())
			.header("accept", "application/json");
		let outbound = OutboundRequest::prepare(&self.descriptor, &request, None)
			.map_err(|e| RefreshFailure::Unreachable { message: e.to_string() })?;
		let response = self
			.transport
			.send(outbound)
			.await
			.map_err(|e| RefreshFailure::Unreachable { message: e.to_string() })?;

		if !response.is_success() {
			return Err(RefreshFailure::Rejected {
				status: response.status,
				detail: response.detail(),
			});
		}

		let grant = response
			.json::<TokenGrant>()
			.map_err(|e| RefreshFailure::Malformed { message: e.source.to_string() })?;

		if grant.access_token.expose().is_empty() {
			return Err(RefreshFailure::Malformed { message: "access_token is empty".into() });
		}

		Ok(grant)
	}

	async fn persist_grant(
		&self,
		mut grant: TokenGrant,
	) -> std::result::Result<TokenSecret, RefreshFailure> {
		let access_token = grant.access_token.clone();
		let stored = match grant.rotated_refresh() {
			Some(rotated) => {
				self.store
					.replace(CredentialPair {
						access_token: access_token.clone(),
						refresh_token: Some(rotated),
					})
					.await
			},
			None => self.store.set_access(access_token.clone()).await,
		};

		stored.map_err(|e| RefreshFailure::Storage { message: e.to_string() })?;

		Ok(access_token)
	}
}
