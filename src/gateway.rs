//! Authenticated request gateway.
//!
//! [`Gateway::execute`] attaches the stored access token to every request. When the
//! service answers `401 Unauthorized`, the gateway runs a single refresh exchange shared by
//! every request that hits the same condition while it is in flight, then replays each of
//! them once with the new token. Terminal failures clear the credential store and notify the
//! registered [`SessionObserver`]s exactly once per episode.

pub mod refresh;
pub mod session;

pub use refresh::RefreshMetrics;
pub use session::SessionObserver;

// std
use std::sync::atomic::AtomicBool;
// self
#[cfg(feature = "reqwest")] use crate::http::ReqwestTransport;
use crate::{
	_prelude::*,
	auth::TokenSecret,
	error::TransportError,
	gateway::refresh::RefreshState,
	http::{ApiRequest, ApiResponse, ApiTransport, OutboundRequest},
	obs::{self, GatewayStage, StageOutcome, StageSpan},
	service::ServiceDescriptor,
	store::CredentialStore,
};

#[cfg(feature = "reqwest")]
/// Gateway specialized for the crate's default reqwest transport.
pub type ReqwestGateway = Gateway<ReqwestTransport>;

/// Sends requests to the certificate service on behalf of one client session.
///
/// Cloned handles share the transport, the credential store, the refresh state, and the
/// observers, so a refresh started through one handle coalesces requests from all of them.
pub struct Gateway<T>
where
	T: ?Sized + ApiTransport,
{
	/// Transport used for every outbound request.
	pub transport: Arc<T>,
	/// Store holding the session's access and refresh tokens.
	pub store: Arc<dyn CredentialStore>,
	/// Service location and auth endpoint paths.
	pub descriptor: ServiceDescriptor,
	/// Shared counters for refresh exchanges.
	pub refresh_metrics: Arc<RefreshMetrics>,
	observers: Vec<Arc<dyn SessionObserver>>,
	refresh_state: Arc<Mutex<RefreshState>>,
	session_live: Arc<AtomicBool>,
}
impl<T> Gateway<T>
where
	T: ?Sized + ApiTransport,
{
	/// Creates a gateway over the caller-provided transport.
	pub fn with_transport(
		store: Arc<dyn CredentialStore>,
		descriptor: ServiceDescriptor,
		transport: impl Into<Arc<T>>,
	) -> Self {
		Self {
			transport: transport.into(),
			store,
			descriptor,
			refresh_metrics: Default::default(),
			observers: Vec::new(),
			refresh_state: Default::default(),
			session_live: Arc::new(AtomicBool::new(true)),
		}
	}

	/// Sends `request` with the current access token, recovering from token expiry.
	///
	/// Responses other than `401` are returned unchanged, whatever their status. A `401`
	/// triggers (or joins) a refresh exchange and one replay; the session-ending kinds are
	/// [`Error::SessionExpired`], [`Error::NoRefreshToken`], and [`Error::RefreshFailed`].
	pub async fn execute(&self, request: ApiRequest) -> Result<ApiResponse> {
		const STAGE: GatewayStage = GatewayStage::Request;

		let span = StageSpan::new(STAGE, "execute");

		obs::record_stage_outcome(STAGE, StageOutcome::Attempt);

		let result: Result<ApiResponse> = span
			.instrument(async move {
				let mut attempt = self.attempt(request);
				let mut bearer = self.store.access().await?;

				loop {
					let response = self.dispatch(&attempt, bearer.as_ref()).await?;

					if !response.is_unauthorized() {
						return Ok(response);
					}

					bearer = Some(self.recover(&mut attempt).await?);
				}
			})
			.await;

		match &result {
			Ok(_) => obs::record_stage_outcome(STAGE, StageOutcome::Success),
			Err(_) => obs::record_stage_outcome(STAGE, StageOutcome::Failure),
		}

		result
	}

	async fn dispatch(&self, attempt: &Attempt, bearer: Option<&TokenSecret>) -> Result<ApiResponse> {
		let outbound = OutboundRequest::prepare(&self.descriptor, &attempt.request, bearer)?;

		self.transport.send(outbound).await.map_err(|e| Error::from(TransportError::network(e)))
	}

	fn attempt(&self, request: ApiRequest) -> Attempt {
		let state = self.refresh_state.lock();

		Attempt { request, retried: false, epoch: state.epoch(), settled: state.settled() }
	}
}
#[cfg(feature = "reqwest")]
impl Gateway<ReqwestTransport> {
	/// Creates a gateway backed by a default reqwest client.
	pub fn new(store: Arc<dyn CredentialStore>, descriptor: ServiceDescriptor) -> Self {
		Self::with_transport(store, descriptor, ReqwestTransport::default())
	}
}
impl<T> Clone for Gateway<T>
where
	T: ?Sized + ApiTransport,
{
	fn clone(&self) -> Self {
		Self {
			transport: self.transport.clone(),
			store: self.store.clone(),
			descriptor: self.descriptor.clone(),
			refresh_metrics: self.refresh_metrics.clone(),
			observers: self.observers.clone(),
			refresh_state: self.refresh_state.clone(),
			session_live: self.session_live.clone(),
		}
	}
}
impl<T> Debug for Gateway<T>
where
	T: ?Sized + ApiTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Gateway")
			.field("descriptor", &self.descriptor)
			.field("observers", &self.observers.len())
			.field("refresh_metrics", &self.refresh_metrics)
			.finish()
	}
}

/// One request travelling through the gateway, with its replay marker.
///
/// The caller's [`ApiRequest`] is carried by value and never rewritten; the bearer token
/// is attached per dispatch.
#[derive(Clone, Debug)]
pub(crate) struct Attempt {
	pub(crate) request: ApiRequest,
	/// Set once the request has been handed a refreshed token.
	pub(crate) retried: bool,
	/// Refresh epoch observed before the first dispatch.
	pub(crate) epoch: u64,
	/// Count of ended exchanges observed before the first dispatch.
	pub(crate) settled: u64,
}
