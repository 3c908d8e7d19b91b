//! Session lifecycle: login, explicit credential changes, and session-invalid events.

// std
use std::sync::atomic::Ordering;
// self
use crate::{
	_prelude::*,
	auth::{CredentialPair, TokenSecret},
	error::TransportError,
	gateway::{Gateway, refresh::TokenGrant},
	http::{ApiRequest, ApiResponse, ApiTransport, OutboundRequest},
	obs::{self, GatewayStage, StageOutcome, StageSpan},
};

/// Receives the "session invalid" signal raised when the gateway gives up on a session.
///
/// The signal carries no payload and fires once per terminal episode; a later login or
/// [`Gateway::set_credentials`] re-arms it. Any `Fn() + Send + Sync` closure is an observer.
pub trait SessionObserver
where
	Self: Send + Sync,
{
	/// Called after the stored credentials were cleared.
	fn session_invalidated(&self);
}
impl<F> SessionObserver for F
where
	F: Fn() + Send + Sync,
{
	fn session_invalidated(&self) {
		self()
	}
}

impl<T> Gateway<T>
where
	T: ?Sized + ApiTransport,
{
	/// Registers an observer for the session-invalid signal.
	pub fn with_session_observer(mut self, observer: impl SessionObserver + 'static) -> Self {
		self.observers.push(Arc::new(observer));

		self
	}

	/// Exchanges a username and password for a credential pair and stores it.
	///
	/// The refresh token is read from the response body, or from a `refresh_token` cookie
	/// when the body does not carry one.
	pub async fn login(&self, username: &str, password: &str) -> Result<CredentialPair> {
		const STAGE: GatewayStage = GatewayStage::Login;

		let span = StageSpan::new(STAGE, "login");

		obs::record_stage_outcome(STAGE, StageOutcome::Attempt);

		let result: Result<CredentialPair> = span
			.instrument(async move {
				let request = ApiRequest::post(self.descriptor.endpoints.login.as_str())
					.header("accept", "application/json")
					.form([
						("grant_type", "password"),
						("username", username),
						("password", password),
						("scope", ""),
					]);
				let outbound = OutboundRequest::prepare(&self.descriptor, &request, None)?;
				let response = self
					.transport
					.send(outbound)
					.await
					.map_err(|e| Error::from(TransportError::network(e)))?
					.error_for_status()?;
				let mut grant = response.json::<TokenGrant>()?;
				let refresh_token = grant.rotated_refresh().or_else(|| cookie_refresh_token(&response));
				let pair = CredentialPair { access_token: grant.access_token, refresh_token };

				self.set_credentials(pair.clone()).await?;

				Ok(pair)
			})
			.await;

		match &result {
			Ok(_) => obs::record_stage_outcome(STAGE, StageOutcome::Success),
			Err(_) => obs::record_stage_outcome(STAGE, StageOutcome::Failure),
		}

		result
	}

	/// Stores a credential pair obtained outside the gateway and re-arms the session event.
	pub async fn set_credentials(&self, pair: CredentialPair) -> Result<()> {
		self.store.replace(pair).await?;
		self.refresh_state.lock().rebase();
		self.session_live.store(true, Ordering::SeqCst);

		Ok(())
	}

	/// Clears stored credentials without raising the session-invalid signal.
	pub async fn logout(&self) -> Result<()> {
		self.store.clear().await?;
		self.refresh_state.lock().rebase();

		Ok(())
	}

	/// Returns `true` while an access token is stored.
	pub async fn is_authenticated(&self) -> Result<bool> {
		Ok(self.store.access().await?.is_some())
	}

	/// Ends the session for `error`: clears credentials and notifies observers.
	pub(crate) async fn invalidate_session(&self, error: Error) -> Error {
		let reason = match &error {
			Error::SessionExpired => "session_expired",
			Error::NoRefreshToken => "no_refresh_token",
			_ => "refresh_failed",
		};

		self.clear_credentials().await;
		self.notify_session_invalid(reason);

		error
	}

	/// Empties the store; a failing store is logged since the session ends either way.
	pub(crate) async fn clear_credentials(&self) {
		if let Err(e) = self.store.clear().await {
			obs::note_store_failure("clear", &e);
		}
	}

	/// Fires the session-invalid signal unless it already fired for this episode.
	pub(crate) fn notify_session_invalid(&self, reason: &'static str) {
		if !self.session_live.swap(false, Ordering::SeqCst) {
			return;
		}

		obs::note_session_invalidated(reason);
		obs::record_session_invalidated(reason);

		for observer in &self.observers {
			observer.session_invalidated();
		}
	}
}

fn cookie_refresh_token(response: &ApiResponse) -> Option<TokenSecret> {
	response.header_values("set-cookie").find_map(|cookie| {
		let (name, value) = cookie.split(';').next()?.split_once('=')?;
		let value = value.trim().trim_matches('"');

		(name.trim() == "refresh_token" && !value.is_empty()).then(|| TokenSecret::new(value))
	})
}
