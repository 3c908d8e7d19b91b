//! Credential store contract and built-in backends.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::{
	_prelude::*,
	auth::{CredentialPair, TokenSecret},
};

/// Boxed future returned by [`CredentialStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Storage backend holding the access and refresh tokens of one client session.
///
/// The gateway is the only writer apart from explicit login and logout actions.
pub trait CredentialStore
where
	Self: Send + Sync,
{
	/// Returns the current access token, if present.
	fn access(&self) -> StoreFuture<'_, Option<TokenSecret>>;

	/// Replaces the access token while keeping the refresh token.
	fn set_access(&self, token: TokenSecret) -> StoreFuture<'_, ()>;

	/// Returns the current refresh token, if present.
	fn refresh(&self) -> StoreFuture<'_, Option<TokenSecret>>;

	/// Replaces both tokens; a pair without a refresh token removes the stored one.
	fn replace(&self, pair: CredentialPair) -> StoreFuture<'_, ()>;

	/// Removes both tokens.
	fn clear(&self) -> StoreFuture<'_, ()>;
}

/// Error type produced by [`CredentialStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

/// Token slots persisted by the built-in stores, keyed like the browser storage entries.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialSlots {
	/// Access token slot.
	#[serde(rename = "jwt_token", default, skip_serializing_if = "Option::is_none")]
	pub access: Option<TokenSecret>,
	/// Refresh token slot.
	#[serde(rename = "refresh_token", default, skip_serializing_if = "Option::is_none")]
	pub refresh: Option<TokenSecret>,
}
impl CredentialSlots {
	/// Overwrites both slots with the provided pair.
	pub fn replace(&mut self, pair: CredentialPair) {
		self.access = Some(pair.access_token);
		self.refresh = pair.refresh_token;
	}

	/// Empties both slots.
	pub fn clear(&mut self) {
		self.access = None;
		self.refresh = None;
	}

	/// Returns `true` when neither slot holds a token.
	pub fn is_empty(&self) -> bool {
		self.access.is_none() && self.refresh.is_none()
	}
}
