//! Client-level error types shared across the gateway, stores, and typed API helpers.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical client error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Credential store failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Response body could not be decoded into the expected shape.
	#[error(transparent)]
	Decode(#[from] DecodeError),

	/// The service answered with a non-success status.
	#[error("Service responded with HTTP {status}: {detail}.")]
	Api {
		/// HTTP status code.
		status: u16,
		/// Service-supplied detail message, or a body preview.
		detail: String,
	},
	/// Caller-supplied input was rejected before contacting the service.
	#[error("Invalid input: {reason}.")]
	InvalidInput {
		/// Why the input was rejected.
		reason: String,
	},

	/// A request that was already replayed after a refresh was rejected again.
	#[error("Session expired; the replayed request was still unauthorized.")]
	SessionExpired,
	/// No refresh token is stored, so the rejected request cannot be recovered.
	#[error("Session expired; no refresh token is available.")]
	NoRefreshToken,
	/// The refresh exchange failed.
	#[error("Session expired; token refresh failed.")]
	RefreshFailed(#[source] RefreshFailure),
}
impl Error {
	/// Returns `true` for the kinds that end the current session.
	///
	/// Stored credentials are already cleared when one of these surfaces, so callers should
	/// route the user back to re-authentication.
	pub fn is_session_terminal(&self) -> bool {
		matches!(self, Self::SessionExpired | Self::NoRefreshToken | Self::RefreshFailed(_))
	}

	/// Returns the HTTP status carried by [`Error::Api`], if any.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Api { status, .. } => Some(*status),
			Self::RefreshFailed(RefreshFailure::Rejected { status, .. }) => Some(*status),
			_ => None,
		}
	}
}

/// Why a refresh exchange failed.
///
/// The value is shared with every request coalesced onto the same exchange, hence `Clone`.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum RefreshFailure {
	/// The refresh endpoint returned a non-success status.
	#[error("Refresh endpoint rejected the exchange with HTTP {status}: {detail}.")]
	Rejected {
		/// HTTP status code.
		status: u16,
		/// Service-supplied detail message.
		detail: String,
	},
	/// The refresh endpoint could not be reached.
	#[error("Refresh endpoint is unreachable: {message}.")]
	Unreachable {
		/// Transport error rendered as text.
		message: String,
	},
	/// The refresh endpoint answered with an unexpected body.
	#[error("Refresh endpoint returned a malformed body: {message}.")]
	Malformed {
		/// Decoder error rendered as text.
		message: String,
	},
	/// The new access token could not be persisted.
	#[error("Refreshed token could not be stored: {message}.")]
	Storage {
		/// Store error rendered as text.
		message: String,
	},
}

/// Configuration and validation failures raised by the client.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Service descriptor failed validation.
	#[error(transparent)]
	Descriptor(#[from] crate::service::ServiceDescriptorError),
	/// A request path could not be resolved against the base URL.
	#[error("Request path `{path}` cannot be resolved against the base URL.")]
	InvalidPath {
		/// Offending request path.
		path: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// A request body could not be encoded.
	#[error("Request body could not be encoded as JSON.")]
	RequestEncode(#[source] serde_json::Error),
	/// Certificate identifier validation failed.
	#[error(transparent)]
	Identifier(#[from] crate::auth::IdentifierError),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Response decoding failures.
#[derive(Debug, ThisError)]
#[error("Response body from HTTP {status} could not be decoded.")]
pub struct DecodeError {
	/// HTTP status code of the decoded response.
	pub status: u16,
	/// Structured parsing failure, including the JSON path that failed.
	#[source]
	pub source: serde_path_to_error::Error<serde_json::Error>,
}

/// Transport-level failures.
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the service.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn session_kinds_are_terminal() {
		assert!(Error::SessionExpired.is_session_terminal());
		assert!(Error::NoRefreshToken.is_session_terminal());
		assert!(
			Error::RefreshFailed(RefreshFailure::Unreachable { message: "refused".into() })
				.is_session_terminal()
		);
		assert!(!Error::Api { status: 500, detail: "boom".into() }.is_session_terminal());
	}

	#[test]
	fn refresh_failure_is_exposed_as_source() {
		let failure = RefreshFailure::Rejected { status: 401, detail: "Invalid refresh token".into() };
		let error = Error::RefreshFailed(failure.clone());
		let source = StdError::source(&error).expect("RefreshFailed should expose its failure.");

		assert_eq!(source.to_string(), failure.to_string());
		assert_eq!(error.status(), Some(401));
	}
}
