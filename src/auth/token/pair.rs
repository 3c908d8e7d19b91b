//! Access/refresh credential pair issued by login and refresh exchanges.

// self
use crate::{_prelude::*, auth::TokenSecret};

/// The credentials of one client session.
///
/// A pair without a refresh token is usable until the access token is rejected; the
/// gateway then ends the session instead of attempting a refresh.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialPair {
	/// Short-lived bearer credential attached to every outbound request.
	#[serde(rename = "jwt_token")]
	pub access_token: TokenSecret,
	/// Longer-lived credential exchanged for a new access token.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub refresh_token: Option<TokenSecret>,
}
impl CredentialPair {
	/// Creates a pair carrying both tokens.
	pub fn new(access_token: impl Into<TokenSecret>, refresh_token: impl Into<TokenSecret>) -> Self {
		Self { access_token: access_token.into(), refresh_token: Some(refresh_token.into()) }
	}

	/// Creates a pair that cannot be refreshed.
	pub fn access_only(access_token: impl Into<TokenSecret>) -> Self {
		Self { access_token: access_token.into(), refresh_token: None }
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn pair_serializes_with_storage_keys() {
		let pair = CredentialPair::new("access-1", "refresh-1");
		let payload = serde_json::to_string(&pair).expect("Pair should serialize.");

		assert_eq!(payload, "{\"jwt_token\":\"access-1\",\"refresh_token\":\"refresh-1\"}");

		let access_only: CredentialPair =
			serde_json::from_str("{\"jwt_token\":\"access-2\"}").expect("Pair should deserialize.");

		assert_eq!(access_only, CredentialPair::access_only("access-2"));
		assert!(!format!("{access_only:?}").contains("access-2"));
	}
}
