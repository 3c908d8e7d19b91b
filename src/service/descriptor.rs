//! Validated service metadata shared by the gateway and the public client.

/// Builder API for assembling service descriptors.
pub mod builder;

pub use builder::*;

// std
use std::env;
// self
use crate::{_prelude::*, error::ConfigError};

/// Relative auth endpoint paths exposed by the service.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceEndpoints {
	/// Password login endpoint.
	pub login: String,
	/// Refresh-token exchange endpoint.
	pub refresh: String,
}
impl Default for ServiceEndpoints {
	fn default() -> Self {
		Self {
			login: ServiceDescriptor::DEFAULT_LOGIN_PATH.into(),
			refresh: ServiceDescriptor::DEFAULT_REFRESH_PATH.into(),
		}
	}
}

/// Immutable service descriptor consumed by the gateway.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDescriptor {
	/// Base URL every request path is resolved against; always ends with `/`.
	pub base_url: Url,
	/// Auth endpoint paths relative to [`ServiceDescriptor::base_url`].
	pub endpoints: ServiceEndpoints,
}
impl ServiceDescriptor {
	/// Environment variable consulted by [`ServiceDescriptor::from_env`].
	pub const BASE_URL_ENV: &'static str = "CERTDESK_API_URL";
	/// Base URL used when the environment does not provide a usable value.
	pub const DEFAULT_BASE_URL: &'static str = "http://localhost:8000/api/v1/";
	/// Default password login path.
	pub const DEFAULT_LOGIN_PATH: &'static str = "auth/jwt/login";
	/// Default refresh exchange path.
	pub const DEFAULT_REFRESH_PATH: &'static str = "auth/jwt/refresh";

	/// Creates a new builder for the provided base URL.
	pub fn builder(base_url: Url) -> ServiceDescriptorBuilder {
		ServiceDescriptorBuilder::new(base_url)
	}

	/// Builds a descriptor from [`ServiceDescriptor::BASE_URL_ENV`].
	pub fn from_env() -> Result<Self, ServiceDescriptorError> {
		Self::from_env_value(env::var(Self::BASE_URL_ENV).ok().as_deref())
	}

	/// Builds a descriptor from a raw base URL setting.
	///
	/// Blank values and the literal strings `undefined` and `null` (what templated deploy
	/// configs leave behind) select [`ServiceDescriptor::DEFAULT_BASE_URL`].
	pub fn from_env_value(raw: Option<&str>) -> Result<Self, ServiceDescriptorError> {
		let value = raw
			.map(str::trim)
			.filter(|v| !v.is_empty() && *v != "undefined" && *v != "null")
			.unwrap_or(Self::DEFAULT_BASE_URL);
		let base_url = Url::parse(value).map_err(|source| ServiceDescriptorError::InvalidBaseUrl {
			value: value.to_owned(),
			reason: source.to_string(),
		})?;

		Self::builder(base_url).build()
	}

	/// Resolves a request path against the base URL.
	///
	/// Leading slashes are ignored so `/certificates/` and `certificates/` both stay under
	/// the base path.
	pub fn resolve(&self, path: &str) -> Result<Url, ConfigError> {
		let relative = path.trim_start_matches('/');

		self.base_url
			.join(relative)
			.map_err(|source| ConfigError::InvalidPath { path: path.to_owned(), source })
	}

	/// Absolute URL of the login endpoint.
	pub fn login_url(&self) -> Result<Url, ConfigError> {
		self.resolve(&self.endpoints.login)
	}

	/// Absolute URL of the refresh endpoint.
	pub fn refresh_url(&self) -> Result<Url, ConfigError> {
		self.resolve(&self.endpoints.refresh)
	}
}
