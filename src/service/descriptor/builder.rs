// self
use crate::{
	_prelude::*,
	service::{ServiceDescriptor, ServiceEndpoints},
};

/// Errors raised while constructing or validating descriptors.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ServiceDescriptorError {
	/// The configured base URL could not be parsed.
	#[error("Base URL `{value}` is invalid: {reason}.")]
	InvalidBaseUrl {
		/// Raw configured value.
		value: String,
		/// Parser message.
		reason: String,
	},
	/// The base URL uses a scheme other than HTTP(S).
	#[error("Base URL must use http or https, got `{scheme}`.")]
	UnsupportedScheme {
		/// Offending scheme.
		scheme: String,
	},
	/// HTTPS was required but the base URL is plain HTTP.
	#[error("Base URL must use HTTPS: {url}.")]
	InsecureBaseUrl {
		/// Base URL that failed validation.
		url: String,
	},
	/// The base URL carries a query or fragment that joined paths would drop.
	#[error("Base URL must not carry a query or fragment: {url}.")]
	BaseUrlHasQuery {
		/// Base URL that failed validation.
		url: String,
	},
	/// An endpoint path is empty or absolute.
	#[error("The {endpoint} endpoint path must be relative and non-empty, got `{path}`.")]
	InvalidEndpointPath {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Path that failed validation.
		path: String,
	},
}

/// Builder for [`ServiceDescriptor`] values.
#[derive(Debug)]
pub struct ServiceDescriptorBuilder {
	/// Base URL of the service API.
	pub base_url: Url,
	/// Auth endpoint paths.
	pub endpoints: ServiceEndpoints,
	/// Rejects plain-HTTP base URLs when set.
	pub require_https: bool,
}
impl ServiceDescriptorBuilder {
	/// Creates a new builder with the default auth endpoint paths.
	pub fn new(base_url: Url) -> Self {
		Self { base_url, endpoints: ServiceEndpoints::default(), require_https: false }
	}

	/// Overrides the password login path.
	pub fn login_path(mut self, path: impl Into<String>) -> Self {
		self.endpoints.login = path.into();

		self
	}

	/// Overrides the refresh exchange path.
	pub fn refresh_path(mut self, path: impl Into<String>) -> Self {
		self.endpoints.refresh = path.into();

		self
	}

	/// Requires the base URL to use HTTPS.
	pub fn require_https(mut self, required: bool) -> Self {
		self.require_https = required;

		self
	}

	/// Consumes the builder and validates the resulting descriptor.
	pub fn build(self) -> Result<ServiceDescriptor, ServiceDescriptorError> {
		let mut base_url = self.base_url;

		validate_base_url(&base_url, self.require_https)?;

		if !base_url.path().ends_with('/') {
			let path = format!("{}/", base_url.path());

			base_url.set_path(&path);
		}

		validate_endpoint_path("login", &self.endpoints.login)?;
		validate_endpoint_path("refresh", &self.endpoints.refresh)?;

		Ok(ServiceDescriptor { base_url, endpoints: self.endpoints })
	}
}

fn validate_base_url(url: &Url, require_https: bool) -> Result<(), ServiceDescriptorError> {
	match url.scheme() {
		"https" => {},
		"http" if require_https =>
			return Err(ServiceDescriptorError::InsecureBaseUrl { url: url.to_string() }),
		"http" => {},
		other => return Err(ServiceDescriptorError::UnsupportedScheme { scheme: other.into() }),
	}

	if url.query().is_some() || url.fragment().is_some() {
		return Err(ServiceDescriptorError::BaseUrlHasQuery { url: url.to_string() });
	}

	Ok(())
}

fn validate_endpoint_path(endpoint: &'static str, path: &str) -> Result<(), ServiceDescriptorError> {
	let trimmed = path.trim_start_matches('/');

	if trimmed.is_empty() || path.starts_with("//") || path.contains("://") {
		Err(ServiceDescriptorError::InvalidEndpointPath { endpoint, path: path.to_owned() })
	} else {
		Ok(())
	}
}
