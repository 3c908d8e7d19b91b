//! Transport primitives for calls to the certificate service.
//!
//! [`ApiRequest`] is what callers describe (method, relative path, query, body);
//! [`OutboundRequest`] is what a transport actually sends once the gateway has resolved
//! the path and attached credentials. Custom transports implement [`ApiTransport`];
//! the crate ships [`ReqwestTransport`] behind the default `reqwest` feature.

// crates.io
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	error::{ConfigError, DecodeError},
	service::ServiceDescriptor,
};

/// Boxed future returned by [`ApiTransport::send`].
pub type TransportFuture<'a, E> =
	Pin<Box<dyn Future<Output = Result<ApiResponse, E>> + 'a + Send>>;

/// Abstraction over HTTP stacks capable of delivering [`OutboundRequest`]s.
///
/// Implementations must be `Send + Sync + 'static` so a single transport can be shared by
/// every cloned gateway handle, and the futures they return must be `Send` so gateway calls
/// can move across executor threads.
pub trait ApiTransport
where
	Self: 'static + Send + Sync,
{
	/// Concrete error emitted by the underlying transport.
	type TransportError: 'static + Send + Sync + StdError;

	/// Sends the request and returns the raw response, whatever its status.
	fn send(&self, request: OutboundRequest) -> TransportFuture<'_, Self::TransportError>;
}

/// HTTP methods used by the service.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Method {
	/// `GET`
	Get,
	/// `POST`
	Post,
	/// `PATCH`
	Patch,
}
impl Method {
	/// Returns the canonical method token.
	pub const fn as_str(self) -> &'static str {
		match self {
			Method::Get => "GET",
			Method::Post => "POST",
			Method::Patch => "PATCH",
		}
	}
}
impl Display for Method {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Encoded request payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RequestBody {
	/// Pre-encoded JSON document.
	Json(Vec<u8>),
	/// `application/x-www-form-urlencoded` pairs.
	Form(Vec<(String, String)>),
}
impl RequestBody {
	/// Value for the `Content-Type` header.
	pub const fn content_type(&self) -> &'static str {
		match self {
			RequestBody::Json(_) => "application/json",
			RequestBody::Form(_) => "application/x-www-form-urlencoded",
		}
	}

	/// Encodes the payload into wire bytes.
	pub fn to_bytes(&self) -> Vec<u8> {
		match self {
			RequestBody::Json(bytes) => bytes.clone(),
			RequestBody::Form(pairs) => url::form_urlencoded::Serializer::new(String::new())
				.extend_pairs(pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
				.finish()
				.into_bytes(),
		}
	}
}

/// Caller-facing request description; paths are relative to the service base URL.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiRequest {
	/// HTTP method.
	pub method: Method,
	/// Path relative to [`ServiceDescriptor::base_url`].
	pub path: String,
	/// Query parameters appended in order.
	pub query: Vec<(String, String)>,
	/// Extra headers, names compared case-insensitively.
	pub headers: Vec<(String, String)>,
	/// Optional payload.
	pub body: Option<RequestBody>,
}
impl ApiRequest {
	/// Creates a request without query, headers, or body.
	pub fn new(method: Method, path: impl Into<String>) -> Self {
		Self { method, path: path.into(), query: Vec::new(), headers: Vec::new(), body: None }
	}

	/// Shorthand for a `GET` request.
	pub fn get(path: impl Into<String>) -> Self {
		Self::new(Method::Get, path)
	}

	/// Shorthand for a `POST` request.
	pub fn post(path: impl Into<String>) -> Self {
		Self::new(Method::Post, path)
	}

	/// Shorthand for a `PATCH` request.
	pub fn patch(path: impl Into<String>) -> Self {
		Self::new(Method::Patch, path)
	}

	/// Appends a query parameter.
	pub fn query(mut self, name: impl Into<String>, value: impl ToString) -> Self {
		self.query.push((name.into(), value.to_string()));

		self
	}

	/// Appends several query parameters.
	pub fn query_pairs<I>(mut self, pairs: I) -> Self
	where
		I: IntoIterator<Item = (String, String)>,
	{
		self.query.extend(pairs);

		self
	}

	/// Adds a header.
	pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.push((name.into(), value.into()));

		self
	}

	/// Serializes `payload` as the JSON body.
	pub fn json<T>(mut self, payload: &T) -> Result<Self, ConfigError>
	where
		T: ?Sized + Serialize,
	{
		let bytes = serde_json::to_vec(payload).map_err(ConfigError::RequestEncode)?;

		self.body = Some(RequestBody::Json(bytes));

		Ok(self)
	}

	/// Sets a form-encoded body.
	pub fn form<I, K, V>(mut self, pairs: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		self.body =
			Some(RequestBody::Form(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect()));

		self
	}
}

/// Fully resolved request handed to an [`ApiTransport`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutboundRequest {
	/// HTTP method.
	pub method: Method,
	/// Absolute URL including the query string.
	pub url: Url,
	/// Headers to send.
	pub headers: Vec<(String, String)>,
	/// Optional payload.
	pub body: Option<RequestBody>,
}
impl OutboundRequest {
	/// Resolves `request` against the descriptor and attaches `bearer` when present.
	///
	/// The caller's request is left untouched; a caller-supplied `Authorization` header is
	/// only replaced when a bearer token is attached.
	pub fn prepare(
		descriptor: &ServiceDescriptor,
		request: &ApiRequest,
		bearer: Option<&TokenSecret>,
	) -> Result<Self, ConfigError> {
		let mut url = descriptor.resolve(&request.path)?;

		if !request.query.is_empty() {
			url.query_pairs_mut()
				.extend_pairs(request.query.iter().map(|(k, v)| (k.as_str(), v.as_str())));
		}

		let mut headers = request.headers.clone();

		if let Some(token) = bearer {
			headers.retain(|(name, _)| !name.eq_ignore_ascii_case("authorization"));
			headers.push(("authorization".into(), token.bearer()));
		}

		Ok(Self { method: request.method, url, headers, body: request.body.clone() })
	}

	/// Returns the first value of the named header.
	pub fn header(&self, name: &str) -> Option<&str> {
		find_header(&self.headers, name)
	}
}

/// Raw response returned by a transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiResponse {
	/// HTTP status code.
	pub status: u16,
	/// Response headers in arrival order; names are lowercase.
	pub headers: Vec<(String, String)>,
	/// Response body bytes.
	pub body: Vec<u8>,
}
impl ApiResponse {
	const DETAIL_PREVIEW_LEN: usize = 200;

	/// Creates a response with the given status and body and no headers.
	pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
		Self { status, headers: Vec::new(), body: body.into() }
	}

	/// Adds a header; the name is lowercased.
	pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
		self.headers.push((name.to_ascii_lowercase(), value.into()));

		self
	}

	/// Returns `true` for 2xx statuses.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}

	/// Returns `true` for `401 Unauthorized`.
	pub fn is_unauthorized(&self) -> bool {
		self.status == 401
	}

	/// Returns the first value of the named header.
	pub fn header(&self, name: &str) -> Option<&str> {
		find_header(&self.headers, name)
	}

	/// Iterates over every value of the named header.
	pub fn header_values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
		self.headers
			.iter()
			.filter(move |(key, _)| key.eq_ignore_ascii_case(name))
			.map(|(_, value)| value.as_str())
	}

	/// Decodes the body as JSON, reporting the failing path on error.
	pub fn json<T>(&self) -> Result<T, DecodeError>
	where
		T: DeserializeOwned,
	{
		let mut deserializer = serde_json::Deserializer::from_slice(&self.body);

		serde_path_to_error::deserialize(&mut deserializer)
			.map_err(|source| DecodeError { status: self.status, source })
	}

	/// Extracts a human-readable error detail.
	///
	/// The service reports errors as `{"detail": ...}`; string details are returned as-is,
	/// structured ones (validation errors) as compact JSON. Other bodies fall back to a
	/// truncated preview.
	pub fn detail(&self) -> String {
		#[derive(Deserialize)]
		struct ErrorBody {
			detail: serde_json::Value,
		}

		if let Ok(ErrorBody { detail }) = serde_json::from_slice::<ErrorBody>(&self.body) {
			return match detail {
				serde_json::Value::String(message) => message,
				other => other.to_string(),
			};
		}

		let text = String::from_utf8_lossy(&self.body);
		let text = text.trim();

		if text.is_empty() {
			return format!("HTTP {}", self.status);
		}

		text.chars().take(Self::DETAIL_PREVIEW_LEN).collect()
	}

	/// Converts non-2xx responses into [`Error::Api`].
	pub fn error_for_status(self) -> Result<Self> {
		if self.is_success() {
			Ok(self)
		} else {
			Err(Error::Api { status: self.status, detail: self.detail() })
		}
	}
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
	headers.iter().find(|(key, _)| key.eq_ignore_ascii_case(name)).map(|(_, value)| value.as_str())
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// Service calls should not follow redirects silently; configure any custom client passed
/// to [`ReqwestTransport::with_client`] accordingly.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds a transport whose client never follows redirects.
	pub fn no_redirects() -> Result<Self, ConfigError> {
		let client = ReqwestClient::builder().redirect(reqwest::redirect::Policy::none()).build()?;

		Ok(Self(client))
	}

	fn method(method: Method) -> reqwest::Method {
		match method {
			Method::Get => reqwest::Method::GET,
			Method::Post => reqwest::Method::POST,
			Method::Patch => reqwest::Method::PATCH,
		}
	}
}
#[cfg(feature = "reqwest")]
impl ApiTransport for ReqwestTransport {
	type TransportError = ReqwestError;

	fn send(&self, request: OutboundRequest) -> TransportFuture<'_, Self::TransportError> {
		Box::pin(async move {
			let mut builder = self.0.request(Self::method(request.method), request.url);

			for (name, value) in &request.headers {
				builder = builder.header(name.as_str(), value.as_str());
			}

			if let Some(body) = request.body {
				builder = builder
					.header(reqwest::header::CONTENT_TYPE, body.content_type())
					.body(body.to_bytes());
			}

			let response = builder.send().await?;
			let status = response.status().as_u16();
			let headers = response
				.headers()
				.iter()
				.filter_map(|(name, value)| {
					value.to_str().ok().map(|value| (name.as_str().to_owned(), value.to_owned()))
				})
				.collect();
			let body = response.bytes().await?.to_vec();

			Ok(ApiResponse { status, headers, body })
		})
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn descriptor() -> ServiceDescriptor {
		ServiceDescriptor::from_env_value(Some("https://desk.example.com/api/v1/"))
			.expect("Descriptor fixture should build.")
	}

	#[test]
	fn prepare_attaches_bearer_and_query_without_mutating_request() {
		let request = ApiRequest::post("/certificates/charge/01HZX")
			.query("confirm_code", "1234")
			.header("Authorization", "Bearer caller-supplied");
		let token = TokenSecret::new("access-1");
		let outbound = OutboundRequest::prepare(&descriptor(), &request, Some(&token))
			.expect("Request should resolve.");

		assert_eq!(
			outbound.url.as_str(),
			"https://desk.example.com/api/v1/certificates/charge/01HZX?confirm_code=1234"
		);
		assert_eq!(outbound.header("AUTHORIZATION"), Some("Bearer access-1"));
		assert_eq!(outbound.headers.len(), 1);
		assert_eq!(request.headers[0].1, "Bearer caller-supplied");
	}

	#[test]
	fn prepare_without_bearer_sends_no_authorization() {
		let outbound =
			OutboundRequest::prepare(&descriptor(), &ApiRequest::get("certificates/01HZX"), None)
				.expect("Request should resolve.");

		assert_eq!(outbound.header("authorization"), None);
		assert_eq!(outbound.url.query(), None);
	}

	#[test]
	fn form_body_is_url_encoded() {
		let request = ApiRequest::post("auth/jwt/login").form([
			("grant_type", "password"),
			("username", "desk admin"),
			("scope", ""),
		]);
		let body = request.body.expect("Form body should be set.");

		assert_eq!(body.content_type(), "application/x-www-form-urlencoded");
		assert_eq!(body.to_bytes(), b"grant_type=password&username=desk+admin&scope=".to_vec());
	}

	#[test]
	fn detail_prefers_service_error_body() {
		let response = ApiResponse::new(404, "{\"detail\":\"Certificate with id X not found\"}");

		assert_eq!(response.detail(), "Certificate with id X not found");

		let response = ApiResponse::new(422, "{\"detail\":[{\"loc\":[\"query\"],\"msg\":\"bad\"}]}");

		assert_eq!(response.detail(), "[{\"loc\":[\"query\"],\"msg\":\"bad\"}]");
		assert_eq!(ApiResponse::new(502, "").detail(), "HTTP 502");

		let err = ApiResponse::new(400, "{\"detail\":\"Only ACTIVE certificates can be charged\"}")
			.error_for_status()
			.expect_err("Non-success statuses should become errors.");

		assert!(matches!(err, Error::Api { status: 400, .. }));
	}

	#[test]
	fn json_decode_reports_path() {
		#[derive(Debug, Deserialize)]
		struct Payload {
			#[allow(dead_code)]
			amount: f64,
		}

		let err = ApiResponse::new(200, "{\"amount\":\"lots\"}")
			.json::<Payload>()
			.expect_err("Mistyped fields should fail to decode.");

		assert_eq!(err.status, 200);
		assert_eq!(err.source.path().to_string(), "amount");
	}
}
