//! Unauthenticated certificate lookup for the public certificate page.

// self
#[cfg(feature = "reqwest")] use crate::http::ReqwestTransport;
use crate::{
	_prelude::*,
	api::CertificateView,
	auth::CertificateId,
	error::TransportError,
	gateway::Gateway,
	http::{ApiRequest, ApiTransport, OutboundRequest},
	obs::{self, GatewayStage, StageOutcome, StageSpan},
	service::ServiceDescriptor,
};

/// Client for the public certificate view.
///
/// Requests never carry credentials and a `401` is returned as an ordinary
/// [`Error::Api`]; there is no session to recover.
pub struct PublicClient<T>
where
	T: ?Sized + ApiTransport,
{
	/// Transport used for every lookup.
	pub transport: Arc<T>,
	/// Service location.
	pub descriptor: ServiceDescriptor,
}
impl<T> PublicClient<T>
where
	T: ?Sized + ApiTransport,
{
	/// Creates a client over the caller-provided transport.
	pub fn with_transport(descriptor: ServiceDescriptor, transport: impl Into<Arc<T>>) -> Self {
		Self { transport: transport.into(), descriptor }
	}

	/// Fetches the public view of one certificate.
	pub async fn certificate(&self, id: &CertificateId) -> Result<CertificateView> {
		const STAGE: GatewayStage = GatewayStage::Public;

		let span = StageSpan::new(STAGE, "certificate");

		obs::record_stage_outcome(STAGE, StageOutcome::Attempt);

		let result: Result<CertificateView> = span
			.instrument(async move {
				let request = ApiRequest::get(format!("certificates/{id}"));
				let outbound = OutboundRequest::prepare(&self.descriptor, &request, None)?;
				let response = self
					.transport
					.send(outbound)
					.await
					.map_err(|e| Error::from(TransportError::network(e)))?
					.error_for_status()?;

				Ok(response.json()?)
			})
			.await;

		match &result {
			Ok(_) => obs::record_stage_outcome(STAGE, StageOutcome::Success),
			Err(_) => obs::record_stage_outcome(STAGE, StageOutcome::Failure),
		}

		result
	}
}
#[cfg(feature = "reqwest")]
impl PublicClient<ReqwestTransport> {
	/// Creates a client backed by a default reqwest client.
	pub fn new(descriptor: ServiceDescriptor) -> Self {
		Self::with_transport(descriptor, ReqwestTransport::default())
	}
}
impl<T> Clone for PublicClient<T>
where
	T: ?Sized + ApiTransport,
{
	fn clone(&self) -> Self {
		Self { transport: self.transport.clone(), descriptor: self.descriptor.clone() }
	}
}
impl<T> Debug for PublicClient<T>
where
	T: ?Sized + ApiTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("PublicClient").field("descriptor", &self.descriptor).finish()
	}
}
impl<T> From<&Gateway<T>> for PublicClient<T>
where
	T: ?Sized + ApiTransport,
{
	fn from(gateway: &Gateway<T>) -> Self {
		Self { transport: gateway.transport.clone(), descriptor: gateway.descriptor.clone() }
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{
		api::CertificateStatus, auth::CredentialPair, gateway::tests::fixed_gateway,
		http::ApiResponse,
	};

	const VIEW: &str = r#"{"amount":700.0,"code":"GIFT-0042","description":"Spa day",
		"status":"ACTIVE","created_at":"2025-01-10","used_at":null,"period":30,"name":null,
		"last_name":null,"phone":"+7999***0000"}"#;

	#[tokio::test]
	async fn lookup_never_sends_credentials() {
		let (gateway, _) =
			fixed_gateway(ApiResponse::new(200, VIEW), Some(CredentialPair::new("a1", "r1")));
		let client = PublicClient::from(&gateway);
		let id = CertificateId::new("01HZX3K7Q8M2N4P6R8T0V2W4Y6").expect("Fixture id should be valid.");
		let view = client.certificate(&id).await.expect("Public lookup should succeed.");

		assert_eq!(view.status, CertificateStatus::Active);
		assert_eq!(view.amount, 700.);

		let recorded = gateway.transport.recorded();

		assert_eq!(recorded[0].header("authorization"), None);
		assert_eq!(
			recorded[0].url.as_str(),
			"http://desk.test/api/v1/certificates/01HZX3K7Q8M2N4P6R8T0V2W4Y6"
		);
	}

	#[tokio::test]
	async fn missing_certificate_is_an_api_error() {
		let (gateway, _) = fixed_gateway(
			ApiResponse::new(404, "{\"detail\":\"Certificate with id X not found\"}"),
			None,
		);
		let client = PublicClient::from(&gateway);
		let id = CertificateId::new("X").expect("Fixture id should be valid.");
		let err = client.certificate(&id).await.expect_err("A 404 should fail.");

		assert_eq!(err.status(), Some(404));
	}
}
