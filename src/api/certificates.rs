//! Authenticated certificate endpoints.

// crates.io
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	api::{
		Certificate, CertificateFilter, CertificateUpdate, CertificateView, NewCertificate,
		TelegramMessage,
	},
	auth::CertificateId,
	gateway::Gateway,
	http::{ApiRequest, ApiTransport},
};

const COLLECTION: &str = "certificates/";

/// Certificate operations bound to a [`Gateway`]; obtained from [`Gateway::certificates`].
///
/// Non-2xx answers become [`Error::Api`] carrying the service's `detail` message.
pub struct CertificatesApi<'a, T>
where
	T: ?Sized + ApiTransport,
{
	gateway: &'a Gateway<T>,
}
impl<'a, T> CertificatesApi<'a, T>
where
	T: ?Sized + ApiTransport,
{
	pub(crate) fn new(gateway: &'a Gateway<T>) -> Self {
		Self { gateway }
	}

	/// Lists certificates matching `filter`.
	pub async fn list(&self, filter: &CertificateFilter) -> Result<Vec<Certificate>> {
		self.fetch(ApiRequest::get(COLLECTION).query_pairs(filter.to_query())).await
	}

	/// Fetches one certificate.
	pub async fn get(&self, id: &CertificateId) -> Result<CertificateView> {
		self.fetch(ApiRequest::get(item_path(id))).await
	}

	/// Issues a certificate.
	pub async fn create(&self, certificate: &NewCertificate) -> Result<Certificate> {
		certificate.validate()?;

		self.fetch(ApiRequest::post(COLLECTION).json(certificate)?).await
	}

	/// Applies a partial update.
	pub async fn update(&self, id: &CertificateId, patch: &CertificateUpdate) -> Result<Certificate> {
		self.fetch(ApiRequest::patch(item_path(id)).json(patch)?).await
	}

	/// Sends an SMS confirmation code to the holder for a charge of `charge_sum`.
	pub async fn send_confirm_code(&self, id: &CertificateId, charge_sum: f64) -> Result<()> {
		if !charge_sum.is_finite() || charge_sum <= 0. {
			return Err(Error::InvalidInput { reason: "charge sum must be a positive number".into() });
		}

		let request = ApiRequest::post(format!("certificates/send_confirm_code/{id}"))
			.query("charge_sum", charge_sum);

		self.send(request).await
	}

	/// Completes a charge with the code the holder received.
	pub async fn charge(&self, id: &CertificateId, confirm_code: &str) -> Result<Certificate> {
		let confirm_code = confirm_code.trim();

		if confirm_code.is_empty() {
			return Err(Error::InvalidInput { reason: "confirmation code is required".into() });
		}

		let request =
			ApiRequest::post(format!("certificates/charge/{id}")).query("confirm_code", confirm_code);

		self.fetch(request).await
	}

	/// Sends the certificate image to a Telegram chat.
	pub async fn send_telegram(&self, id: &CertificateId, message: &TelegramMessage) -> Result<()> {
		let request = ApiRequest::post(format!("certificates/send_telegram_msg/{id}")).json(message)?;

		self.send(request).await
	}

	async fn fetch<R>(&self, request: ApiRequest) -> Result<R>
	where
		R: DeserializeOwned,
	{
		let response = self.gateway.execute(request).await?.error_for_status()?;

		Ok(response.json()?)
	}

	async fn send(&self, request: ApiRequest) -> Result<()> {
		self.gateway.execute(request).await?.error_for_status()?;

		Ok(())
	}
}
impl<T> Debug for CertificatesApi<'_, T>
where
	T: ?Sized + ApiTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CertificatesApi").field("gateway", self.gateway).finish()
	}
}

fn item_path(id: &CertificateId) -> String {
	format!("{COLLECTION}{id}")
}
