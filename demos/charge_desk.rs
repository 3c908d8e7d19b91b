//! Walks a cashier session against a local mock of the certificate service: password login,
//! listing active certificates, and an SMS-confirmed charge.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use serde_json::json;
use time::OffsetDateTime;
// self
use certdesk::{
	api::{CertificateFilter, CertificateStatus, ChargeSession},
	gateway::Gateway,
	http::ReqwestTransport,
	service::ServiceDescriptor,
	store::{CredentialStore, MemoryStore},
};

const ID: &str = "01HZX3K7Q8M2N4P6R8T0V2W4Y6";

fn certificate(amount: f64, status: &str) -> String {
	json!({
		"id": ID,
		"code": "GIFT-0042",
		"amount": amount,
		"description": "Spa day",
		"employee": "Anna",
		"check_amount": 0.0,
		"status": status,
		"created_at": "2025-01-10",
		"used_at": null,
		"indefinite": true,
		"period": null,
		"name": "Ivan",
		"last_name": "Petrov",
		"phone": "+79990000000"
	})
	.to_string()
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let login_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/v1/auth/jwt/login");
			then.status(200)
				.header("content-type", "application/json")
				.header("set-cookie", "refresh_token=demo-refresh; HttpOnly")
				.body("{\"access_token\":\"demo-access\",\"token_type\":\"bearer\"}");
		})
		.await;
	let list_mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/api/v1/certificates/")
				.header("authorization", "Bearer demo-access")
				.query_param("status__in", "ACTIVE");
			then.status(200)
				.header("content-type", "application/json")
				.body(format!("[{}]", certificate(1500., "ACTIVE")));
		})
		.await;
	let code_mock = server
		.mock_async(|when, then| {
			when.method(POST).path(format!("/api/v1/certificates/send_confirm_code/{ID}"));
			then.status(200).header("content-type", "application/json").body("null");
		})
		.await;
	let charge_mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path(format!("/api/v1/certificates/charge/{ID}"))
				.query_param("confirm_code", "4821");
			then.status(200)
				.header("content-type", "application/json")
				.body(certificate(300., "ACTIVE"));
		})
		.await;
	let store: Arc<dyn CredentialStore> = Arc::new(MemoryStore::default());
	let descriptor = ServiceDescriptor::from_env_value(Some(&server.url("/api/v1/")))?;
	let gateway = <Gateway<ReqwestTransport>>::with_transport(
		store,
		descriptor,
		ReqwestTransport::no_redirects()?,
	)
	.with_session_observer(|| println!("Session ended; sign in again."));

	gateway.login("cashier@desk.test", "s3cret").await?;

	let api = gateway.certificates();
	let mut active =
		api.list(&CertificateFilter::default().status([CertificateStatus::Active])).await?;
	let Some(certificate) = active.pop() else {
		println!("No active certificates.");

		return Ok(());
	};

	println!("Charging {} (balance {}).", certificate.code, certificate.amount);

	let mut session = ChargeSession::new(certificate)?;
	let sum = session.request_code(&api, 1200., OffsetDateTime::now_utc()).await?;

	println!("Confirmation code sent for {sum}.");

	let charged = session.confirm(&api, "4821").await?;

	println!("Remaining balance: {}.", charged.amount);

	login_mock.assert_async().await;
	list_mock.assert_async().await;
	code_mock.assert_async().await;
	charge_mock.assert_async().await;

	Ok(())
}
