#![cfg(feature = "reqwest")]

mod common;

// crates.io
use httpmock::prelude::*;
use serde_json::json;
use time::{OffsetDateTime, macros::date};
// self
use certdesk::{
	api::{
		CertificateFilter, CertificateStatus, CertificateUpdate, ChargeSession, ChargeStep,
		DateRange, NewCertificate, PublicClient, TelegramMessage,
	},
	auth::{CertificateId, CredentialPair},
	url::Url,
};

const ID: &str = "01HZX3K7Q8M2N4P6R8T0V2W4Y6";

fn certificate_json(amount: f64, status: &str) -> String {
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
		"indefinite": false,
		"period": 365,
		"name": "Ivan",
		"last_name": "Petrov",
		"phone": "+79990000000"
	})
	.to_string()
}

fn id() -> CertificateId {
	CertificateId::new(ID).expect("Fixture id should be valid.")
}

#[tokio::test]
async fn list_sends_filters_as_query_parameters() {
	let server = MockServer::start_async().await;
	let (gateway, _, _) = common::gateway(&server, Some(CredentialPair::new("t1", "r1")));
	let list = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/api/v1/certificates/")
				.header("authorization", "Bearer t1")
				.query_param("status__in", "ACTIVE,EXPIRED")
				.query_param("created_at__gte", "2025-01-01")
				.query_param("created_at__lte", "2025-12-31")
				.query_param("phone__ilike", "999");
			then.status(200)
				.header("content-type", "application/json")
				.body(format!("[{}]", certificate_json(1500., "ACTIVE")));
		})
		.await;
	let filter = CertificateFilter::default()
		.status([CertificateStatus::Active, CertificateStatus::Expired])
		.created(DateRange::between(date!(2025 - 01 - 01), date!(2025 - 12 - 31)))
		.phone("999");
	let certificates =
		gateway.certificates().list(&filter).await.expect("Filtered list should succeed.");

	list.assert_calls_async(1).await;

	assert_eq!(certificates.len(), 1);
	assert_eq!(certificates[0].id, id());
	assert_eq!(certificates[0].expires_on(), Some(date!(2026 - 01 - 10)));
}

#[tokio::test]
async fn create_update_and_telegram_send_json_bodies() {
	let server = MockServer::start_async().await;
	let (gateway, _, _) = common::gateway(&server, Some(CredentialPair::new("t1", "r1")));
	let create = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/v1/certificates/").json_body(json!({
				"amount": 1500.0,
				"description": "Spa day",
				"employee": "Anna",
				"check_amount": 0.0,
				"status": "ACTIVE",
				"created_at": "2025-01-10",
				"indefinite": false,
				"period": 365,
				"name": "Ivan",
				"last_name": "Petrov",
				"phone": "+79990000000"
			}));
			then.status(201)
				.header("content-type", "application/json")
				.body(certificate_json(1500., "ACTIVE"));
		})
		.await;
	let update = server
		.mock_async(|when, then| {
			when.method(PATCH)
				.path(format!("/api/v1/certificates/{ID}"))
				.json_body(json!({ "status": "CANCELLED" }));
			then.status(200)
				.header("content-type", "application/json")
				.body(certificate_json(1500., "CANCELLED"));
		})
		.await;
	let telegram = server
		.mock_async(|when, then| {
			when.method(POST)
				.path(format!("/api/v1/certificates/send_telegram_msg/{ID}"))
				.json_body(json!({
					"chat_id": 123456789,
					"image_url": "https://cdn.desk.test/certificate.png"
				}));
			then.status(200).header("content-type", "application/json").body("{\"ok\":true}");
		})
		.await;
	let api = gateway.certificates();
	let created = api
		.create(
			&NewCertificate::new(1500., "Spa day", "Anna", "+79990000000")
				.valid_for(date!(2025 - 01 - 10), 365)
				.holder("Ivan", "Petrov"),
		)
		.await
		.expect("Create should succeed.");

	assert_eq!(created.code, "GIFT-0042");

	let cancelled = api
		.update(
			&id(),
			&CertificateUpdate { status: Some(CertificateStatus::Cancelled), ..Default::default() },
		)
		.await
		.expect("Update should succeed.");

	assert_eq!(cancelled.status, CertificateStatus::Cancelled);

	api.send_telegram(
		&id(),
		&TelegramMessage {
			chat_id: 123456789,
			image_url: Url::parse("https://cdn.desk.test/certificate.png")
				.expect("Image URL should parse."),
		},
	)
	.await
	.expect("Telegram delivery should succeed.");

	create.assert_calls_async(1).await;
	update.assert_calls_async(1).await;
	telegram.assert_calls_async(1).await;
}

#[tokio::test]
async fn charge_session_confirms_with_sms_code() {
	let server = MockServer::start_async().await;
	let (gateway, _, _) = common::gateway(&server, Some(CredentialPair::new("t1", "r1")));
	let get = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/v1/certificates/");
			then.status(200)
				.header("content-type", "application/json")
				.body(format!("[{}]", certificate_json(1500., "ACTIVE")));
		})
		.await;
	let send_code = server
		.mock_async(|when, then| {
			when.method(POST)
				.path(format!("/api/v1/certificates/send_confirm_code/{ID}"))
				.query_param("charge_sum", "1500");
			then.status(200).header("content-type", "application/json").body("null");
		})
		.await;
	let wrong_code = server
		.mock_async(|when, then| {
			when.method(POST)
				.path(format!("/api/v1/certificates/charge/{ID}"))
				.query_param("confirm_code", "0000");
			then.status(400)
				.header("content-type", "application/json")
				.body("{\"detail\":\"Invalid confirmation code\"}");
		})
		.await;
	let charge = server
		.mock_async(|when, then| {
			when.method(POST)
				.path(format!("/api/v1/certificates/charge/{ID}"))
				.query_param("confirm_code", "4821");
			then.status(200)
				.header("content-type", "application/json")
				.body(certificate_json(0., "USED"));
		})
		.await;
	let api = gateway.certificates();
	let certificate = api
		.list(&CertificateFilter::default())
		.await
		.expect("List should succeed.")
		.pop()
		.expect("Fixture list should hold one certificate.");
	let mut session = ChargeSession::new(certificate).expect("Active certificate should qualify.");
	let sum = session
		.request_code(&api, 2000., OffsetDateTime::now_utc())
		.await
		.expect("Confirmation code should be sent.");

	assert_eq!(sum, 1500.);

	let err = session.confirm(&api, "0000").await.expect_err("Wrong code should be rejected.");

	assert_eq!(err.status(), Some(400));
	assert!(matches!(session.step(), ChargeStep::CodeSent { .. }));

	let charged = session.confirm(&api, "4821").await.expect("Charge should succeed.");

	assert_eq!(charged.status, CertificateStatus::Used);
	assert_eq!(charged.amount, 0.);

	get.assert_calls_async(1).await;
	send_code.assert_calls_async(1).await;
	wrong_code.assert_calls_async(1).await;
	charge.assert_calls_async(1).await;
}

#[tokio::test]
async fn public_lookup_sends_no_credentials() {
	let server = MockServer::start_async().await;
	let lookup = server
		.mock_async(|when, then| {
			when.method(GET).path(format!("/api/v1/certificates/{ID}")).header_missing("authorization");
			then.status(200).header("content-type", "application/json").body(
				"{\"amount\":700.0,\"code\":\"GIFT-0042\",\"description\":\"Spa day\",\"status\":\"EXPIRED\",\"created_at\":\"2024-01-10\",\"used_at\":null,\"period\":30,\"name\":null,\"last_name\":null,\"phone\":\"+7999***0000\"}",
			);
		})
		.await;
	let client = PublicClient::new(common::descriptor(&server));
	let view = client.certificate(&id()).await.expect("Public lookup should succeed.");

	lookup.assert_calls_async(1).await;

	assert_eq!(view.status, CertificateStatus::Expired);
	assert_eq!(view.expires_on(), Some(date!(2024 - 02 - 09)));
	assert!(view.is_expired_at(date!(2024 - 02 - 09)));
}
