#![cfg(feature = "reqwest")]

mod common;

// std
use std::time::Duration;
// crates.io
use httpmock::prelude::*;
// self
use certdesk::{
	api::{CertificateFilter, CertificateStatus},
	auth::{CertificateId, CredentialPair, TokenSecret},
	error::{Error, RefreshFailure},
};

const VIEW: &str = r#"{"amount":700.0,"code":"GIFT-0042","description":"Spa day","status":"ACTIVE",
	"created_at":"2025-01-10","used_at":null,"period":30,"name":"Ivan","last_name":"Petrov",
	"phone":"+79990000000"}"#;

fn certificate_id() -> CertificateId {
	CertificateId::new("01HZX3K7Q8M2N4P6R8T0V2W4Y6").expect("Fixture id should be valid.")
}

#[tokio::test]
async fn concurrent_expiry_refreshes_once_and_replays_both() {
	let server = MockServer::start_async().await;
	let (gateway, store, events) =
		common::gateway(&server, Some(CredentialPair::new("t1", "r1")));
	let stale = server
		.mock_async(|when, then| {
			when.header("authorization", "Bearer t1");
			then.status(401).header("content-type", "application/json").body("{\"detail\":\"Unauthorized\"}");
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/v1/auth/jwt/refresh").query_param("refresh_token", "r1");
			then.status(200)
				.header("content-type", "application/json")
				.delay(Duration::from_millis(300))
				.body("{\"access_token\":\"t2\",\"token_type\":\"bearer\"}");
		})
		.await;
	let list = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/v1/certificates/").header("authorization", "Bearer t2");
			then.status(200).header("content-type", "application/json").body("[]");
		})
		.await;
	let single = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/api/v1/certificates/01HZX3K7Q8M2N4P6R8T0V2W4Y6")
				.header("authorization", "Bearer t2");
			then.status(200).header("content-type", "application/json").body(VIEW);
		})
		.await;
	let api = gateway.certificates();
	let id = certificate_id();
	let filter = CertificateFilter::default();
	let (a, b) = tokio::join!(api.list(&filter), api.get(&id));

	assert!(a.expect("Request A should succeed after the refresh.").is_empty());
	assert_eq!(
		b.expect("Request B should succeed after the refresh.").status,
		CertificateStatus::Active
	);

	refresh.assert_calls_async(1).await;
	stale.assert_calls_async(2).await;
	list.assert_calls_async(1).await;
	single.assert_calls_async(1).await;

	let slots = store.snapshot();

	assert_eq!(slots.access, Some(TokenSecret::new("t2")));
	assert_eq!(slots.refresh, Some(TokenSecret::new("r1")));
	assert_eq!(common::events(&events), 0);
	assert_eq!(gateway.refresh_metrics.coalesced(), 1);
}

#[tokio::test]
async fn failed_refresh_fails_both_and_clears_store() {
	let server = MockServer::start_async().await;
	let (gateway, store, events) =
		common::gateway(&server, Some(CredentialPair::new("t1", "r1")));
	let stale = server
		.mock_async(|when, then| {
			when.header("authorization", "Bearer t1");
			then.status(401).body("{\"detail\":\"Unauthorized\"}");
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/v1/auth/jwt/refresh");
			then.status(401)
				.header("content-type", "application/json")
				.delay(Duration::from_millis(500))
				.body("{\"detail\":\"Invalid refresh token\"}");
		})
		.await;
	let api = gateway.certificates();
	let id = certificate_id();
	let filter = CertificateFilter::default();
	let (a, b) = tokio::join!(api.list(&filter), api.get(&id));

	for err in [a.expect_err("Request A should fail."), b.expect_err("Request B should fail.")] {
		match err {
			Error::RefreshFailed(RefreshFailure::Rejected { status, detail }) => {
				assert_eq!(status, 401);
				assert_eq!(detail, "Invalid refresh token");
			},
			other => panic!("Unexpected error: {other:?}."),
		}
	}

	refresh.assert_calls_async(1).await;
	stale.assert_calls_async(2).await;

	assert!(store.snapshot().is_empty());
	assert_eq!(common::events(&events), 1);
	assert!(!gateway.is_authenticated().await.expect("Store should be readable."));
}

#[tokio::test]
async fn missing_refresh_token_never_calls_refresh_endpoint() {
	let server = MockServer::start_async().await;
	let (gateway, store, events) = common::gateway(&server, Some(CredentialPair::access_only("t1")));
	let stale = server
		.mock_async(|when, then| {
			when.header("authorization", "Bearer t1");
			then.status(401).body("{\"detail\":\"Unauthorized\"}");
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.path("/api/v1/auth/jwt/refresh");
			then.status(200).body("{\"access_token\":\"t2\"}");
		})
		.await;
	let err = gateway
		.certificates()
		.list(&CertificateFilter::default())
		.await
		.expect_err("Expiry without a refresh token should end the session.");

	assert!(matches!(err, Error::NoRefreshToken));
	assert!(err.is_session_terminal());

	stale.assert_calls_async(1).await;
	refresh.assert_calls_async(0).await;

	assert!(store.snapshot().is_empty());
	assert_eq!(common::events(&events), 1);
}

#[tokio::test]
async fn replay_rejected_again_expires_session() {
	let server = MockServer::start_async().await;
	let (gateway, store, events) =
		common::gateway(&server, Some(CredentialPair::new("t1", "r1")));
	let rejected = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/v1/certificates/");
			then.status(401).body("{\"detail\":\"Unauthorized\"}");
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/v1/auth/jwt/refresh");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"t2\",\"refresh_token\":\"r2\"}");
		})
		.await;
	let err = gateway
		.certificates()
		.list(&CertificateFilter::default())
		.await
		.expect_err("A replay that is still unauthorized should end the session.");

	assert!(matches!(err, Error::SessionExpired));

	rejected.assert_calls_async(2).await;
	refresh.assert_calls_async(1).await;

	assert!(store.snapshot().is_empty());
	assert_eq!(common::events(&events), 1);
}

#[tokio::test]
async fn non_auth_failures_pass_through_untouched() {
	let server = MockServer::start_async().await;
	let (gateway, store, events) =
		common::gateway(&server, Some(CredentialPair::new("t1", "r1")));
	let missing = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/v1/certificates/01HZX3K7Q8M2N4P6R8T0V2W4Y6");
			then.status(404)
				.header("content-type", "application/json")
				.body("{\"detail\":\"Certificate with id 01HZX3K7Q8M2N4P6R8T0V2W4Y6 not found\"}");
		})
		.await;
	let err = gateway
		.certificates()
		.get(&certificate_id())
		.await
		.expect_err("A 404 should surface as an API error.");

	assert!(matches!(&err, Error::Api { status: 404, detail } if detail.ends_with("not found")));
	assert!(!err.is_session_terminal());

	missing.assert_calls_async(1).await;

	assert_eq!(store.snapshot().access, Some(TokenSecret::new("t1")));
	assert_eq!(common::events(&events), 0);
}
