#![cfg(feature = "reqwest")]

mod common;

// std
use std::{sync::Arc, time::Duration as StdDuration};
// crates.io
use httpmock::prelude::*;
use serde_json::{Value, json};
// self
use booking_client::{
	client::RequestOptions,
	error::NormalizedError,
	store::TokenStore,
};
use common::{RecordingTokenStore, build_reqwest_test_client_with_store};

const REFRESH_DELAY: StdDuration = StdDuration::from_millis(300);

fn recording_client(
	server: &MockServer,
	access: &str,
	refresh: &str,
) -> (common::ReqwestTestClient, Arc<RecordingTokenStore>) {
	let store = Arc::new(RecordingTokenStore::seeded(access, refresh));
	let dyn_store: Arc<dyn TokenStore> = store.clone();
	let client = build_reqwest_test_client_with_store(&server.base_url(), dyn_store);

	(client, store)
}

#[tokio::test]
async fn concurrent_unauthorized_requests_share_one_refresh() {
	let server = MockServer::start_async().await;
	let (client, store) = recording_client(&server, "stale-at", "stale-rt");
	let stale_bookings = server
		.mock_async(|when, then| {
			when.method(GET).path("/bookings").header("authorization", "Bearer stale-at");
			then.status(401)
				.header("content-type", "application/json")
				.body("{\"message\":\"Token expired\"}");
		})
		.await;
	let stale_favorites = server
		.mock_async(|when, then| {
			when.method(GET).path("/favorites").header("authorization", "Bearer stale-at");
			then.status(401)
				.header("content-type", "application/json")
				.body("{\"message\":\"Token expired\"}");
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/refresh").json_body(json!({ "refreshToken": "stale-rt" }));
			then.status(200)
				.header("content-type", "application/json")
				.delay(REFRESH_DELAY)
				.body("{\"accessToken\":\"new-at\",\"refreshToken\":\"new-rt\",\"expiresIn\":3600}");
		})
		.await;
	let fresh_bookings = server
		.mock_async(|when, then| {
			when.method(GET).path("/bookings").header("authorization", "Bearer new-at");
			then.status(200)
				.header("content-type", "application/json")
				.body("[{\"id\":1,\"companion\":\"Ana\"}]");
		})
		.await;
	let fresh_favorites = server
		.mock_async(|when, then| {
			when.method(GET).path("/favorites").header("authorization", "Bearer new-at");
			then.status(200).header("content-type", "application/json").body("[7,9]");
		})
		.await;
	let (bookings, favorites) = tokio::join!(
		client.get::<Value>("/bookings", RequestOptions::new()),
		client.get::<Vec<u32>>("/favorites", RequestOptions::new()),
	);
	let bookings = bookings.expect("Request A should succeed after the shared refresh.");
	let favorites = favorites.expect("Request B should succeed after the shared refresh.");

	assert_eq!(bookings, json!([{ "id": 1, "companion": "Ana" }]));
	assert_eq!(favorites, vec![7, 9]);

	refresh.assert_calls_async(1).await;
	stale_bookings.assert_calls_async(1).await;
	stale_favorites.assert_calls_async(1).await;
	fresh_bookings.assert_calls_async(1).await;
	fresh_favorites.assert_calls_async(1).await;

	assert_eq!(store.set_calls(), vec![("new-at".to_owned(), "new-rt".to_owned(), 3600)]);
	assert_eq!(store.remove_calls(), 0);
	assert_eq!(client.refresh_metrics.attempts(), 1);
	assert_eq!(client.refresh_metrics.successes(), 1);
	assert_eq!(client.refresh_metrics.queued(), 1);
	assert!(!client.refresh_in_progress());
}

#[tokio::test]
async fn failed_refresh_logs_out_and_rejects_with_session_expired() {
	let server = MockServer::start_async().await;
	let (client, store) = recording_client(&server, "stale-at", "revoked-rt");
	let stale = server
		.mock_async(|when, then| {
			when.method(GET).path("/me").header("authorization", "Bearer stale-at");
			then.status(401).body("{\"message\":\"Token expired\"}");
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/refresh");
			then.status(400)
				.header("content-type", "application/json")
				.body("{\"message\":\"Invalid refresh token\"}");
		})
		.await;
	let err = client
		.get::<Value>("/me", RequestOptions::new())
		.await
		.expect_err("A rejected refresh must surface to the caller.");

	assert_eq!(
		err,
		NormalizedError {
			message: "Authentication failed. Please login again.".into(),
			status_code: 401,
		}
	);

	stale.assert_calls_async(1).await;
	refresh.assert_calls_async(1).await;

	assert_eq!(store.remove_calls(), 1);
	assert!(store.set_calls().is_empty());
	assert!(store.access_token().is_none());
	assert!(store.refresh_token().is_none());
	assert_eq!(client.refresh_metrics.failures(), 1);
	assert!(!client.refresh_in_progress());
}

#[tokio::test]
async fn skip_auth_requests_never_carry_tokens_or_refresh() {
	let server = MockServer::start_async().await;
	let (client, store) = recording_client(&server, "stale-at", "stale-rt");
	let public = server
		.mock_async(|when, then| {
			when.method(GET).path("/companions/featured").header_missing("authorization");
			then.status(401)
				.header("content-type", "application/json")
				.body("{\"message\":\"Guests cannot view this listing\"}");
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/refresh");
			then.status(200).body(
				"{\"accessToken\":\"unused-at\",\"refreshToken\":\"unused-rt\",\"expiresIn\":60}",
			);
		})
		.await;
	let err = client
		.get::<Value>("/companions/featured", RequestOptions::new().skip_auth())
		.await
		.expect_err("A public 401 must be reported verbatim.");

	assert_eq!(err, NormalizedError::new("Guests cannot view this listing", 401));

	public.assert_calls_async(1).await;
	refresh.assert_calls_async(0).await;

	assert!(store.set_calls().is_empty());
	assert_eq!(store.remove_calls(), 0);
}

#[tokio::test]
async fn skip_refresh_keeps_bearer_but_reports_401() {
	let server = MockServer::start_async().await;
	let (client, _store) = recording_client(&server, "current-at", "current-rt");
	let guarded = server
		.mock_async(|when, then| {
			when.method(GET).path("/admin/reports").header("authorization", "Bearer current-at");
			then.status(401).body("{\"error\":\"Admin session required\"}");
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/refresh");
			then.status(500);
		})
		.await;
	let err = client
		.get::<Value>("/admin/reports", RequestOptions::new().skip_refresh())
		.await
		.expect_err("skip_refresh must not recover from a 401.");

	assert_eq!(err, NormalizedError::new("Admin session required", 401));

	guarded.assert_calls_async(1).await;
	refresh.assert_calls_async(0).await;
}

#[tokio::test]
async fn replayed_request_is_never_refreshed_twice() {
	let server = MockServer::start_async().await;
	let (client, store) = recording_client(&server, "stale-at", "stale-rt");
	let stale = server
		.mock_async(|when, then| {
			when.method(GET).path("/admin/users").header("authorization", "Bearer stale-at");
			then.status(401).body("{\"message\":\"Token expired\"}");
		})
		.await;
	let replayed = server
		.mock_async(|when, then| {
			when.method(GET).path("/admin/users").header("authorization", "Bearer new-at");
			then.status(401).body("{\"message\":\"Administrator role required\"}");
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/refresh");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"accessToken\":\"new-at\",\"refreshToken\":\"new-rt\",\"expiresIn\":3600}");
		})
		.await;
	let err = client
		.get::<Value>("/admin/users", RequestOptions::new())
		.await
		.expect_err("A 401 after replay is terminal.");

	assert_eq!(err, NormalizedError::new("Administrator role required", 401));

	stale.assert_calls_async(1).await;
	replayed.assert_calls_async(1).await;
	refresh.assert_calls_async(1).await;

	assert_eq!(store.set_calls().len(), 1);
	assert_eq!(store.remove_calls(), 0);
}

#[tokio::test]
async fn missing_refresh_token_fails_without_calling_the_endpoint() {
	let server = MockServer::start_async().await;
	let store = Arc::new(RecordingTokenStore::default());
	let dyn_store: Arc<dyn TokenStore> = store.clone();
	let client = build_reqwest_test_client_with_store(&server.base_url(), dyn_store);
	let anonymous = server
		.mock_async(|when, then| {
			when.method(POST).path("/bookings").header_missing("authorization");
			then.status(401).body("{\"message\":\"Login required\"}");
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/refresh");
			then.status(200);
		})
		.await;
	let err = client
		.post::<Value, _>("/bookings", &json!({ "companionId": 3 }), RequestOptions::new())
		.await
		.expect_err("Without a refresh token the session cannot be recovered.");

	assert_eq!(err, NormalizedError::session_expired());

	anonymous.assert_calls_async(1).await;
	refresh.assert_calls_async(0).await;

	assert_eq!(store.remove_calls(), 1);
}

#[tokio::test]
async fn later_expiry_starts_a_new_refresh_cycle() {
	let server = MockServer::start_async().await;
	let (client, store) = recording_client(&server, "at-1", "rt-1");
	let first_stale = server
		.mock_async(|when, then| {
			when.method(GET).path("/me").header("authorization", "Bearer at-1");
			then.status(401);
		})
		.await;
	let first_refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/refresh").json_body(json!({ "refreshToken": "rt-1" }));
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"accessToken\":\"at-2\",\"refreshToken\":\"rt-2\",\"expiresIn\":60}");
		})
		.await;
	let second_stale = server
		.mock_async(|when, then| {
			when.method(GET).path("/me").header("authorization", "Bearer at-2");
			then.status(401);
		})
		.await;
	let second_refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/refresh").json_body(json!({ "refreshToken": "rt-2" }));
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"accessToken\":\"at-3\",\"refreshToken\":\"rt-3\",\"expiresIn\":60}");
		})
		.await;
	let fresh = server
		.mock_async(|when, then| {
			when.method(GET).path("/me").header("authorization", "Bearer at-3");
			then.status(200).header("content-type", "application/json").body("{\"id\":5}");
		})
		.await;
	let first = client.get::<Value>("/me", RequestOptions::new()).await;

	assert_eq!(first, Err(NormalizedError::new("Request failed with status code 401.", 401)));

	let second = client
		.get::<Value>("/me", RequestOptions::new())
		.await
		.expect("A new call may start a new refresh cycle.");

	assert_eq!(second, json!({ "id": 5 }));

	first_stale.assert_calls_async(1).await;
	first_refresh.assert_calls_async(1).await;
	second_stale.assert_calls_async(2).await;
	second_refresh.assert_calls_async(1).await;
	fresh.assert_calls_async(1).await;

	assert_eq!(store.set_calls().len(), 2);
}
