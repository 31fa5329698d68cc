//! Demonstrates logging in, then issuing an authenticated call whose expired access token is
//! refreshed and replayed transparently.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use serde_json::{Value, json};
use url::Url;
// self
use booking_client::{
	client::{ApiClient, RequestOptions},
	config::ClientConfig,
	http::ReqwestTransport,
	reqwest::Client,
	session::Credentials,
	store::{MemoryTokenStore, TokenStore},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let login_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/login");
			then.status(200).header("content-type", "application/json").body(
				"{\"accessToken\":\"login-at\",\"refreshToken\":\"login-rt\",\"expiresIn\":900}",
			);
		})
		.await;
	let expired_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/bookings").header("authorization", "Bearer login-at");
			then.status(401).body("{\"message\":\"Token expired\"}");
		})
		.await;
	let refresh_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/refresh").json_body(json!({ "refreshToken": "login-rt" }));
			then.status(200).header("content-type", "application/json").body(
				"{\"accessToken\":\"fresh-at\",\"refreshToken\":\"fresh-rt\",\"expiresIn\":3600}",
			);
		})
		.await;
	let bookings_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/bookings").header("authorization", "Bearer fresh-at");
			then.status(200)
				.header("content-type", "application/json")
				.body("[{\"id\":7,\"status\":\"confirmed\"}]");
		})
		.await;
	let config = ClientConfig::builder(Url::parse(&server.base_url())?).build()?;
	let transport = ReqwestTransport::with_client(
		Client::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()?,
	);
	let store = Arc::new(MemoryTokenStore::default());
	let client =
		<ApiClient<ReqwestTransport>>::with_transport(config, store.clone(), transport);
	let session = client.login(&Credentials::new("ana@example.com", "hunter2")).await?;

	println!("Logged in; access token expires at {}.", session.expires_at);

	let bookings: Value = client.get("/bookings", RequestOptions::new()).await?;

	println!("Bookings after a transparent refresh: {bookings}.");
	println!(
		"Stored access token is now {}.",
		store.access_token().map(|t| t.expose().to_owned()).unwrap_or_default()
	);

	login_mock.assert_async().await;
	expired_mock.assert_async().await;
	refresh_mock.assert_async().await;
	bookings_mock.assert_async().await;

	Ok(())
}
