//! Shared helpers for integration tests: reqwest clients that trust `httpmock`'s self-signed
//! certificates and a token store that records every mutation.

#![allow(dead_code)]

// std
use std::sync::{
	Arc,
	atomic::{AtomicUsize, Ordering},
};
// crates.io
use parking_lot::Mutex;
use url::Url;
// self
use booking_client::{
	auth::{SessionTokens, TokenSecret},
	client::ApiClient,
	config::ClientConfig,
	http::ReqwestTransport,
	reqwest::Client,
	store::{MemoryTokenStore, StoreError, TokenStore},
};

/// Client type alias used by reqwest-backed integration tests.
pub type ReqwestTestClient = ApiClient<ReqwestTransport>;

/// Builds a reqwest transport that accepts the self-signed certificates produced by `httpmock`.
pub fn test_reqwest_transport() -> ReqwestTransport {
	let client = Client::builder()
		.danger_accept_invalid_certs(true)
		.danger_accept_invalid_hostnames(true)
		.build()
		.expect("Failed to build insecure Reqwest client for tests.");

	ReqwestTransport::with_client(client)
}

/// Builds a client configuration rooted at the provided mock server base URL.
pub fn test_config(base_url: &str) -> ClientConfig {
	let base = Url::parse(base_url).expect("Mock server base URL should parse.");

	ClientConfig::builder(base).build().expect("Test client configuration should be valid.")
}

/// Constructs an [`ApiClient`] over the provided store and the test reqwest transport.
pub fn build_reqwest_test_client_with_store(
	base_url: &str,
	store: Arc<dyn TokenStore>,
) -> ReqwestTestClient {
	ApiClient::with_transport(test_config(base_url), store, test_reqwest_transport())
}

/// Constructs an [`ApiClient`] over an in-memory store seeded with the provided pair.
pub fn build_reqwest_test_client(
	base_url: &str,
	access: &str,
	refresh: &str,
) -> (ReqwestTestClient, Arc<MemoryTokenStore>) {
	let store_backend = Arc::new(MemoryTokenStore::default());

	store_backend
		.set_tokens(access, refresh, 900)
		.expect("Seeding the in-memory token store should succeed.");

	let store: Arc<dyn TokenStore> = store_backend.clone();
	let client = build_reqwest_test_client_with_store(base_url, store);

	(client, store_backend)
}

/// In-memory store that records every mutation issued by the client.
#[derive(Debug, Default)]
pub struct RecordingTokenStore {
	inner: MemoryTokenStore,
	set_calls: Mutex<Vec<(String, String, u64)>>,
	remove_calls: AtomicUsize,
}
impl RecordingTokenStore {
	/// Creates a store seeded with a pair; seeding is not recorded.
	pub fn seeded(access: &str, refresh: &str) -> Self {
		let store = Self::default();

		store
			.inner
			.set_tokens(access, refresh, 900)
			.expect("Seeding the in-memory token store should succeed.");

		store
	}

	/// Arguments of every recorded `set_tokens` call, in order.
	pub fn set_calls(&self) -> Vec<(String, String, u64)> {
		self.set_calls.lock().clone()
	}

	/// Number of recorded `remove_tokens` calls.
	pub fn remove_calls(&self) -> usize {
		self.remove_calls.load(Ordering::SeqCst)
	}
}
impl TokenStore for RecordingTokenStore {
	fn access_token(&self) -> Option<TokenSecret> {
		self.inner.access_token()
	}

	fn refresh_token(&self) -> Option<TokenSecret> {
		self.inner.refresh_token()
	}

	fn set_tokens(
		&self,
		access_token: &str,
		refresh_token: &str,
		expires_in_secs: u64,
	) -> Result<(), StoreError> {
		self.set_calls.lock().push((
			access_token.to_owned(),
			refresh_token.to_owned(),
			expires_in_secs,
		));
		self.inner.set_tokens(access_token, refresh_token, expires_in_secs)
	}

	fn remove_tokens(&self) -> Result<(), StoreError> {
		self.remove_calls.fetch_add(1, Ordering::SeqCst);
		self.inner.remove_tokens()
	}

	fn session(&self) -> Option<SessionTokens> {
		self.inner.session()
	}
}
