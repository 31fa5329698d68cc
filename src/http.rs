//! Transport primitives for API calls.
//!
//! The module exposes [`ApiTransport`] alongside the fully resolved [`HttpRequest`] and the
//! buffered [`ApiResponse`] so hosts can plug in their own HTTP stack. A transport only moves
//! bytes: it reports every HTTP response, including 4xx/5xx, as `Ok`, and returns
//! [`TransportError`] only when no response was received. Authentication, refresh, and error
//! normalization live in [`ApiClient`](crate::client::ApiClient).

// crates.io
use http::{HeaderMap, Method, StatusCode};
// self
use crate::{_prelude::*, error::TransportError};
#[cfg(feature = "reqwest")] use crate::{config::ClientConfig, error::ConfigError};

/// Boxed future returned by [`ApiTransport::execute`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<ApiResponse, TransportError>> + 'a + Send>>;

/// Abstraction over HTTP stacks capable of executing resolved API requests.
///
/// Implementations must be `Send + Sync + 'static` so a single transport can be shared by every
/// clone of a client, and the returned future must be `Send` so callers may drive requests from
/// any executor thread.
pub trait ApiTransport
where
	Self: 'static + Send + Sync,
{
	/// Dispatches `request` and buffers the full response.
	fn execute(&self, request: HttpRequest) -> TransportFuture<'_>;
}

/// Outbound request after interceptors resolved the URL, headers, and body bytes.
#[derive(Clone, Debug)]
pub struct HttpRequest {
	/// HTTP method.
	pub method: Method,
	/// Absolute request URL.
	pub url: Url,
	/// Final header set, credentials included.
	pub headers: HeaderMap,
	/// Encoded body; empty for body-less requests.
	pub body: Vec<u8>,
}

/// Buffered HTTP response.
#[derive(Clone, Debug)]
pub struct ApiResponse {
	/// Response status.
	pub status: StatusCode,
	/// Response headers.
	pub headers: HeaderMap,
	/// Raw response body.
	pub body: Vec<u8>,
}
impl ApiResponse {
	/// Creates a response from its parts.
	pub fn new(status: StatusCode, headers: HeaderMap, body: impl Into<Vec<u8>>) -> Self {
		Self { status, headers, body: body.into() }
	}

	/// Returns `true` for 2xx statuses.
	pub fn is_success(&self) -> bool {
		self.status.is_success()
	}

	/// Decodes the body as JSON, treating an empty body as `null` so `()` and `Option<T>`
	/// targets accept `204 No Content`.
	pub fn json<T>(&self) -> Result<T, serde_path_to_error::Error<serde_json::Error>>
	where
		T: DeserializeOwned,
	{
		let bytes: &[u8] = if self.body.iter().all(u8::is_ascii_whitespace) {
			b"null"
		} else {
			&self.body
		};
		let mut deserializer = serde_json::Deserializer::from_slice(bytes);

		serde_path_to_error::deserialize(&mut deserializer)
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// Prefer [`ReqwestTransport::from_config`]: it enables the cookie store the API's session
/// cookies rely on. [`ReqwestTransport::with_client`] uses the given client as is.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds a cookie-aware client honoring the configured timeout and user agent.
	pub fn from_config(config: &ClientConfig) -> Result<Self, ConfigError> {
		let mut builder = ReqwestClient::builder().cookie_store(true);

		if let Some(timeout) = config.timeout {
			let timeout = std::time::Duration::try_from(timeout)
				.map_err(ConfigError::http_client_build)?;

			builder = builder.timeout(timeout);
		}
		if let Some(user_agent) = config.user_agent.as_deref() {
			builder = builder.user_agent(user_agent);
		}

		Ok(Self(builder.build()?))
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestTransport {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl ApiTransport for ReqwestTransport {
	fn execute(&self, request: HttpRequest) -> TransportFuture<'_> {
		let client = self.0.clone();

		Box::pin(async move {
			let HttpRequest { method, url, headers, body } = request;
			let mut builder = client.request(method, url).headers(headers);

			if !body.is_empty() {
				builder = builder.body(body);
			}

			let response = builder.send().await?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let body = response.bytes().await?;

			Ok(ApiResponse::new(status, headers, body.to_vec()))
		})
	}
}
