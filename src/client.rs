//! Authenticated request client.
//!
//! [`ApiClient`] wraps an [`ApiTransport`] with two interceptor stages:
//!
//! - **outbound** ([`ApiClient::prepare`]): resolves the URL, keeps caller-provided content types
//!   on binary payloads, and attaches `Authorization: Bearer <token>` unless the call is public;
//! - **inbound** ([`ApiClient::execute`]): passes successes through, recovers refreshable 401s by
//!   joining the single-flight refresh cycle and replaying the request once, and normalizes every
//!   other failure into [`NormalizedError`].

pub mod multipart;
pub mod options;
pub mod refresh;
pub mod request;

pub use multipart::MultipartForm;
pub use options::*;
pub use refresh::RefreshMetrics;
pub use request::*;

// crates.io
use http::{HeaderValue, Method, StatusCode, header};
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	client::refresh::RefreshCoordinator,
	config::ClientConfig,
	error::TransportError,
	http::{ApiResponse, ApiTransport, HttpRequest},
	normalize::{self, RawFailure},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	store::TokenStore,
};
#[cfg(feature = "reqwest")]
use crate::{config::ClientConfigBuilder, error::ConfigError, http::ReqwestTransport};

#[cfg(feature = "reqwest")]
/// Client specialized for the crate's default reqwest transport.
pub type ReqwestApiClient = ApiClient<ReqwestTransport>;

/// Issues requests against the remote API, attaching credentials and recovering transparently
/// from expired access tokens.
///
/// Clones share the transport, token store, metrics, and refresh coordination state, so a single
/// refresh cycle covers every clone.
pub struct ApiClient<T>
where
	T: ?Sized + ApiTransport,
{
	/// Base URL, auth endpoint paths, and transport knobs.
	pub config: Arc<ClientConfig>,
	/// Injected token store; read on every authenticated dispatch.
	pub store: Arc<dyn TokenStore>,
	/// Transport used for every outbound call, including the refresh call.
	pub transport: Arc<T>,
	/// Shared counters for refresh cycles.
	pub refresh_metrics: Arc<RefreshMetrics>,
	coordinator: Arc<RefreshCoordinator>,
}
impl<T> ApiClient<T>
where
	T: ?Sized + ApiTransport,
{
	/// Creates a client over a caller-provided transport.
	pub fn with_transport(
		config: ClientConfig,
		store: Arc<dyn TokenStore>,
		transport: impl Into<Arc<T>>,
	) -> Self {
		Self {
			config: Arc::new(config),
			store,
			transport: transport.into(),
			refresh_metrics: Default::default(),
			coordinator: Default::default(),
		}
	}

	/// Returns `true` while a refresh call is in flight.
	pub fn refresh_in_progress(&self) -> bool {
		self.coordinator.in_progress()
	}

	/// Issues a `GET` and decodes the JSON response.
	pub async fn get<R>(&self, path: &str, options: RequestOptions) -> ApiResult<R>
	where
		R: DeserializeOwned,
	{
		self.request(Method::GET, path, RequestBody::Empty, options).await
	}

	/// Issues a `POST` with a JSON body and decodes the JSON response.
	pub async fn post<R, B>(&self, path: &str, body: &B, options: RequestOptions) -> ApiResult<R>
	where
		R: DeserializeOwned,
		B: ?Sized + Serialize,
	{
		self.request(Method::POST, path, encode_json(body)?, options).await
	}

	/// Issues a `PUT` with a JSON body and decodes the JSON response.
	pub async fn put<R, B>(&self, path: &str, body: &B, options: RequestOptions) -> ApiResult<R>
	where
		R: DeserializeOwned,
		B: ?Sized + Serialize,
	{
		self.request(Method::PUT, path, encode_json(body)?, options).await
	}

	/// Issues a `PATCH` with a JSON body and decodes the JSON response.
	pub async fn patch<R, B>(&self, path: &str, body: &B, options: RequestOptions) -> ApiResult<R>
	where
		R: DeserializeOwned,
		B: ?Sized + Serialize,
	{
		self.request(Method::PATCH, path, encode_json(body)?, options).await
	}

	/// Issues a `DELETE` and decodes the JSON response.
	pub async fn delete<R>(&self, path: &str, options: RequestOptions) -> ApiResult<R>
	where
		R: DeserializeOwned,
	{
		self.request(Method::DELETE, path, RequestBody::Empty, options).await
	}

	/// Issues a request with an arbitrary body (e.g. multipart uploads) and decodes the JSON
	/// response.
	pub async fn request<R>(
		&self,
		method: Method,
		path: &str,
		body: RequestBody,
		options: RequestOptions,
	) -> ApiResult<R>
	where
		R: DeserializeOwned,
	{
		let response = self.execute(ApiRequest::new(method, path, body, options)).await?;

		decode(&response)
	}

	/// Runs `request` through the interceptor chain and returns the raw successful response.
	pub async fn execute(&self, request: ApiRequest) -> ApiResult<ApiResponse> {
		const KIND: FlowKind = FlowKind::Request;

		let span = FlowSpan::new(KIND, "execute");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				match self.dispatch(&request, None).await {
					Ok(response)
						if response.status == StatusCode::UNAUTHORIZED
							&& request.is_refreshable() =>
						self.recover(request).await,
					outcome => settle(outcome),
				}
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	/// Refreshes (or waits for the in-flight refresh), then replays `request` once with the new
	/// access token.
	async fn recover(&self, mut request: ApiRequest) -> ApiResult<ApiResponse> {
		request.retried = true;

		let access_token = self.obtain_fresh_token().await?;
		let span = FlowSpan::new(FlowKind::Replay, "recover");
		let result = span.instrument(self.dispatch(&request, Some(&access_token))).await;

		obs::record_flow_outcome(
			FlowKind::Replay,
			if matches!(&result, Ok(response) if response.is_success()) {
				FlowOutcome::Success
			} else {
				FlowOutcome::Failure
			},
		);

		// `retried` is set, so a second 401 is terminal here.
		settle(result)
	}

	/// Prepares and sends one attempt of `request`.
	async fn dispatch(
		&self,
		request: &ApiRequest,
		bearer: Option<&TokenSecret>,
	) -> Result<ApiResponse, TransportError> {
		let prepared = self.prepare(request, bearer)?;

		self.transport.execute(prepared).await
	}

	/// Outbound interceptor.
	///
	/// `bearer` overrides the stored token; replays pass the token produced by the refresh so
	/// they never read a stale value.
	fn prepare(
		&self,
		request: &ApiRequest,
		bearer: Option<&TokenSecret>,
	) -> Result<HttpRequest, TransportError> {
		let mut url = self.config.url_for(&request.path).map_err(|e| {
			TransportError::InvalidRequest {
				message: format!("Invalid request path `{}`: {e}", request.path),
			}
		})?;

		if !request.query.is_empty() {
			url.query_pairs_mut().extend_pairs(request.query.iter());
		}

		let mut headers = request.headers.clone();

		if !headers.contains_key(header::ACCEPT) {
			headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
		}

		match &request.body {
			RequestBody::Json(_) =>
				if !headers.contains_key(header::CONTENT_TYPE) {
					headers
						.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
				},
			RequestBody::Binary { content_type: Some(content_type), .. } => {
				headers.insert(header::CONTENT_TYPE, content_type.clone());
			},
			RequestBody::Binary { content_type: None, .. } =>
				if !headers.contains_key(header::CONTENT_TYPE) {
					headers.insert(
						header::CONTENT_TYPE,
						HeaderValue::from_static("application/octet-stream"),
					);
				},
			RequestBody::Empty => {},
		}

		if !request.skip_auth {
			let token = bearer.cloned().or_else(|| self.store.access_token());

			if let Some(token) = token {
				let mut value = HeaderValue::from_str(&token.bearer()).map_err(|e| {
					TransportError::InvalidRequest {
						message: format!("Access token is not a valid header value: {e}"),
					}
				})?;

				value.set_sensitive(true);
				headers.insert(header::AUTHORIZATION, value);
			}
		}

		Ok(HttpRequest {
			method: request.method.clone(),
			url,
			headers,
			body: request.body.bytes().to_vec(),
		})
	}
}
#[cfg(feature = "reqwest")]
impl ApiClient<ReqwestTransport> {
	/// Validates `config` and creates a client that provisions its own cookie-aware reqwest
	/// transport from it.
	pub fn new(
		config: ClientConfigBuilder,
		store: Arc<dyn TokenStore>,
	) -> Result<Self, ConfigError> {
		let config = config.build()?;
		let transport = ReqwestTransport::from_config(&config)?;

		Ok(Self::with_transport(config, store, transport))
	}
}
impl<T> Clone for ApiClient<T>
where
	T: ?Sized + ApiTransport,
{
	fn clone(&self) -> Self {
		Self {
			config: self.config.clone(),
			store: self.store.clone(),
			transport: self.transport.clone(),
			refresh_metrics: self.refresh_metrics.clone(),
			coordinator: self.coordinator.clone(),
		}
	}
}
impl<T> Debug for ApiClient<T>
where
	T: ?Sized + ApiTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ApiClient")
			.field("base_url", &self.config.base_url.as_str())
			.field("session_active", &self.store.access_token().is_some())
			.field("refresh_in_progress", &self.refresh_in_progress())
			.finish()
	}
}

/// Inbound interceptor for outcomes that will not be refreshed.
fn settle(outcome: Result<ApiResponse, TransportError>) -> ApiResult<ApiResponse> {
	match outcome {
		Ok(response) if response.is_success() => Ok(response),
		Ok(response) => Err(normalize::normalize(&RawFailure::Response(response))),
		Err(e) => Err(normalize::normalize(&RawFailure::Transport(e))),
	}
}

fn encode_json<B>(body: &B) -> ApiResult<RequestBody>
where
	B: ?Sized + Serialize,
{
	RequestBody::json(body).map_err(|e| {
		NormalizedError::new(
			format!("Request body could not be serialized: {e}"),
			normalize::DEFAULT_STATUS_CODE,
		)
	})
}

fn decode<R>(response: &ApiResponse) -> ApiResult<R>
where
	R: DeserializeOwned,
{
	response.json().map_err(|e| {
		NormalizedError::new(
			format!("Response body could not be decoded at `{}`: {}", e.path(), e.inner()),
			normalize::DEFAULT_STATUS_CODE,
		)
	})
}
