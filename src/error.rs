//! Client-level error types shared across the request pipeline, stores, and session flows.

// self
use crate::_prelude::*;

/// Result type returned by every request operation.
pub type ApiResult<T> = Result<T, NormalizedError>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Message used when a refresh cycle fails and the session is torn down.
pub const SESSION_EXPIRED_MESSAGE: &str = "Authentication failed. Please login again.";
/// Message used when neither the server nor the transport supplied one.
pub const GENERIC_ERROR_MESSAGE: &str = "An unexpected error occurred.";

/// Configuration failures raised while building the client.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Client configuration failed validation.
	#[error(transparent)]
	InvalidConfig(#[from] crate::config::ClientConfigError),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures where no HTTP response was received.
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error: {message}")]
	Network {
		/// Human-readable summary of the failure.
		message: String,
		/// Transport-specific network error.
		#[source]
		source: Option<BoxError>,
	},
	/// The transport gave up waiting for a response.
	#[error("Request timed out.")]
	Timeout,
	/// Outbound request could not be assembled.
	#[error("Request could not be built: {message}")]
	InvalidRequest {
		/// Human-readable summary of the failure.
		message: String,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { message: src.to_string(), source: Some(Box::new(src)) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		if e.is_timeout() {
			Self::Timeout
		} else if e.is_builder() {
			Self::InvalidRequest { message: e.to_string() }
		} else {
			Self::network(e)
		}
	}
}

/// The only error shape exposed by request operations.
///
/// Every failure escaping [`ApiClient`](crate::client::ApiClient), whether a business error, a
/// terminal authentication failure, or a network outage, is reduced to a message and an HTTP
/// status code so feature code never inspects transport-specific types.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ThisError)]
#[error("{message} (status {status_code})")]
#[serde(rename_all = "camelCase")]
pub struct NormalizedError {
	/// Server-supplied or transport-derived message.
	pub message: String,
	/// HTTP status code; `500` when no response was received.
	pub status_code: u16,
}
impl NormalizedError {
	/// Creates a new normalized error.
	pub fn new(message: impl Into<String>, status_code: u16) -> Self {
		Self { message: message.into(), status_code }
	}

	/// Terminal authentication failure raised when a refresh cycle fails.
	pub fn session_expired() -> Self {
		Self::new(SESSION_EXPIRED_MESSAGE, 401)
	}

	/// Returns `true` for authentication failures (HTTP 401).
	pub fn is_unauthorized(&self) -> bool {
		self.status_code == 401
	}
}
impl From<TransportError> for NormalizedError {
	fn from(e: TransportError) -> Self {
		crate::normalize::normalize(&crate::normalize::RawFailure::Transport(e))
	}
}
