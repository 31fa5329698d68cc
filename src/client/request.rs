//! Pending requests and their bodies.

// crates.io
use http::{HeaderMap, HeaderValue, Method};
// self
use crate::{_prelude::*, client::RequestOptions};

/// Body attached to an outbound request.
#[derive(Clone, Debug, Default)]
pub enum RequestBody {
	/// No body.
	#[default]
	Empty,
	/// JSON-encoded payload; sent with `content-type: application/json`.
	Json(Vec<u8>),
	/// Binary or multipart payload; the JSON content type is never forced onto it.
	Binary {
		/// Encoded payload.
		bytes: Vec<u8>,
		/// Content type carrying any multipart boundary; `application/octet-stream` is sent
		/// when `None` and the caller set no content type header.
		content_type: Option<HeaderValue>,
	},
}
impl RequestBody {
	/// Serializes `value` as JSON.
	pub fn json<B>(value: &B) -> Result<Self, serde_json::Error>
	where
		B: ?Sized + Serialize,
	{
		Ok(Self::Json(serde_json::to_vec(value)?))
	}

	/// Wraps a binary or multipart payload.
	pub fn binary(bytes: impl Into<Vec<u8>>, content_type: Option<HeaderValue>) -> Self {
		Self::Binary { bytes: bytes.into(), content_type }
	}

	/// Returns `true` for binary/multipart payloads.
	pub fn is_binary(&self) -> bool {
		matches!(self, Self::Binary { .. })
	}

	/// Encoded bytes sent on the wire.
	pub fn bytes(&self) -> &[u8] {
		match self {
			Self::Empty => &[],
			Self::Json(bytes) | Self::Binary { bytes, .. } => bytes,
		}
	}
}

/// Outbound call awaiting dispatch or replay.
#[derive(Clone, Debug)]
pub struct ApiRequest {
	/// HTTP method.
	pub method: Method,
	/// Path relative to the configured base URL (absolute URLs pass through).
	pub path: String,
	/// Caller-supplied headers.
	pub headers: HeaderMap,
	/// Query pairs appended to the resolved URL.
	pub query: Vec<(String, String)>,
	/// Request body.
	pub body: RequestBody,
	/// Public endpoint: no bearer token, no refresh.
	pub skip_auth: bool,
	/// Bearer token allowed, refresh disabled.
	pub skip_refresh: bool,
	/// Set once the request took part in a refresh cycle; a replayed request is never
	/// refreshed again.
	pub retried: bool,
}
impl ApiRequest {
	/// Creates a pending request from its parts.
	pub fn new(
		method: Method,
		path: impl Into<String>,
		body: RequestBody,
		options: RequestOptions,
	) -> Self {
		let RequestOptions { skip_auth, skip_refresh, headers, query } = options;

		Self {
			method,
			path: path.into(),
			headers,
			query,
			body,
			skip_auth,
			skip_refresh,
			retried: false,
		}
	}

	/// Returns `true` when a 401 on this request may start (or join) a refresh cycle.
	pub fn is_refreshable(&self) -> bool {
		!(self.skip_auth || self.skip_refresh || self.retried)
	}
}
