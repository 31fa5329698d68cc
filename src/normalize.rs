//! Reduction of raw transport outcomes into [`NormalizedError`].
//!
//! [`normalize`] is a pure function of a borrowed [`RawFailure`]: feeding the same failure twice
//! always yields the same `{ message, status_code }` pair.

// crates.io
use serde_json::Value;
// self
use crate::{
	_prelude::*,
	error::{GENERIC_ERROR_MESSAGE, TransportError},
	http::ApiResponse,
};

/// Status reported when the transport produced no response.
pub const DEFAULT_STATUS_CODE: u16 = 500;

const MESSAGE_FIELDS: [&str; 3] = ["message", "error", "detail"];

/// Failure observed before normalization.
#[derive(Debug)]
pub enum RawFailure {
	/// The server answered with a non-success status.
	Response(ApiResponse),
	/// No response was received.
	Transport(TransportError),
}
impl From<ApiResponse> for RawFailure {
	fn from(response: ApiResponse) -> Self {
		Self::Response(response)
	}
}
impl From<TransportError> for RawFailure {
	fn from(error: TransportError) -> Self {
		Self::Transport(error)
	}
}

/// Normalizes a raw failure.
///
/// Server-supplied message fields win over the transport message, which wins over the generic
/// fallback. The status code is the response status, or [`DEFAULT_STATUS_CODE`] without one.
pub fn normalize(failure: &RawFailure) -> NormalizedError {
	match failure {
		RawFailure::Response(response) => {
			let status_code = response.status.as_u16();
			let message = server_message(&response.body)
				.unwrap_or_else(|| format!("Request failed with status code {status_code}."));

			NormalizedError::new(message, status_code)
		},
		RawFailure::Transport(error) => {
			let message = error.to_string();
			let message =
				if message.trim().is_empty() { GENERIC_ERROR_MESSAGE.to_owned() } else { message };

			NormalizedError::new(message, DEFAULT_STATUS_CODE)
		},
	}
}

/// Extracts the first usable message field from a JSON error body.
fn server_message(body: &[u8]) -> Option<String> {
	let value = serde_json::from_slice::<Value>(body).ok()?;

	message_from_value(&value)
}

fn message_from_value(value: &Value) -> Option<String> {
	let object = value.as_object()?;

	MESSAGE_FIELDS.iter().find_map(|field| match object.get(*field)? {
		Value::String(text) if !text.trim().is_empty() => Some(text.to_owned()),
		// Validation errors arrive as a list of messages.
		Value::Array(items) => {
			let parts = items.iter().filter_map(Value::as_str).collect::<Vec<_>>();

			if parts.is_empty() { None } else { Some(parts.join(", ")) }
		},
		nested @ Value::Object(_) => message_from_value(nested),
		_ => None,
	})
}
