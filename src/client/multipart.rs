//! Buffered `multipart/form-data` bodies.
//!
//! The form is encoded into memory before dispatch, so a request replayed after a refresh sends
//! the exact bytes and boundary of the first attempt.

// std
use std::sync::atomic::{AtomicU64, Ordering};
// crates.io
use http::HeaderValue;
// self
use crate::{_prelude::*, client::RequestBody};

static BOUNDARY_SEQ: AtomicU64 = AtomicU64::new(0);

/// Multipart form made of text fields and file parts.
#[derive(Clone, Debug)]
pub struct MultipartForm {
	boundary: String,
	parts: Vec<Part>,
}
impl MultipartForm {
	/// Creates an empty form with a fresh boundary.
	pub fn new() -> Self {
		let nanos = OffsetDateTime::now_utc().unix_timestamp_nanos();
		let seq = BOUNDARY_SEQ.fetch_add(1, Ordering::Relaxed);

		Self { boundary: format!("booking-client-{nanos:x}-{seq:x}"), parts: Vec::new() }
	}

	/// Boundary separating the parts.
	pub fn boundary(&self) -> &str {
		&self.boundary
	}

	/// `multipart/form-data` content type carrying the boundary.
	pub fn content_type(&self) -> String {
		format!("multipart/form-data; boundary={}", self.boundary)
	}

	/// Appends a text field.
	pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.parts.push(Part {
			name: name.into(),
			filename: None,
			content_type: None,
			bytes: value.into().into_bytes(),
		});

		self
	}

	/// Appends a file part.
	pub fn file(
		mut self,
		name: impl Into<String>,
		filename: impl Into<String>,
		content_type: impl Into<String>,
		bytes: impl Into<Vec<u8>>,
	) -> Self {
		self.parts.push(Part {
			name: name.into(),
			filename: Some(filename.into()),
			content_type: Some(content_type.into()),
			bytes: bytes.into(),
		});

		self
	}

	/// Encodes every part followed by the closing delimiter.
	pub fn encode(&self) -> Vec<u8> {
		let mut out = Vec::new();

		for part in &self.parts {
			out.extend_from_slice(format!("--{}\r\n", self.boundary).as_bytes());
			out.extend_from_slice(
				format!("Content-Disposition: form-data; name=\"{}\"", quote(&part.name)).as_bytes(),
			);

			if let Some(filename) = &part.filename {
				out.extend_from_slice(format!("; filename=\"{}\"", quote(filename)).as_bytes());
			}

			out.extend_from_slice(b"\r\n");

			if let Some(content_type) = &part.content_type {
				let content_type = content_type.replace(['\r', '\n'], "");

				out.extend_from_slice(format!("Content-Type: {content_type}\r\n").as_bytes());
			}

			out.extend_from_slice(b"\r\n");
			out.extend_from_slice(&part.bytes);
			out.extend_from_slice(b"\r\n");
		}

		out.extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());

		out
	}
}
impl Default for MultipartForm {
	fn default() -> Self {
		Self::new()
	}
}

#[derive(Clone, Debug)]
struct Part {
	name: String,
	filename: Option<String>,
	content_type: Option<String>,
	bytes: Vec<u8>,
}

impl RequestBody {
	/// Encodes `form` into a buffered body tagged with its boundary-bearing content type.
	pub fn multipart(form: &MultipartForm) -> Self {
		// The boundary is ASCII alphanumerics and dashes, so the header value is always valid.
		let content_type = HeaderValue::from_str(&form.content_type())
			.unwrap_or_else(|_| HeaderValue::from_static("multipart/form-data"));

		Self::binary(form.encode(), Some(content_type))
	}
}

fn quote(value: &str) -> String {
	value.replace('"', "%22").replace('\r', "%0D").replace('\n', "%0A")
}
