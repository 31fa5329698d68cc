//! Per-call request options.

// crates.io
use http::{HeaderMap, HeaderName, HeaderValue};
// self
use crate::_prelude::*;

/// Flags and extras applied to a single call.
///
/// ```
/// use booking_client::client::RequestOptions;
///
/// let public = RequestOptions::new().skip_auth().query("city", "Lisbon");
///
/// assert!(public.skip_auth);
/// assert!(!public.skip_refresh);
/// ```
#[derive(Clone, Debug, Default)]
pub struct RequestOptions {
	/// Do not attach a bearer token and never refresh on 401; used for public endpoints.
	pub skip_auth: bool,
	/// Attach a bearer token when present but never refresh on 401.
	pub skip_refresh: bool,
	/// Extra headers merged into the outbound request.
	pub headers: HeaderMap,
	/// Query pairs appended to the request URL.
	pub query: Vec<(String, String)>,
}
impl RequestOptions {
	/// Creates options with every flag cleared.
	pub fn new() -> Self {
		Self::default()
	}

	/// Marks the call as public.
	pub fn skip_auth(mut self) -> Self {
		self.skip_auth = true;

		self
	}

	/// Keeps the bearer token but disables refresh-on-401.
	pub fn skip_refresh(mut self) -> Self {
		self.skip_refresh = true;

		self
	}

	/// Adds (or replaces) a header.
	pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
		self.headers.insert(name, value);

		self
	}

	/// Appends a query pair.
	pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
		self.query.push((key.into(), value.to_string()));

		self
	}
}
