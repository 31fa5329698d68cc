//! Client configuration: API base URL, auth endpoint paths, and transport knobs.
//!
//! Configurations are assembled with [`ClientConfig::builder`] and validated once on
//! [`ClientConfigBuilder::build`], so a constructed [`ClientConfig`] always carries a usable
//! base URL and well-formed endpoint paths.

/// Builder API for assembling client configurations.
pub mod builder;

pub use builder::*;

// self
use crate::_prelude::*;

/// Default refresh endpoint path.
pub const DEFAULT_REFRESH_PATH: &str = "/auth/refresh";
/// Default login endpoint path.
pub const DEFAULT_LOGIN_PATH: &str = "/auth/login";
/// Default registration endpoint path.
pub const DEFAULT_REGISTER_PATH: &str = "/auth/register";
/// Default logout endpoint path.
pub const DEFAULT_LOGOUT_PATH: &str = "/auth/logout";

/// Auth endpoint paths, relative to [`ClientConfig::base_url`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthEndpoints {
	/// Exchanges a refresh token for a new pair.
	pub refresh: String,
	/// Issues a session for credentials.
	pub login: String,
	/// Creates an account and issues a session.
	pub register: String,
	/// Ends the server-side session.
	pub logout: String,
}
impl Default for AuthEndpoints {
	fn default() -> Self {
		Self {
			refresh: DEFAULT_REFRESH_PATH.into(),
			login: DEFAULT_LOGIN_PATH.into(),
			register: DEFAULT_REGISTER_PATH.into(),
			logout: DEFAULT_LOGOUT_PATH.into(),
		}
	}
}

/// Immutable client configuration consumed by [`ApiClient`](crate::client::ApiClient).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
	/// Fixed API base every request path is resolved against.
	pub base_url: Url,
	/// Auth endpoint paths.
	pub endpoints: AuthEndpoints,
	/// Per-call transport timeout; `None` leaves the transport default in place.
	pub timeout: Option<Duration>,
	/// Optional `User-Agent` header applied by the default transport.
	pub user_agent: Option<String>,
}
impl ClientConfig {
	/// Creates a new builder rooted at the provided base URL.
	pub fn builder(base_url: Url) -> ClientConfigBuilder {
		ClientConfigBuilder::new(base_url)
	}

	/// Resolves a request path against the base URL, preserving any base path prefix.
	///
	/// Absolute `http(s)` URLs are used verbatim.
	pub fn url_for(&self, path: &str) -> Result<Url, url::ParseError> {
		if path.starts_with("http://") || path.starts_with("https://") {
			return Url::parse(path);
		}

		let base = self.base_url.as_str().trim_end_matches('/');
		let path = path.trim_start_matches('/');

		Url::parse(&format!("{base}/{path}"))
	}
}
