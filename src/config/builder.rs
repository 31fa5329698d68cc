// self
use crate::{
	_prelude::*,
	config::{AuthEndpoints, ClientConfig},
};

/// Errors raised while constructing or validating client configurations.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum ClientConfigError {
	/// Base URL must use HTTP or HTTPS.
	#[error("The base URL must use http or https: {url}.")]
	UnsupportedScheme {
		/// Base URL that failed validation.
		url: String,
	},
	/// Base URL cannot have paths joined onto it.
	#[error("The base URL cannot be used as a base: {url}.")]
	CannotBeABase {
		/// Base URL that failed validation.
		url: String,
	},
	/// Endpoint paths must be absolute.
	#[error("The {endpoint} path must start with '/': {path}.")]
	RelativeEndpointPath {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Path that failed validation.
		path: String,
	},
	/// Timeouts must be strictly positive.
	#[error("The request timeout must be positive.")]
	NonPositiveTimeout,
}

/// Builder for [`ClientConfig`] values.
#[derive(Debug)]
pub struct ClientConfigBuilder {
	/// API base URL.
	pub base_url: Url,
	/// Auth endpoint paths.
	pub endpoints: AuthEndpoints,
	/// Optional per-call timeout.
	pub timeout: Option<Duration>,
	/// Optional `User-Agent` header.
	pub user_agent: Option<String>,
}
impl ClientConfigBuilder {
	/// Creates a new builder seeded with the provided base URL.
	pub fn new(base_url: Url) -> Self {
		Self { base_url, endpoints: AuthEndpoints::default(), timeout: None, user_agent: None }
	}

	/// Overrides the refresh endpoint path.
	pub fn refresh_path(mut self, path: impl Into<String>) -> Self {
		self.endpoints.refresh = path.into();

		self
	}

	/// Overrides the login endpoint path.
	pub fn login_path(mut self, path: impl Into<String>) -> Self {
		self.endpoints.login = path.into();

		self
	}

	/// Overrides the registration endpoint path.
	pub fn register_path(mut self, path: impl Into<String>) -> Self {
		self.endpoints.register = path.into();

		self
	}

	/// Overrides the logout endpoint path.
	pub fn logout_path(mut self, path: impl Into<String>) -> Self {
		self.endpoints.logout = path.into();

		self
	}

	/// Sets the per-call transport timeout.
	pub fn timeout(mut self, timeout: Duration) -> Self {
		self.timeout = Some(timeout);

		self
	}

	/// Sets the `User-Agent` header applied by the default transport.
	pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
		self.user_agent = Some(user_agent.into());

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<ClientConfig, ClientConfigError> {
		let config = ClientConfig {
			base_url: self.base_url,
			endpoints: self.endpoints,
			timeout: self.timeout,
			user_agent: self.user_agent,
		};

		config.validate()?;

		Ok(config)
	}
}

impl ClientConfig {
	/// Validates invariants for the configuration.
	fn validate(&self) -> Result<(), ClientConfigError> {
		if !matches!(self.base_url.scheme(), "http" | "https") {
			return Err(ClientConfigError::UnsupportedScheme { url: self.base_url.to_string() });
		}
		if self.base_url.cannot_be_a_base() {
			return Err(ClientConfigError::CannotBeABase { url: self.base_url.to_string() });
		}
		if self.timeout.is_some_and(|timeout| !timeout.is_positive()) {
			return Err(ClientConfigError::NonPositiveTimeout);
		}

		validate_path("refresh", &self.endpoints.refresh)?;
		validate_path("login", &self.endpoints.login)?;
		validate_path("register", &self.endpoints.register)?;
		validate_path("logout", &self.endpoints.logout)?;

		Ok(())
	}
}

fn validate_path(name: &'static str, path: &str) -> Result<(), ClientConfigError> {
	if path.starts_with('/') {
		Ok(())
	} else {
		Err(ClientConfigError::RelativeEndpointPath { endpoint: name, path: path.to_owned() })
	}
}
