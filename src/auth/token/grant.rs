//! Wire payloads exchanged with the auth endpoints.

// self
use crate::{_prelude::*, auth::TokenSecret};

/// Body posted to the refresh endpoint.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest<'a> {
	/// Refresh token currently held by the store.
	pub refresh_token: &'a str,
}

/// Token pair returned by the refresh, login, and registration endpoints.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenGrant {
	/// Newly issued access token.
	pub access_token: TokenSecret,
	/// Rotated refresh token.
	pub refresh_token: TokenSecret,
	/// Access-token lifetime in seconds.
	pub expires_in: u64,
}
impl TokenGrant {
	/// Returns the access-token lifetime as a [`Duration`], saturating on overflow.
	pub fn lifetime(&self) -> Duration {
		Duration::seconds(i64::try_from(self.expires_in).unwrap_or(i64::MAX))
	}
}
