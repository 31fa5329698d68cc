//! Session token pair owned by a [`TokenStore`](crate::store::TokenStore).

// self
use crate::{_prelude::*, auth::TokenSecret};

/// Access/refresh pair plus the instant the access token stops being valid.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionTokens {
	/// Short-lived bearer credential.
	pub access_token: TokenSecret,
	/// Longer-lived credential exchanged during refresh.
	pub refresh_token: TokenSecret,
	/// Expiry instant derived from the issuing response's `expiresIn`.
	#[serde(with = "time::serde::rfc3339")]
	pub expires_at: OffsetDateTime,
}
impl SessionTokens {
	/// Builds a session whose access token expires `expires_in_secs` after `issued_at`.
	pub fn issued_at(
		access_token: impl Into<TokenSecret>,
		refresh_token: impl Into<TokenSecret>,
		expires_in_secs: u64,
		issued_at: OffsetDateTime,
	) -> Self {
		let lifetime = Duration::seconds(i64::try_from(expires_in_secs).unwrap_or(i64::MAX));

		Self {
			access_token: access_token.into(),
			refresh_token: refresh_token.into(),
			expires_at: issued_at.saturating_add(lifetime),
		}
	}

	/// Builds a session issued now.
	pub fn issued_now(
		access_token: impl Into<TokenSecret>,
		refresh_token: impl Into<TokenSecret>,
		expires_in_secs: u64,
	) -> Self {
		Self::issued_at(access_token, refresh_token, expires_in_secs, OffsetDateTime::now_utc())
	}

	/// Returns `true` once the access token passed its expiry instant.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		instant >= self.expires_at
	}

	/// Convenience helper that checks expiry using the current UTC instant.
	pub fn is_expired(&self) -> bool {
		self.is_expired_at(OffsetDateTime::now_utc())
	}

	/// Remaining access-token lifetime at `instant`, clamped at zero.
	pub fn remaining_at(&self, instant: OffsetDateTime) -> Duration {
		let remaining = self.expires_at - instant;

		if remaining.is_negative() { Duration::ZERO } else { remaining }
	}
}
