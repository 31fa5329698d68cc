//! Thread-safe in-memory [`TokenStore`] implementation for local development and tests.

// self
use crate::{
	_prelude::*,
	auth::{SessionTokens, TokenSecret},
	store::{StoreError, TokenStore},
};

type SessionSlot = Arc<RwLock<Option<SessionTokens>>>;

/// Thread-safe storage backend that keeps the session in-process.
///
/// Clones share the same slot, so a host can keep one handle while the client holds another.
#[derive(Clone, Debug, Default)]
pub struct MemoryTokenStore(SessionSlot);
impl MemoryTokenStore {
	/// Creates a store seeded with an existing session.
	pub fn with_session(session: SessionTokens) -> Self {
		Self(Arc::new(RwLock::new(Some(session))))
	}
}
impl TokenStore for MemoryTokenStore {
	fn access_token(&self) -> Option<TokenSecret> {
		self.0.read().as_ref().map(|session| session.access_token.clone())
	}

	fn refresh_token(&self) -> Option<TokenSecret> {
		self.0.read().as_ref().map(|session| session.refresh_token.clone())
	}

	fn set_tokens(
		&self,
		access_token: &str,
		refresh_token: &str,
		expires_in_secs: u64,
	) -> Result<(), StoreError> {
		let session = SessionTokens::issued_now(access_token, refresh_token, expires_in_secs);

		*self.0.write() = Some(session);

		Ok(())
	}

	fn remove_tokens(&self) -> Result<(), StoreError> {
		self.0.write().take();

		Ok(())
	}

	fn session(&self) -> Option<SessionTokens> {
		self.0.read().clone()
	}
}
