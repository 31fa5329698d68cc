//! Token store contract and built-in store implementations.
//!
//! The client never owns session state: it reads the current pair through [`TokenStore`] and,
//! after a refresh, instructs the store to overwrite it in a single [`TokenStore::set_tokens`]
//! call. Hosts inject the store at construction time, typically as `Arc<dyn TokenStore>`.

pub mod file;
pub mod memory;

pub use file::FileTokenStore;
pub use memory::MemoryTokenStore;

// self
use crate::{
	_prelude::*,
	auth::{SessionTokens, TokenSecret},
};

/// Storage backend contract for the active session's token pair.
///
/// Implementations use interior mutability; every method is called through a shared reference
/// and may be invoked concurrently from several in-flight requests.
pub trait TokenStore
where
	Self: Send + Sync,
{
	/// Returns the current access token, if a session is active.
	fn access_token(&self) -> Option<TokenSecret>;

	/// Returns the current refresh token, if a session is active.
	fn refresh_token(&self) -> Option<TokenSecret>;

	/// Atomically replaces the stored pair; the access token expires `expires_in_secs` from now.
	fn set_tokens(
		&self,
		access_token: &str,
		refresh_token: &str,
		expires_in_secs: u64,
	) -> Result<(), StoreError>;

	/// Clears every stored token (logout).
	fn remove_tokens(&self) -> Result<(), StoreError>;

	/// Returns the full session, including expiry, when the backend tracks it.
	fn session(&self) -> Option<SessionTokens> {
		None
	}
}

/// Error type produced by [`TokenStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}
