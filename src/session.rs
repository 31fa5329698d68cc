//! Session lifecycle helpers: login, registration, and logout.
//!
//! Login and registration call public endpoints (`skip_auth`) and persist the returned pair
//! through the injected [`TokenStore`](crate::store::TokenStore). Logout calls its endpoint with
//! `skip_refresh`, so an already-expired session never triggers a refresh on the way out, and
//! clears the store regardless of the server's answer.

// crates.io
use http::Method;
use serde::de::IgnoredAny;
// self
use crate::{
	_prelude::*,
	auth::{SessionTokens, TokenGrant},
	client::{ApiClient, RequestBody, RequestOptions},
	http::ApiTransport,
	normalize::DEFAULT_STATUS_CODE,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

/// Email/password credentials accepted by the login endpoint.
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
	/// Account email.
	pub email: String,
	/// Account password; never printed by `Debug`.
	pub password: String,
}
impl Credentials {
	/// Creates a credential pair.
	pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
		Self { email: email.into(), password: password.into() }
	}
}
impl Debug for Credentials {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Credentials")
			.field("email", &self.email)
			.field("password", &"<redacted>")
			.finish()
	}
}

impl<T> ApiClient<T>
where
	T: ?Sized + ApiTransport,
{
	/// Exchanges credentials for a session and stores it.
	pub async fn login<C>(&self, credentials: &C) -> ApiResult<SessionTokens>
	where
		C: ?Sized + Serialize,
	{
		let span = FlowSpan::new(FlowKind::Session, "login");
		let path = self.config.endpoints.login.clone();

		self.open_session(span, &path, credentials).await
	}

	/// Creates an account and stores the session issued for it.
	pub async fn register<P>(&self, payload: &P) -> ApiResult<SessionTokens>
	where
		P: ?Sized + Serialize,
	{
		let span = FlowSpan::new(FlowKind::Session, "register");
		let path = self.config.endpoints.register.clone();

		self.open_session(span, &path, payload).await
	}

	/// Ends the session on the server and clears the token store.
	///
	/// The store is cleared even when the server call fails; the server's error is still
	/// returned so the host can report it.
	pub async fn logout(&self) -> ApiResult<()> {
		const KIND: FlowKind = FlowKind::Session;

		let span = FlowSpan::new(KIND, "logout");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async {
				let path = self.config.endpoints.logout.as_str();
				let outcome = self
					.request::<IgnoredAny>(
						Method::POST,
						path,
						RequestBody::Empty,
						RequestOptions::new().skip_refresh(),
					)
					.await;

				if let Err(e) = self.store.remove_tokens() {
					obs::warn_event(KIND, &format!("failed to clear token store: {e}"));
				}

				outcome.map(|_| ())
			})
			.await;

		record(KIND, &result);

		result
	}

	async fn open_session<B>(&self, span: FlowSpan, path: &str, body: &B) -> ApiResult<SessionTokens>
	where
		B: ?Sized + Serialize,
	{
		const KIND: FlowKind = FlowKind::Session;

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async {
				let grant: TokenGrant =
					self.post(path, body, RequestOptions::new().skip_auth()).await?;

				self.store
					.set_tokens(
						grant.access_token.expose(),
						grant.refresh_token.expose(),
						grant.expires_in,
					)
					.map_err(|e| {
						NormalizedError::new(
							format!("Session could not be persisted: {e}"),
							DEFAULT_STATUS_CODE,
						)
					})?;

				let session = self.store.session().unwrap_or_else(|| {
					SessionTokens::issued_now(grant.access_token, grant.refresh_token, grant.expires_in)
				});

				Ok::<_, NormalizedError>(session)
			})
			.await;

		record(KIND, &result);

		result
	}
}

fn record<V>(kind: FlowKind, result: &ApiResult<V>) {
	match result {
		Ok(_) => obs::record_flow_outcome(kind, FlowOutcome::Success),
		Err(_) => obs::record_flow_outcome(kind, FlowOutcome::Failure),
	}
}
