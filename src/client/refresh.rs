//! Single-flight access-token refresh with a waiter queue.
//!
//! The first request that observes a refreshable 401 becomes the cycle's leader: it flips the
//! coordinator's `in_progress` flag and calls the refresh endpoint directly on the transport.
//! Requests that observe a 401 while the flag is set enqueue a one-shot waiter instead. When
//! the leader settles, the flag is cleared and every waiter receives the same outcome inside one
//! critical section, so no request is replayed with a stale token or left hanging.

mod metrics;

pub use metrics::RefreshMetrics;

// std
use std::mem;
// crates.io
use http::{HeaderMap, HeaderValue, Method, header};
use tokio::sync::oneshot;
// self
use crate::{
	_prelude::*,
	auth::{RefreshRequest, TokenGrant, TokenSecret},
	client::ApiClient,
	error::TransportError,
	http::{ApiTransport, HttpRequest},
	normalize::{self, RawFailure},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	store::StoreError,
};

type RefreshOutcome = Result<TokenSecret, NormalizedError>;

/// Message delivered to waiters when the leader was dropped before settling.
const REFRESH_INTERRUPTED_MESSAGE: &str = "Token refresh was interrupted before it completed.";

/// Why a refresh cycle failed; logged, then collapsed into a session-expired error.
#[derive(Debug, ThisError)]
pub(crate) enum RefreshError {
	#[error("No refresh token is stored.")]
	MissingRefreshToken,
	#[error("Refresh endpoint rejected the refresh token: {0}")]
	Rejected(NormalizedError),
	#[error(transparent)]
	Transport(#[from] TransportError),
	#[error("Refresh endpoint returned a malformed token pair.")]
	MalformedGrant(#[source] serde_path_to_error::Error<serde_json::Error>),
	#[error("Refreshed tokens could not be persisted: {0}")]
	Storage(#[from] StoreError),
}

/// Shared `in_progress` flag plus the queue of requests waiting on the current cycle.
#[derive(Debug, Default)]
pub(crate) struct RefreshCoordinator {
	state: Mutex<RefreshState>,
}
impl RefreshCoordinator {
	/// Joins the current cycle, or starts one when none is running.
	///
	/// The check-and-set happens under one lock, so two threads can never both lead.
	pub(crate) fn join(&self) -> Ticket<'_> {
		let mut state = self.state.lock();

		if state.in_progress {
			let (tx, rx) = oneshot::channel();

			state.waiters.push(tx);

			Ticket::Waiter(rx)
		} else {
			state.in_progress = true;

			Ticket::Leader(LeaderGuard { coordinator: self, settled: false })
		}
	}

	/// Returns `true` while a refresh call is in flight.
	pub(crate) fn in_progress(&self) -> bool {
		self.state.lock().in_progress
	}

	/// Clears the flag and hands `outcome` to every waiter; returns how many were settled.
	fn finish(&self, outcome: &RefreshOutcome) -> usize {
		let waiters = {
			let mut state = self.state.lock();

			state.in_progress = false;

			mem::take(&mut state.waiters)
		};
		let settled = waiters.len();

		for waiter in waiters {
			// A waiter whose caller went away simply drops its receiver.
			let _ = waiter.send(outcome.clone());
		}

		settled
	}
}

#[derive(Debug, Default)]
struct RefreshState {
	in_progress: bool,
	waiters: Vec<oneshot::Sender<RefreshOutcome>>,
}

/// Role assigned to a request that observed a refreshable 401.
pub(crate) enum Ticket<'a> {
	/// Runs the refresh call and settles the cycle.
	Leader(LeaderGuard<'a>),
	/// Waits for the leader's outcome.
	Waiter(oneshot::Receiver<RefreshOutcome>),
}

/// Leadership of one refresh cycle.
///
/// Dropping the guard without [`settle`](LeaderGuard::settle) (e.g. the leader's future was
/// cancelled) still clears the flag and rejects the waiters.
pub(crate) struct LeaderGuard<'a> {
	coordinator: &'a RefreshCoordinator,
	settled: bool,
}
impl LeaderGuard<'_> {
	pub(crate) fn settle(mut self, outcome: &RefreshOutcome) -> usize {
		self.settled = true;

		self.coordinator.finish(outcome)
	}
}
impl Drop for LeaderGuard<'_> {
	fn drop(&mut self) {
		if !self.settled {
			self.coordinator.finish(&Err(NormalizedError::new(REFRESH_INTERRUPTED_MESSAGE, 401)));
		}
	}
}

impl<T> ApiClient<T>
where
	T: ?Sized + ApiTransport,
{
	/// Obtains a fresh access token for a request that observed a refreshable 401, either by
	/// leading a new refresh cycle or by waiting on the one in flight.
	pub(crate) async fn obtain_fresh_token(&self) -> RefreshOutcome {
		match self.coordinator.join() {
			Ticket::Leader(leader) => self.lead_refresh(leader).await,
			Ticket::Waiter(waiter) => {
				self.refresh_metrics.record_queued();
				obs::debug_event(FlowKind::Refresh, "request queued behind in-flight refresh");

				waiter.await.unwrap_or_else(|_| {
					Err(NormalizedError::new(REFRESH_INTERRUPTED_MESSAGE, 401))
				})
			},
		}
	}

	async fn lead_refresh(&self, leader: LeaderGuard<'_>) -> RefreshOutcome {
		const KIND: FlowKind = FlowKind::Refresh;

		let span = FlowSpan::new(KIND, "lead_refresh");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);
		self.refresh_metrics.record_attempt();

		let outcome = span
			.instrument(async {
				let grant = self.request_grant().await?;

				self.store.set_tokens(
					grant.access_token.expose(),
					grant.refresh_token.expose(),
					grant.expires_in,
				)?;

				Ok::<_, RefreshError>(grant.access_token)
			})
			.await;

		match outcome {
			Ok(access_token) => {
				let released = leader.settle(&Ok(access_token.clone()));

				obs::debug_event(
					KIND,
					&format!("refresh succeeded; releasing {released} queued request(s)"),
				);
				obs::record_flow_outcome(KIND, FlowOutcome::Success);
				obs::record_refresh_released(FlowOutcome::Success, released);
				self.refresh_metrics.record_success();

				Ok(access_token)
			},
			Err(reason) => {
				let err = NormalizedError::session_expired();

				obs::warn_event(KIND, &format!("refresh failed, clearing session: {reason}"));

				// Cleared before the flag drops so a later 401 cannot reuse the dead pair.
				if let Err(store_err) = self.store.remove_tokens() {
					obs::warn_event(KIND, &format!("failed to clear token store: {store_err}"));
				}

				let released = leader.settle(&Err(err.clone()));

				obs::record_flow_outcome(KIND, FlowOutcome::Failure);
				obs::record_refresh_released(FlowOutcome::Failure, released);
				self.refresh_metrics.record_failure();

				Err(err)
			},
		}
	}

	/// Calls the refresh endpoint directly on the transport, bypassing the interceptors.
	async fn request_grant(&self) -> Result<TokenGrant, RefreshError> {
		let refresh_token = self.store.refresh_token().ok_or(RefreshError::MissingRefreshToken)?;
		let url = self.config.url_for(&self.config.endpoints.refresh).map_err(|e| {
			TransportError::InvalidRequest { message: format!("Invalid refresh endpoint: {e}") }
		})?;
		let body = serde_json::to_vec(&RefreshRequest { refresh_token: refresh_token.expose() })
			.map_err(|e| TransportError::InvalidRequest { message: e.to_string() })?;
		let mut headers = HeaderMap::new();

		headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
		headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));

		let response =
			self.transport.execute(HttpRequest { method: Method::POST, url, headers, body }).await?;

		if !response.is_success() {
			return Err(RefreshError::Rejected(normalize::normalize(&RawFailure::Response(
				response,
			))));
		}

		response.json().map_err(RefreshError::MalformedGrant)
	}
}
