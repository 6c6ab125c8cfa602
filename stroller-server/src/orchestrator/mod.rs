//! Route-finding orchestration.
//!
//! [`RouteOrchestrator`] drives one attempt end to end:
//!
//! 1. refuse to start while another attempt is loading,
//! 2. validate the request,
//! 3. check the credential,
//! 4. geocode origin and destination concurrently,
//! 5. query the route,
//!
//! and publishes every transition as a [`LookupState`] on a watch channel
//! the UI subscribes to. Failures end in `LookupState::Failure`; the only
//! error `run` itself returns is [`RunError::AlreadyInProgress`].
//!
//! Each started attempt gets an id. Terminal transitions only apply while
//! the id is still current, so once an attempt is cancelled its late
//! completions are ignored. Dropping a `run` future mid-attempt cancels
//! the attempt, so Loading never outlives its caller.

mod state;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use crate::capabilities::{GeocodeError, Geocoder, RouteQuery, RouteQueryError};
use crate::credentials::CredentialStore;
use crate::domain::{Coordinate, RouteRequest, RouteResult};

pub use state::{LookupFailure, LookupState};

/// Error returned synchronously by [`RouteOrchestrator::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RunError {
    /// Another attempt is loading; it continues unaffected
    #[error("a route search is already in progress")]
    AlreadyInProgress,
}

/// Outcome of trying to start an attempt.
enum Start {
    /// Loading, with this attempt id.
    Started(u64),
    /// Rejected before loading; the state is already terminal.
    Rejected(LookupState),
}

/// Drives route lookups and owns the lifecycle state.
pub struct RouteOrchestrator {
    credentials: Arc<CredentialStore>,
    geocoder: Arc<dyn Geocoder>,
    route_query: Arc<dyn RouteQuery>,
    state: watch::Sender<LookupState>,
    /// Id of the most recently started or cancelled attempt. Only changed
    /// while the state lock is held.
    attempt: AtomicU64,
}

impl RouteOrchestrator {
    /// Create an orchestrator in the `Idle` state.
    pub fn new(
        credentials: Arc<CredentialStore>,
        geocoder: Arc<dyn Geocoder>,
        route_query: Arc<dyn RouteQuery>,
    ) -> Self {
        let (state, _) = watch::channel(LookupState::Idle);
        Self {
            credentials,
            geocoder,
            route_query,
            state,
            attempt: AtomicU64::new(0),
        }
    }

    /// The credential store requests are checked against.
    pub fn credentials(&self) -> &Arc<CredentialStore> {
        &self.credentials
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> LookupState {
        self.state.borrow().clone()
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> watch::Receiver<LookupState> {
        self.state.subscribe()
    }

    /// Run one route-finding attempt and return the state it ended in.
    ///
    /// Returns `Err(AlreadyInProgress)` without touching the state if an
    /// attempt is loading. An attempt cancelled while in flight returns
    /// `Failure(Cancelled)` without waiting for its pending lookups.
    #[instrument(skip(self, request), fields(origin = %request.origin(), destination = %request.destination()))]
    pub async fn run(&self, request: RouteRequest) -> Result<LookupState, RunError> {
        let attempt = match self.start(&request)? {
            Start::Started(attempt) => attempt,
            Start::Rejected(state) => return Ok(state),
        };
        info!(attempt, "route search started");
        let _abandon = AbandonOnDrop {
            orchestrator: self,
            attempt,
        };

        if !self.credentials.is_configured() {
            return Ok(self.finish(attempt, LookupState::Failure(LookupFailure::NoCredential)));
        }

        let mut watcher = self.state.subscribe();
        let superseded = watcher
            .wait_for(|state| !state.is_loading() || self.attempt.load(Ordering::SeqCst) != attempt);

        tokio::select! {
            outcome = self.lookup(&request) => {
                let next = match outcome {
                    Ok(result) => LookupState::Success(result),
                    Err(failure) => LookupState::Failure(failure),
                };
                Ok(self.finish(attempt, next))
            }
            _ = superseded => {
                debug!(attempt, "attempt superseded; abandoning pending lookups");
                Ok(LookupState::Failure(LookupFailure::Cancelled))
            }
        }
    }

    /// Cancel the loading attempt, if any.
    ///
    /// Publishes `Failure(Cancelled)` and returns `true`; returns `false`
    /// when nothing was loading.
    pub fn cancel(&self) -> bool {
        let cancelled = self.state.send_if_modified(|state| {
            if !state.is_loading() {
                return false;
            }
            self.attempt.fetch_add(1, Ordering::SeqCst);
            *state = LookupState::Failure(LookupFailure::Cancelled);
            true
        });
        if cancelled {
            info!("route search cancelled");
        }
        cancelled
    }

    /// Check-and-set into `Loading`, or into `Failure(Validation)`.
    fn start(&self, request: &RouteRequest) -> Result<Start, RunError> {
        let mut outcome = Err(RunError::AlreadyInProgress);

        self.state.send_if_modified(|state| {
            if state.is_loading() {
                return false;
            }
            match request.validate() {
                Ok(()) => {
                    let attempt = self.attempt.fetch_add(1, Ordering::SeqCst) + 1;
                    *state = LookupState::Loading;
                    outcome = Ok(Start::Started(attempt));
                }
                Err(e) => {
                    debug!(error = %e, "route request rejected");
                    *state = LookupState::Failure(LookupFailure::Validation(e));
                    outcome = Ok(Start::Rejected(state.clone()));
                }
            }
            true
        });

        if outcome.is_err() {
            warn!("route search already in progress");
        }
        outcome
    }

    /// Publish `next` if `attempt` is still the loading attempt.
    ///
    /// Returns the state this attempt ended in.
    fn finish(&self, attempt: u64, next: LookupState) -> LookupState {
        let applied = self.state.send_if_modified(|state| {
            if !state.is_loading() || self.attempt.load(Ordering::SeqCst) != attempt {
                return false;
            }
            *state = next.clone();
            true
        });

        if !applied {
            debug!(attempt, "stale completion discarded");
            return LookupState::Failure(LookupFailure::Cancelled);
        }

        match &next {
            LookupState::Success(result) => info!(
                attempt,
                duration_minutes = result.duration_minutes,
                options = result.options.len(),
                "route found"
            ),
            LookupState::Failure(failure) => {
                warn!(attempt, reason = failure.reason(), "route search failed")
            }
            _ => {}
        }
        next
    }

    /// End `attempt` as cancelled if it is still the loading attempt.
    fn abandon(&self, attempt: u64) {
        let abandoned = self.state.send_if_modified(|state| {
            if !state.is_loading() || self.attempt.load(Ordering::SeqCst) != attempt {
                return false;
            }
            self.attempt.fetch_add(1, Ordering::SeqCst);
            *state = LookupState::Failure(LookupFailure::Cancelled);
            true
        });
        if abandoned {
            info!(attempt, "route search abandoned by caller");
        }
    }

    /// Geocode both addresses concurrently, then query the route.
    ///
    /// The first geocode failure wins. Lookups run as their own tasks, so a
    /// sibling still pending when the other fails (or when the attempt is
    /// abandoned) runs to completion in the background and is ignored.
    async fn lookup(&self, request: &RouteRequest) -> Result<RouteResult, LookupFailure> {
        let origin = geocode_task(self.geocoder.clone(), request.origin().to_string());
        let destination = geocode_task(self.geocoder.clone(), request.destination().to_string());

        let (from, to) = futures::future::try_join(origin, destination).await?;
        debug!(%from, %to, "both addresses geocoded");

        let route_query = self.route_query.clone();
        let options = request.query_options();
        let handle =
            tokio::spawn(async move { route_query.route_query(from, to, options).await });

        match handle.await {
            Ok(result) => result.map_err(LookupFailure::RouteQuery),
            Err(e) => Err(LookupFailure::RouteQuery(RouteQueryError::new(format!(
                "route query task failed: {e}"
            )))),
        }
    }
}

/// Ends the attempt if the `run` future is dropped while still loading,
/// e.g. when the HTTP client disconnects mid-request.
struct AbandonOnDrop<'a> {
    orchestrator: &'a RouteOrchestrator,
    attempt: u64,
}

impl Drop for AbandonOnDrop<'_> {
    fn drop(&mut self) {
        self.orchestrator.abandon(self.attempt);
    }
}

async fn geocode_task(geocoder: Arc<dyn Geocoder>, address: String) -> Result<Coordinate, LookupFailure> {
    let handle = tokio::spawn(async move { geocoder.geocode(&address).await });

    match handle.await {
        Ok(result) => result.map_err(LookupFailure::Geocode),
        Err(e) => Err(LookupFailure::Geocode(GeocodeError::new(format!(
            "geocoding task failed: {e}"
        )))),
    }
}

#[cfg(test)]
mod run_tests;
