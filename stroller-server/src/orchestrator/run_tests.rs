//! Unit tests for the route orchestration state machine.

use super::*;
use crate::capabilities::{MockGeocoder, MockRouteQuery};
use crate::capabilities::mock::MockRouteQueryConfig;
use crate::credentials::{MemoryStorage, PLACEHOLDER_KEY};
use crate::domain::{Accessibility, RouteOption, RouteQueryOptions};
use async_trait::async_trait;
use proptest::prelude::*;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

fn coord(lat: f64, lon: f64) -> Coordinate {
    Coordinate::new(lat, lon).unwrap()
}

fn sample_result() -> RouteResult {
    RouteResult {
        duration_minutes: 32,
        distance_miles: 4.2,
        transfer_count: 1,
        accessibility: Accessibility {
            stroller_friendly: true,
            has_elevators: true,
        },
        options: vec![
            RouteOption::new(
                "L Train",
                "Manhattan-bound",
                vec!["Bedford Ave".into(), "Union Square".into()],
            )
            .unwrap(),
            RouteOption::new("Q", "Coney Island-bound", vec!["Union Square".into()]).unwrap(),
        ],
    }
}

fn credentials(key: Option<&str>) -> Arc<CredentialStore> {
    let store = CredentialStore::load_with_fallback(Arc::new(MemoryStorage::new()), PLACEHOLDER_KEY);
    if let Some(key) = key {
        store.set(key).unwrap();
    }
    Arc::new(store)
}

/// A latch that blocks waiters until opened.
#[derive(Clone)]
struct Gate(Arc<watch::Sender<bool>>);

impl Gate {
    fn new() -> Self {
        Gate(Arc::new(watch::channel(false).0))
    }

    fn open(&self) {
        self.0.send_replace(true);
    }

    async fn wait(&self) {
        let mut rx = self.0.subscribe();
        let _ = rx.wait_for(|open| *open).await;
    }
}

/// Geocoder double: scripted answers per address, optional gates, call log.
#[derive(Default)]
struct ScriptedGeocoder {
    answers: HashMap<String, Result<Coordinate, GeocodeError>>,
    gates: HashMap<String, Gate>,
    calls: Mutex<Vec<String>>,
    completed: Mutex<Vec<String>>,
}

impl ScriptedGeocoder {
    fn answer(mut self, address: &str, answer: Result<Coordinate, GeocodeError>) -> Self {
        self.answers.insert(address.to_string(), answer);
        self
    }

    fn gate(mut self, address: &str, gate: &Gate) -> Self {
        self.gates.insert(address.to_string(), gate.clone());
        self
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn completed(&self) -> Vec<String> {
        self.completed.lock().unwrap().clone()
    }
}

#[async_trait]
impl Geocoder for ScriptedGeocoder {
    async fn geocode(&self, address: &str) -> Result<Coordinate, GeocodeError> {
        self.calls.lock().unwrap().push(address.to_string());
        if let Some(gate) = self.gates.get(address) {
            gate.wait().await;
        }
        self.completed.lock().unwrap().push(address.to_string());
        self.answers
            .get(address)
            .cloned()
            .unwrap_or_else(|| Ok(coord(40.7128, -74.0060)))
    }
}

/// Route query double: fixed answer, optional gate, call log.
struct ScriptedRouteQuery {
    answer: Result<RouteResult, RouteQueryError>,
    gate: Option<Gate>,
    calls: Mutex<Vec<(Coordinate, Coordinate, RouteQueryOptions)>>,
}

impl ScriptedRouteQuery {
    fn ok(result: RouteResult) -> Self {
        Self {
            answer: Ok(result),
            gate: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn err(message: &str) -> Self {
        Self {
            answer: Err(RouteQueryError::new(message)),
            gate: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn gated(mut self, gate: &Gate) -> Self {
        self.gate = Some(gate.clone());
        self
    }

    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl RouteQuery for ScriptedRouteQuery {
    async fn route_query(
        &self,
        from: Coordinate,
        to: Coordinate,
        options: RouteQueryOptions,
    ) -> Result<RouteResult, RouteQueryError> {
        self.calls.lock().unwrap().push((from, to, options));
        if let Some(gate) = &self.gate {
            gate.wait().await;
        }
        self.answer.clone()
    }
}

fn orchestrator(
    credentials: Arc<CredentialStore>,
    geocoder: &Arc<ScriptedGeocoder>,
    route_query: &Arc<ScriptedRouteQuery>,
) -> Arc<RouteOrchestrator> {
    Arc::new(RouteOrchestrator::new(
        credentials,
        geocoder.clone(),
        route_query.clone(),
    ))
}

/// Let spawned tasks make progress on the current-thread runtime.
async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}

async fn wait_for_loading(orch: &RouteOrchestrator) {
    let mut rx = orch.subscribe();
    rx.wait_for(LookupState::is_loading).await.unwrap();
}

#[tokio::test]
async fn starts_idle() {
    let geocoder = Arc::new(ScriptedGeocoder::default());
    let query = Arc::new(ScriptedRouteQuery::ok(sample_result()));
    let orch = orchestrator(credentials(Some("abc")), &geocoder, &query);

    assert_eq!(orch.state(), LookupState::Idle);
    assert_eq!(*orch.subscribe().borrow(), LookupState::Idle);
}

#[tokio::test]
async fn success_publishes_result_unchanged() {
    let from = coord(40.7172, -73.9567);
    let to = coord(40.7359, -73.9911);
    let geocoder = Arc::new(
        ScriptedGeocoder::default()
            .answer("Main St", Ok(from))
            .answer("Union Sq", Ok(to)),
    );
    let query = Arc::new(ScriptedRouteQuery::ok(sample_result()));
    let orch = orchestrator(credentials(Some("abc")), &geocoder, &query);

    let request = RouteRequest::new("Main St", "Union Sq").with_elevator_access(true);
    let state = orch.run(request).await.unwrap();

    assert_eq!(state, LookupState::Success(sample_result()));
    assert_eq!(orch.state(), state);

    let calls = query.calls.lock().unwrap().clone();
    assert_eq!(
        calls,
        vec![(
            from,
            to,
            RouteQueryOptions {
                stroller_accessible: false,
                elevator_access: true,
            }
        )]
    );
}

#[tokio::test]
async fn addresses_are_trimmed_before_geocoding() {
    let geocoder = Arc::new(ScriptedGeocoder::default());
    let query = Arc::new(ScriptedRouteQuery::ok(sample_result()));
    let orch = orchestrator(credentials(Some("abc")), &geocoder, &query);

    orch.run(RouteRequest::new("  Main St ", "\tUnion Sq"))
        .await
        .unwrap();

    let mut calls = geocoder.calls();
    calls.sort();
    assert_eq!(calls, vec!["Main St".to_string(), "Union Sq".to_string()]);
}

#[tokio::test]
async fn missing_credential_fails_without_lookups() {
    let geocoder = Arc::new(ScriptedGeocoder::default());
    let query = Arc::new(ScriptedRouteQuery::ok(sample_result()));
    let orch = orchestrator(credentials(None), &geocoder, &query);

    let state = orch.run(RouteRequest::new("Main St", "Union Sq")).await.unwrap();

    assert_eq!(state, LookupState::Failure(LookupFailure::NoCredential));
    assert_eq!(state.failure().unwrap().reason(), "no-credential");
    assert!(geocoder.calls().is_empty());
    assert_eq!(query.call_count(), 0);
}

#[tokio::test]
async fn placeholder_credential_fails_without_lookups() {
    let geocoder = Arc::new(ScriptedGeocoder::default());
    let query = Arc::new(ScriptedRouteQuery::ok(sample_result()));
    let orch = orchestrator(credentials(Some(PLACEHOLDER_KEY)), &geocoder, &query);

    let state = orch.run(RouteRequest::new("Main St", "Union Sq")).await.unwrap();

    assert_eq!(state, LookupState::Failure(LookupFailure::NoCredential));
    assert!(geocoder.calls().is_empty());
}

#[tokio::test]
async fn credential_checked_at_dispatch_time() {
    let geocoder = Arc::new(ScriptedGeocoder::default());
    let query = Arc::new(ScriptedRouteQuery::ok(sample_result()));
    let creds = credentials(None);
    let orch = orchestrator(creds.clone(), &geocoder, &query);

    let first = orch.run(RouteRequest::new("a", "b")).await.unwrap();
    assert_eq!(first.failure(), Some(&LookupFailure::NoCredential));

    creds.set("abc").unwrap();
    let second = orch.run(RouteRequest::new("a", "b")).await.unwrap();
    assert!(second.result().is_some());
}

#[tokio::test]
async fn geocode_failure_skips_route_query() {
    let geocoder = Arc::new(
        ScriptedGeocoder::default().answer("Nowhere", Err(GeocodeError::new("Address not found: Nowhere"))),
    );
    let query = Arc::new(ScriptedRouteQuery::ok(sample_result()));
    let orch = orchestrator(credentials(Some("abc")), &geocoder, &query);

    let state = orch.run(RouteRequest::new("Nowhere", "Union Sq")).await.unwrap();

    assert_eq!(
        state.failure().map(LookupFailure::reason),
        Some("Address not found: Nowhere")
    );
    assert_eq!(query.call_count(), 0);
}

#[tokio::test]
async fn first_geocode_failure_wins_and_sibling_settles() {
    let origin_gate = Gate::new();
    let geocoder = Arc::new(
        ScriptedGeocoder::default()
            .gate("Main St", &origin_gate)
            .answer("Nowhere", Err(GeocodeError::new("destination unknown"))),
    );
    let query = Arc::new(ScriptedRouteQuery::ok(sample_result()));
    let orch = orchestrator(credentials(Some("abc")), &geocoder, &query);

    // Origin is still pending when the destination fails.
    let state = orch.run(RouteRequest::new("Main St", "Nowhere")).await.unwrap();
    assert_eq!(state.failure().map(LookupFailure::reason), Some("destination unknown"));
    assert!(!geocoder.completed().contains(&"Main St".to_string()));

    // The detached origin lookup still runs to completion, without effect.
    origin_gate.open();
    settle().await;
    assert!(geocoder.completed().contains(&"Main St".to_string()));
    assert_eq!(orch.state(), state);
    assert_eq!(query.call_count(), 0);
}

#[tokio::test]
async fn geocodes_run_concurrently() {
    let gate = Gate::new();
    let geocoder = Arc::new(
        ScriptedGeocoder::default()
            .gate("Main St", &gate)
            .gate("Union Sq", &gate),
    );
    let query = Arc::new(ScriptedRouteQuery::ok(sample_result()));
    let orch = orchestrator(credentials(Some("abc")), &geocoder, &query);

    let running = {
        let orch = orch.clone();
        tokio::spawn(async move { orch.run(RouteRequest::new("Main St", "Union Sq")).await })
    };

    settle().await;
    // Both lookups are in flight before either has finished.
    assert_eq!(geocoder.calls().len(), 2);
    assert!(geocoder.completed().is_empty());

    gate.open();
    let state = running.await.unwrap().unwrap();
    assert_eq!(state, LookupState::Success(sample_result()));
}

#[tokio::test]
async fn route_query_failure_is_reported() {
    let geocoder = Arc::new(ScriptedGeocoder::default());
    let query = Arc::new(ScriptedRouteQuery::err("Failed to fetch transit data"));
    let orch = orchestrator(credentials(Some("abc")), &geocoder, &query);

    let state = orch.run(RouteRequest::new("Main St", "Union Sq")).await.unwrap();

    assert_eq!(
        state,
        LookupState::Failure(LookupFailure::RouteQuery(RouteQueryError::new(
            "Failed to fetch transit data"
        )))
    );
}

#[tokio::test]
async fn run_while_loading_is_rejected() {
    let gate = Gate::new();
    let geocoder = Arc::new(ScriptedGeocoder::default());
    let query = Arc::new(ScriptedRouteQuery::ok(sample_result()).gated(&gate));
    let orch = orchestrator(credentials(Some("abc")), &geocoder, &query);

    let running = {
        let orch = orch.clone();
        tokio::spawn(async move { orch.run(RouteRequest::new("Main St", "Union Sq")).await })
    };
    wait_for_loading(&orch).await;

    let second = orch.run(RouteRequest::new("Elsewhere", "Anywhere")).await;
    assert_eq!(second, Err(RunError::AlreadyInProgress));
    assert!(orch.state().is_loading());

    // An invalid request can't clobber the in-flight attempt either.
    let invalid = orch.run(RouteRequest::new("", "")).await;
    assert_eq!(invalid, Err(RunError::AlreadyInProgress));
    assert!(orch.state().is_loading());

    gate.open();
    let first = running.await.unwrap().unwrap();
    assert_eq!(first, LookupState::Success(sample_result()));
    assert_eq!(orch.state(), first);
    assert_eq!(query.call_count(), 1);
}

#[tokio::test]
async fn new_run_after_failure_starts_over() {
    let geocoder = Arc::new(ScriptedGeocoder::default());
    let query = Arc::new(ScriptedRouteQuery::ok(sample_result()));
    let orch = orchestrator(credentials(Some("abc")), &geocoder, &query);

    let failed = orch.run(RouteRequest::new("", "Union Sq")).await.unwrap();
    assert_eq!(failed.failure().map(LookupFailure::reason), Some("validation"));

    let mut rx = orch.subscribe();
    let state = orch.run(RouteRequest::new("Main St", "Union Sq")).await.unwrap();
    assert!(state.result().is_some());
    assert!(rx.has_changed().unwrap());
}

#[tokio::test]
async fn subscribers_see_loading_then_result() {
    let gate = Gate::new();
    let geocoder = Arc::new(ScriptedGeocoder::default());
    let query = Arc::new(ScriptedRouteQuery::ok(sample_result()).gated(&gate));
    let orch = orchestrator(credentials(Some("abc")), &geocoder, &query);
    let mut rx = orch.subscribe();

    let running = {
        let orch = orch.clone();
        tokio::spawn(async move { orch.run(RouteRequest::new("Main St", "Union Sq")).await })
    };

    rx.changed().await.unwrap();
    assert!(rx.borrow_and_update().is_loading());

    gate.open();
    rx.changed().await.unwrap();
    assert_eq!(*rx.borrow_and_update(), LookupState::Success(sample_result()));

    running.await.unwrap().unwrap();
}

#[tokio::test]
async fn cancel_abandons_pending_lookups() {
    let gate = Gate::new();
    let geocoder = Arc::new(ScriptedGeocoder::default());
    let query = Arc::new(ScriptedRouteQuery::ok(sample_result()).gated(&gate));
    let orch = orchestrator(credentials(Some("abc")), &geocoder, &query);

    let running = {
        let orch = orch.clone();
        tokio::spawn(async move { orch.run(RouteRequest::new("Main St", "Union Sq")).await })
    };
    wait_for_loading(&orch).await;

    assert!(orch.cancel());
    // run returns without the gated route query ever finishing.
    let state = running.await.unwrap().unwrap();
    assert_eq!(state, LookupState::Failure(LookupFailure::Cancelled));
    assert_eq!(orch.state().failure().map(LookupFailure::reason), Some("cancelled"));

    gate.open();
    settle().await;
    assert_eq!(orch.state(), LookupState::Failure(LookupFailure::Cancelled));
}

#[tokio::test]
async fn cancel_when_not_loading_is_a_no_op() {
    let geocoder = Arc::new(ScriptedGeocoder::default());
    let query = Arc::new(ScriptedRouteQuery::ok(sample_result()));
    let orch = orchestrator(credentials(Some("abc")), &geocoder, &query);

    assert!(!orch.cancel());
    assert_eq!(orch.state(), LookupState::Idle);

    orch.run(RouteRequest::new("Main St", "Union Sq")).await.unwrap();
    assert!(!orch.cancel());
    assert!(orch.state().result().is_some());
}

#[tokio::test]
async fn cancelled_attempt_cannot_overwrite_newer_attempt() {
    let slow_gate = Gate::new();
    let geocoder = Arc::new(ScriptedGeocoder::default().gate("Slow St", &slow_gate));
    let query = Arc::new(ScriptedRouteQuery::ok(sample_result()));
    let orch = orchestrator(credentials(Some("abc")), &geocoder, &query);

    let first = {
        let orch = orch.clone();
        tokio::spawn(async move { orch.run(RouteRequest::new("Slow St", "Union Sq")).await })
    };
    wait_for_loading(&orch).await;
    assert!(orch.cancel());
    assert_eq!(
        first.await.unwrap().unwrap(),
        LookupState::Failure(LookupFailure::Cancelled)
    );

    // A fresh attempt completes while the old lookup is still pending...
    let second = orch.run(RouteRequest::new("Main St", "Union Sq")).await.unwrap();
    assert_eq!(second, LookupState::Success(sample_result()));

    // ...and the stale lookup from the cancelled attempt changes nothing.
    slow_gate.open();
    settle().await;
    assert_eq!(orch.state(), LookupState::Success(sample_result()));
    assert_eq!(query.call_count(), 1);
}

#[tokio::test]
async fn dropped_run_releases_loading() {
    let gate = Gate::new();
    let geocoder = Arc::new(ScriptedGeocoder::default());
    let query = Arc::new(ScriptedRouteQuery::ok(sample_result()).gated(&gate));
    let orch = orchestrator(credentials(Some("abc")), &geocoder, &query);

    let running = {
        let orch = orch.clone();
        tokio::spawn(async move { orch.run(RouteRequest::new("Main St", "Union Sq")).await })
    };
    wait_for_loading(&orch).await;

    running.abort();
    assert!(running.await.unwrap_err().is_cancelled());
    assert_eq!(orch.state(), LookupState::Failure(LookupFailure::Cancelled));

    // The abandoned route query finishing later changes nothing.
    gate.open();
    settle().await;
    assert_eq!(orch.state(), LookupState::Failure(LookupFailure::Cancelled));

    let next = orch.run(RouteRequest::new("Main St", "Union Sq")).await.unwrap();
    assert_eq!(next, LookupState::Success(sample_result()));
}

#[tokio::test]
async fn end_to_end_with_mock_route_query() {
    let geocoder = MockGeocoder::new()
        .with_fixed("Main St", coord(40.7172, -73.9567))
        .with_fixed("Union Sq", coord(40.7359, -73.9911));
    let route_query =
        MockRouteQuery::new(MockRouteQueryConfig::default().with_latency(Duration::ZERO));
    let orch = RouteOrchestrator::new(
        credentials(Some("abc")),
        Arc::new(geocoder),
        Arc::new(route_query),
    );

    let request = RouteRequest {
        origin: "Main St".into(),
        destination: "Union Sq".into(),
        stroller_accessible: true,
        elevator_access: false,
    };
    let state = orch.run(request).await.unwrap();

    let result = state.result().expect("route found");
    assert_eq!(result.options.len(), 2);
    assert!(result.accessibility.stroller_friendly);
    assert!(!result.accessibility.has_elevators);
    assert_eq!(orch.state(), state);
}

proptest! {
    #[test]
    fn blank_addresses_never_reach_capabilities(
        blank in "[ \t\n]{0,6}",
        other in "[ \t\n]{0,6}|[a-zA-Z ]{1,12}",
        blank_origin in any::<bool>(),
    ) {
        let (origin, destination) = if blank_origin {
            (blank, other)
        } else {
            ("Main St".to_string(), blank)
        };

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        let geocoder = Arc::new(ScriptedGeocoder::default());
        let query = Arc::new(ScriptedRouteQuery::ok(sample_result()));
        let orch = orchestrator(credentials(Some("abc")), &geocoder, &query);

        let state = runtime
            .block_on(orch.run(RouteRequest::new(origin, destination)))
            .unwrap();

        prop_assert_eq!(state.failure().map(LookupFailure::reason), Some("validation"));
        prop_assert!(geocoder.calls().is_empty());
        prop_assert_eq!(query.call_count(), 0);
    }
}
