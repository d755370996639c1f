//! End-to-end aggregation against mock Traefik instances.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde_json::json;
use tokio::sync::broadcast;

use traefik_fed::aggregator::{Aggregator, MergeRules};
use traefik_fed::config::{MergeDefaults, MergePolicy, SelectionCriteria};
use traefik_fed::dynamic::{HttpEnvelope, RouterTls, ServiceDecl, UnifiedConfiguration};
use traefik_fed::http::{ServeError, SnapshotCache};
use traefik_fed::lifecycle::{run_until, BuildInfo, StartupError};
use traefik_fed::scheduler::{Poller, SchedulerState, Sinks};
use traefik_fed::sink::snapshot_slot;
use traefik_fed::upstream::{build_http_client, FETCH_TIMEOUT};
use traefik_fed::FederationConfig;

mod common;
use common::{api_router, dead_address, query_param, start_mock_traefik, start_static_traefik, upstream, MockResponse};

fn http() -> reqwest::Client {
    build_http_client(FETCH_TIMEOUT).unwrap()
}

fn websecure_rules() -> MergeRules {
    MergeRules {
        defaults: MergeDefaults {
            entrypoints: vec!["websecure".into()],
            middlewares: Vec::new(),
            tls: Some(RouterTls::with_resolver("letsencrypt")),
        },
        policy: MergePolicy::ReplaceOrDrop,
    }
}

#[tokio::test]
async fn test_two_upstreams_merge_into_one_configuration() {
    let host1 = start_static_traefik(json!([
        api_router("webapp@docker", "docker", "enabled", "Host(`app.example.com`)"),
        api_router("api@internal", "internal", "enabled", "PathPrefix(`/api`)"),
        api_router("dashboard@internal", "internal", "enabled", "PathPrefix(`/dashboard`)"),
    ]))
    .await;
    let host2 = start_static_traefik(json!([
        api_router("api@docker", "docker", "enabled", "Host(`api.example.com`)"),
        api_router("broken@docker", "docker", "disabled", "Host(`broken.example.com`)"),
    ]))
    .await;

    let aggregator = Aggregator::new(
        vec![
            upstream("host1", host1, "http://10.0.0.1:80"),
            upstream("host2", host2, "http://10.0.0.2:80"),
        ],
        SelectionCriteria::default(),
        websecure_rules(),
        http(),
    )
    .unwrap();

    let snapshot = aggregator.aggregate().await;

    assert_eq!(
        snapshot.routers.keys().collect::<Vec<_>>(),
        vec!["host1-webapp", "host2-api"]
    );
    assert_eq!(
        snapshot.services.get("host1-traefik"),
        Some(&ServiceDecl::single("http://10.0.0.1:80"))
    );
    assert_eq!(
        snapshot.services.get("host2-traefik"),
        Some(&ServiceDecl::single("http://10.0.0.2:80"))
    );

    assert_eq!(snapshot.services.len(), 2);

    let webapp = &snapshot.routers["host1-webapp"];
    assert_eq!(webapp.service, "host1-traefik");
    assert_eq!(webapp.rule, "Host(`app.example.com`)");
    assert_eq!(webapp.entry_points, vec!["websecure"]);
    assert!(webapp.middlewares.is_empty());
    assert_eq!(webapp.tls, Some(RouterTls::with_resolver("letsencrypt")));

    assert_eq!(snapshot.routers["host2-api"].service, "host2-traefik");
}

#[tokio::test]
async fn test_provider_filter() {
    let addr = start_static_traefik(json!([
        api_router("memos@docker", "docker", "enabled", "Host(`memos.example.com`)"),
        api_router("legacy@file", "file", "enabled", "Host(`legacy.example.com`)"),
    ]))
    .await;

    let aggregator = Aggregator::new(
        vec![upstream("host1", addr, "http://10.0.0.1:80")],
        SelectionCriteria {
            provider: Some("docker".into()),
            status: "enabled".into(),
        },
        MergeRules::default(),
        http(),
    )
    .unwrap();

    let snapshot = aggregator.aggregate().await;
    assert_eq!(snapshot.routers.keys().collect::<Vec<_>>(), vec!["host1-memos"]);
}

#[tokio::test]
async fn test_inherit_policy_keeps_upstream_lists() {
    let addr = start_static_traefik(json!([api_router(
        "memos@docker",
        "docker",
        "enabled",
        "Host(`memos.example.com`)"
    )]))
    .await;

    let aggregator = Aggregator::new(
        vec![upstream("host1", addr, "http://10.0.0.1:80")],
        SelectionCriteria::default(),
        MergeRules {
            defaults: MergeDefaults::default(),
            policy: MergePolicy::Inherit,
        },
        http(),
    )
    .unwrap();

    let snapshot = aggregator.aggregate().await;
    let memos = &snapshot.routers["host1-memos"];
    assert_eq!(memos.entry_points, vec!["web"]);
    assert_eq!(memos.middlewares, vec!["auth@docker"]);
}

#[tokio::test]
async fn test_aggregation_is_idempotent() {
    let addr = start_static_traefik(json!([
        api_router("b@docker", "docker", "enabled", "Host(`b.example.com`)"),
        api_router("a@docker", "docker", "enabled", "Host(`a.example.com`)"),
    ]))
    .await;

    let aggregator = Aggregator::new(
        vec![upstream("host1", addr, "http://10.0.0.1:80")],
        SelectionCriteria::default(),
        websecure_rules(),
        http(),
    )
    .unwrap();

    let first = aggregator.aggregate().await;
    let second = aggregator.aggregate().await;
    assert_eq!(first, second);
    assert_eq!(
        traefik_fed::dynamic::render_yaml(&first).unwrap(),
        traefik_fed::dynamic::render_yaml(&second).unwrap()
    );
}

#[tokio::test]
async fn test_failing_upstream_is_skipped() {
    let healthy = start_static_traefik(json!([api_router(
        "wiki@docker",
        "docker",
        "enabled",
        "Host(`wiki.example.com`)"
    )]))
    .await;
    let erroring = start_mock_traefik(|_| MockResponse::status(500, "boom")).await;

    let aggregator = Aggregator::new(
        vec![
            upstream("down", dead_address(), "http://10.0.0.9:80"),
            upstream("erroring", erroring, "http://10.0.0.8:80"),
            upstream("host2", healthy, "http://10.0.0.2:80"),
        ],
        SelectionCriteria::default(),
        MergeRules::default(),
        http(),
    )
    .unwrap();

    let snapshot = aggregator.aggregate().await;
    assert_eq!(snapshot.routers.keys().collect::<Vec<_>>(), vec!["host2-wiki"]);
    assert_eq!(snapshot.services.keys().collect::<Vec<_>>(), vec!["host2-traefik"]);
}

#[tokio::test]
async fn test_all_upstreams_failing_yields_empty_configuration() {
    let aggregator = Aggregator::new(
        vec![upstream("down", dead_address(), "http://10.0.0.9:80")],
        SelectionCriteria::default(),
        MergeRules::default(),
        http(),
    )
    .unwrap();

    let snapshot = aggregator.aggregate().await;
    assert!(snapshot.is_empty());
    assert_eq!(traefik_fed::dynamic::render_json(&snapshot).unwrap(), r#"{"http":{}}"#);
}

#[tokio::test]
async fn test_no_service_without_selected_routers() {
    let internal_only = start_static_traefik(json!([
        api_router("api@internal", "internal", "enabled", "PathPrefix(`/api`)"),
    ]))
    .await;
    let empty = start_static_traefik(json!([])).await;

    let aggregator = Aggregator::new(
        vec![
            upstream("host1", internal_only, "http://10.0.0.1:80"),
            upstream("host2", empty, "http://10.0.0.2:80"),
        ],
        SelectionCriteria::default(),
        MergeRules::default(),
        http(),
    )
    .unwrap();

    let snapshot = aggregator.aggregate().await;
    assert!(snapshot.routers.is_empty());
    assert!(snapshot.services.is_empty());
}

#[tokio::test]
async fn test_later_upstream_wins_name_collision() {
    let first = start_static_traefik(json!([api_router(
        "app@docker",
        "docker",
        "enabled",
        "Host(`first.example.com`)"
    )]))
    .await;
    let second = start_static_traefik(json!([api_router(
        "app@docker",
        "docker",
        "enabled",
        "Host(`second.example.com`)"
    )]))
    .await;

    let aggregator = Aggregator::new(
        vec![
            upstream("edge", first, "http://10.0.0.1:80"),
            upstream("edge", second, "http://10.0.0.2:80"),
        ],
        SelectionCriteria::default(),
        MergeRules::default(),
        http(),
    )
    .unwrap();

    let snapshot = aggregator.aggregate().await;
    assert_eq!(snapshot.routers["edge-app"].rule, "Host(`second.example.com`)");
    assert_eq!(
        snapshot.services["edge-traefik"],
        ServiceDecl::single("http://10.0.0.2:80")
    );
}

#[tokio::test]
async fn test_follows_pagination() {
    let addr = start_mock_traefik(|target| {
        assert_eq!(query_param(target, "per_page"), Some("100"));
        match query_param(target, "page") {
            Some("1") => MockResponse::json(
                json!([api_router("a@docker", "docker", "enabled", "Host(`a.example.com`)")]).to_string(),
            )
            .with_header("X-Next-Page", "2"),
            Some("2") => MockResponse::json(
                json!([api_router("b@docker", "docker", "enabled", "Host(`b.example.com`)")]).to_string(),
            )
            .with_header("X-Next-Page", "1"),
            _ => MockResponse::status(404, "no such page"),
        }
    })
    .await;

    let aggregator = Aggregator::new(
        vec![upstream("host1", addr, "http://10.0.0.1:80")],
        SelectionCriteria::default(),
        MergeRules::default(),
        http(),
    )
    .unwrap();

    let snapshot = aggregator.aggregate().await;
    assert_eq!(
        snapshot.routers.keys().collect::<Vec<_>>(),
        vec!["host1-a", "host1-b"]
    );
}

#[tokio::test]
async fn test_poller_publishes_to_every_sink() {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    let body = json!([api_router("memos@docker", "docker", "enabled", "Host(`memos.example.com`)")]).to_string();
    let addr = start_mock_traefik(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        MockResponse::json(body.clone())
    })
    .await;

    let aggregator = Aggregator::new(
        vec![upstream("host1", addr, "http://10.0.0.1:80")],
        SelectionCriteria::default(),
        MergeRules::default(),
        http(),
    )
    .unwrap();

    let cache = SnapshotCache::new();
    let (slot, updates) = snapshot_slot();
    let poller = Poller::new(
        aggregator,
        Duration::from_secs(3600),
        Sinks {
            query: Some(cache.clone()),
            file: Some(slot),
        },
    );
    let mut state = poller.subscribe_state();

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let handle = tokio::spawn(poller.run(shutdown_rx));

    // The first cycle runs without waiting for the interval.
    for _ in 0..500 {
        if !cache.read().is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(cache.read().routers.contains_key("host1-memos"));

    let published = updates.borrow().clone().unwrap();
    assert_eq!(published.as_ref(), cache.read().as_ref());

    shutdown_tx.send(()).unwrap();
    handle.await.unwrap();

    assert_eq!(*state.borrow_and_update(), SchedulerState::Terminated);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_poller_finishes_in_flight_cycle_on_shutdown() {
    const RESPONSE_DELAY: Duration = Duration::from_millis(300);

    let starts = Arc::new(Mutex::new(Vec::<Instant>::new()));
    let recorded = starts.clone();
    let addr = start_mock_traefik(move |_| {
        let mut starts = recorded.lock().unwrap();
        starts.push(Instant::now());
        let name = format!("cycle{}@docker", starts.len());
        MockResponse::json(
            json!([api_router(&name, "docker", "enabled", "Host(`app.example.com`)")]).to_string(),
        )
        .delayed(RESPONSE_DELAY)
    })
    .await;

    let aggregator = Aggregator::new(
        vec![upstream("host1", addr, "http://10.0.0.1:80")],
        SelectionCriteria::default(),
        MergeRules::default(),
        http(),
    )
    .unwrap();

    let cache = SnapshotCache::new();
    let (slot, updates) = snapshot_slot();
    let poller = Poller::new(
        aggregator,
        Duration::from_millis(100),
        Sinks {
            query: Some(cache.clone()),
            file: Some(slot),
        },
    );
    let mut state = poller.subscribe_state();

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let handle = tokio::spawn(poller.run(shutdown_rx));

    // Stop while the second cycle waits on the slow upstream.
    for _ in 0..500 {
        if starts.lock().unwrap().len() >= 2 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(starts.lock().unwrap().len(), 2);
    assert!(cache.read().routers.contains_key("host1-cycle1"));
    shutdown_tx.send(()).unwrap();

    handle.await.unwrap();

    assert!(cache.read().routers.contains_key("host1-cycle2"));
    let published = updates.borrow().clone().unwrap();
    assert!(published.routers.contains_key("host1-cycle2"));
    assert_eq!(*state.borrow_and_update(), SchedulerState::Terminated);

    // Cycles ran back to back, never overlapping, and none started after the stop.
    let starts = starts.lock().unwrap();
    assert_eq!(starts.len(), 2);
    assert!(starts[1].duration_since(starts[0]) >= RESPONSE_DELAY);
}

#[tokio::test]
async fn test_run_writes_file_until_stopped() {
    let addr = start_static_traefik(json!([api_router(
        "memos@docker",
        "docker",
        "enabled",
        "Host(`memos.example.com`)"
    )]))
    .await;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dynamic/federated.yml");

    let mut config = FederationConfig::default();
    config.upstreams.push(upstream("host1", addr, "http://10.0.0.1:80"));
    config.server.poll_interval = Duration::from_secs(3600);
    config.output.file.enabled = true;
    config.output.file.path = path.to_string_lossy().into_owned();
    config.output.file.interval = Duration::from_secs(3600);

    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let handle = tokio::spawn(run_until(config, BuildInfo::current(), async move {
        let _ = stop_rx.await;
    }));

    for _ in 0..500 {
        if path.exists() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let text = std::fs::read_to_string(&path).unwrap();
    let written: HttpEnvelope<UnifiedConfiguration> = serde_yaml::from_str(&text).unwrap();
    assert!(written.http.routers.contains_key("host1-memos"));
    assert!(written.http.services.contains_key("host1-traefik"));

    stop_tx.send(()).unwrap();
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_run_fails_when_port_is_taken() {
    let taken = std::net::TcpListener::bind("0.0.0.0:0").unwrap();

    let mut config = FederationConfig::default();
    config.upstreams.push(upstream("host1", dead_address(), "http://10.0.0.1:80"));
    config.output.http.enabled = true;
    config.output.http.port = taken.local_addr().unwrap().port();

    let result = run_until(config, BuildInfo::current(), std::future::pending()).await;
    assert!(matches!(
        result,
        Err(StartupError::Serving(ServeError::Bind { .. }))
    ));
}
