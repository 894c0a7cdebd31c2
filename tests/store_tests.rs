use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};

use salwatch::models::{NewException, Resolutions};
use salwatch::store::{RestStore, RowStore, StoreError};
use salwatch::watchdog::resolve;

/// One request as seen by the fake PostgREST server.
#[derive(Debug, Clone)]
struct Seen {
    method: &'static str,
    params: HashMap<String, String>,
    apikey: String,
    authorization: String,
    prefer: Option<String>,
    body: Option<Value>,
}

type Log = Arc<Mutex<Vec<Seen>>>;

fn seen(method: &'static str, params: HashMap<String, String>, headers: &HeaderMap, body: Option<Value>) -> Seen {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    Seen {
        method,
        params,
        apikey: header("apikey").unwrap_or_default(),
        authorization: header("authorization").unwrap_or_default(),
        prefer: header("prefer"),
        body,
    }
}

async fn list_results(
    State(log): State<Log>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Json<Value> {
    log.lock().unwrap().push(seen("GET", params, &headers, None));
    Json(json!([
        {
            "id": 11,
            "run_id": "r1",
            "run_type": null,
            "run_at": "2024-01-01T09:00:00+00:00",
            "status": "fail",
            "severity": "high",
            "check_id": "stale-deal",
            "violation_count": 1,
            "violations": [{ "record_id": 501, "record_name": "Deal", "details": null, "hubspot_url": "https://x" }],
            "resolutions": null
        }
    ]))
}

async fn patch_results(
    State(log): State<Log>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> StatusCode {
    log.lock().unwrap().push(seen("PATCH", params, &headers, Some(body)));
    StatusCode::NO_CONTENT
}

async fn insert_exception(
    State(log): State<Log>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    log.lock()
        .unwrap()
        .push(seen("POST", HashMap::new(), &headers, Some(body.clone())));
    let mut row = body;
    row["id"] = json!(77);
    (StatusCode::CREATED, Json(json!([row])))
}

async fn spawn_postgrest(fail: bool) -> (SocketAddr, Log) {
    let log: Log = Arc::default();

    let app = if fail {
        Router::new().fallback(|| async { (StatusCode::UNAUTHORIZED, "{\"message\":\"JWT expired\"}") })
    } else {
        Router::new()
            .route(
                "/rest/v1/watchdog_results",
                get(list_results).patch(patch_results),
            )
            .route(
                "/rest/v1/watchdog_exceptions",
                axum::routing::post(insert_exception),
            )
            .with_state(log.clone())
    };

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, log)
}

#[tokio::test]
async fn rest_store_queries_recent_results() {
    let (addr, log) = spawn_postgrest(false).await;
    let store = RestStore::new(&format!("http://{addr}/"), "service-key");

    let rows = store.recent_results(200).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, "11");
    assert_eq!(rows[0].run_type, None);
    assert_eq!(rows[0].violations[0].record_id, "501");
    assert_eq!(rows[0].violations[0].details, "");
    assert!(rows[0].resolutions.is_empty());

    let seen = log.lock().unwrap()[0].clone();
    assert_eq!(seen.method, "GET");
    assert_eq!(seen.params["run_id"], "not.is.null");
    assert_eq!(seen.params["order"], "run_at.desc");
    assert_eq!(seen.params["limit"], "200");
    assert_eq!(seen.apikey, "service-key");
    assert_eq!(seen.authorization, "Bearer service-key");
}

#[tokio::test]
async fn rest_store_queries_one_run() {
    let (addr, log) = spawn_postgrest(false).await;
    let store = RestStore::new(&format!("http://{addr}"), "k");

    store.run_results("r1").await.unwrap();

    let seen = log.lock().unwrap()[0].clone();
    assert_eq!(seen.params["run_id"], "eq.r1");
    assert_eq!(seen.params["order"], "run_at.asc");
    assert!(!seen.params.contains_key("limit"));
}

#[tokio::test]
async fn rest_store_writes_resolutions_and_exceptions() {
    let (addr, log) = spawn_postgrest(false).await;
    let store = RestStore::new(&format!("http://{addr}"), "k");

    let row = store.run_results("r1").await.unwrap().remove(0);
    let outcome = resolve::add_exception(&store, &row, "501", Some("Known duplicate"))
        .await
        .unwrap();
    let resolve::ExceptionOutcome::Added(exception) = outcome else {
        panic!("expected an exception");
    };
    assert_eq!(exception.id, "77");
    assert_eq!(exception.kind, "record");

    let log = log.lock().unwrap().clone();
    assert_eq!(log.len(), 3);

    let insert = &log[1];
    assert_eq!(insert.method, "POST");
    assert_eq!(insert.prefer.as_deref(), Some("return=representation"));
    assert_eq!(
        insert.body,
        Some(json!({
            "check_id": "stale-deal",
            "type": "record",
            "value": "501",
            "reason": "Known duplicate",
            "created_by": "dashboard",
            "active": true
        }))
    );

    let update = &log[2];
    assert_eq!(update.method, "PATCH");
    assert_eq!(update.params["id"], "eq.11");
    let body = update.body.clone().unwrap();
    assert_eq!(body["resolutions"]["501"]["status"], "exception");
    assert_eq!(body["resolutions"]["501"]["exception_id"], "77");
}

#[tokio::test]
async fn rest_store_reports_error_status() {
    let (addr, _) = spawn_postgrest(true).await;
    let store = RestStore::new(&format!("http://{addr}"), "k");

    match store.recent_results(10).await {
        Err(StoreError::Status { status, body }) => {
            assert_eq!(status, 401);
            assert!(body.contains("JWT expired"));
        }
        other => panic!("expected status error, got {other:?}"),
    }

    let err = store
        .update_resolutions("1", &Resolutions::new())
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Status { status: 401, .. }));

    let err = store
        .insert_exception(&NewException {
            check_id: "c".to_string(),
            kind: "record".to_string(),
            value: "v".to_string(),
            reason: "r".to_string(),
            created_by: "dashboard".to_string(),
            active: true,
        })
        .await
        .unwrap_err();
    assert!(err.to_string().contains("401"));
}
