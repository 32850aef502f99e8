use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tempfile::{tempdir, TempDir};
use tower::ServiceExt;
use wealthdesk_server::{api::app_router, build_state, config::Config};

async fn build_test_router() -> (Router, TempDir) {
    let tmp = tempdir().unwrap();
    let db_path = tmp.path().join("test.db").to_string_lossy().to_string();
    let config = Config::from_lookup(|key| match key {
        "WD_DB_PATH" => Some(db_path.clone()),
        _ => None,
    })
    .unwrap();
    let state = build_state(&config).await.unwrap();
    (app_router(state, &config), tmp)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, value)
}

async fn send_csv(app: &Router, uri: &str, csv: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "text/csv")
        .body(Body::from(csv.to_string()))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

async fn get_text(app: &Router, uri: &str) -> (StatusCode, String, String) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, content_type, String::from_utf8(bytes.to_vec()).unwrap())
}

async fn seed_quarter(app: &Router) {
    let (status, _) = send(
        app,
        Method::POST,
        "/api/v1/fee-schedules",
        Some(json!({"id": "tiered", "name": "Tiered"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    for rule in [
        json!({"minimum": 0, "maximum": 100000, "rate": 0.04, "flat": 50}),
        json!({"minimum": 100000, "maximum": null, "rate": 0.02, "flat": 25}),
    ] {
        let (status, _) = send(app, Method::POST, "/api/v1/fee-schedules/tiered/rules", Some(rule)).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, _) = send(
        app,
        Method::POST,
        "/api/v1/groups",
        Some(json!({"id": "g-smith", "name": "Smith Household", "feeScheduleId": "tiered"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    for number in ["100-A", "100-B"] {
        let (status, _) = send(
            app,
            Method::POST,
            "/api/v1/accounts",
            Some(json!({
                "accountNumber": number,
                "groupId": "g-smith",
                "billable": true,
                "discretionary": true,
                "feeScheduleId": "tiered"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, _) = send(
        app,
        Method::POST,
        "/api/v1/quarters",
        Some(json!({"id": "q1", "name": "Q1 2024", "fromDate": "2024-01-01", "toDate": "2024-03-31"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn healthz_works() {
    let (app, _tmp) = build_test_router().await;
    let (status, _, body) = get_text(&app, "/api/v1/healthz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok");
}

#[tokio::test]
async fn quarter_roll_up_over_http() {
    let (app, _tmp) = build_test_router().await;
    seed_quarter(&app).await;

    let (status, summary) = send_csv(
        &app,
        "/api/v1/quarters/q1/import",
        "Date,Account,Name,Type,Market Value\n\
         2024-03-31,100-A,Smith IRA,IRA,100000.00\n\
         2024-03-31,100-B,Smith Joint,JT,50000.00\n\
         2024-03-31,404-Z,Nobody,IND,1.00\n",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["imported"], 2);
    assert_eq!(summary["skipped"][0]["accountNumber"], "404-Z");

    let (status, ledger) = send(&app, Method::POST, "/api/v1/quarters/q1/group-snapshots/generate", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ledger["quarter"]["status"], "SNAPSHOTS_LINKED");

    let (status, ledger) = send(&app, Method::POST, "/api/v1/quarters/q1/fees/calculate", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ledger["quarter"]["status"], "ACCOUNT_FEES_ALLOCATED");
    assert_eq!(ledger["groupSnapshots"][0]["fee"].as_f64(), Some(1325.0));

    let (status, discrepancies) = send(&app, Method::GET, "/api/v1/quarters/q1/reconcile", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(discrepancies, json!([]));

    let (status, content_type, csv) = get_text(&app, "/api/v1/quarters/q1/export/groups").await;
    assert_eq!(status, StatusCode::OK);
    assert!(content_type.starts_with("text/csv"));
    assert_eq!(csv, "Group,Market Value,Fee\nSmith Household,150000.00,1325.00\n");

    let (_, _, accounts_csv) = get_text(&app, "/api/v1/quarters/q1/export/accounts").await;
    assert!(accounts_csv.starts_with(
        "Client Name,Account Number,Group Name,Group Market Value,Account Market Value,Account Weight,Group Fee,Account Fee\n"
    ));
    assert!(accounts_csv.contains(",100-A,Smith Household,150000.00,100000.00,0.6667,1325.00,883.38"));
}

#[tokio::test]
async fn fee_preview_returns_breakdown() {
    let (app, _tmp) = build_test_router().await;
    seed_quarter(&app).await;

    let (status, quote) = send(&app, Method::GET, "/api/v1/fee-schedules/tiered/calculate?value=150000", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(quote["fee"].as_f64(), Some(1325.0));
    assert_eq!(quote["breakdown"].as_array().map(Vec::len), Some(2));

    let (status, _) = send(&app, Method::GET, "/api/v1/fee-schedules/tiered/calculate?value=lots", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn errors_map_to_statuses() {
    let (app, _tmp) = build_test_router().await;
    seed_quarter(&app).await;

    let (status, body) = send(&app, Method::GET, "/api/v1/quarters/missing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 404);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/quarters",
        Some(json!({"name": "Q1 2024", "fromDate": "2024-01-01", "toDate": "2024-03-31"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/quarters",
        Some(json!({"name": "Backwards", "fromDate": "2024-03-31", "toDate": "2024-01-01"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Fees cannot be calculated before any snapshot is linked.
    let (status, _) = send(&app, Method::POST, "/api/v1/quarters/q1/fees/calculate", None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    // The schedule is still assigned to the group.
    let (status, _) = send(&app, Method::DELETE, "/api/v1/fee-schedules/tiered", None).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn account_delete_requires_snapshot_purge() {
    let (app, _tmp) = build_test_router().await;
    seed_quarter(&app).await;

    let (_, accounts) = send(&app, Method::GET, "/api/v1/accounts?groupId=g-smith", None).await;
    let account_id = accounts[0]["id"].as_str().unwrap().to_string();

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/quarters/q1/snapshots",
        Some(json!({"accountId": account_id, "snapshotDate": "2024-03-31", "marketValue": 2500})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let uri = format!("/api/v1/accounts/{}", account_id);
    let (status, _) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, purged) = send(&app, Method::DELETE, &format!("{}/snapshots", uri), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(purged["deleted"], 1);

    let (status, _) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, quarter) = send(&app, Method::GET, "/api/v1/quarters/q1", None).await;
    assert_eq!(quarter["aum"].as_f64(), Some(0.0));
}

#[tokio::test]
async fn deleting_unknown_ids_is_not_found() {
    let (app, _tmp) = build_test_router().await;

    for uri in [
        "/api/v1/fee-rules/missing",
        "/api/v1/accounts/missing",
        "/api/v1/groups/missing",
        "/api/v1/clients/missing",
    ] {
        let (status, _) = send(&app, Method::DELETE, uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "DELETE {}", uri);
    }
}

#[tokio::test]
async fn roster_import_and_export() {
    let (app, _tmp) = build_test_router().await;

    let (status, body) = send_csv(
        &app,
        "/api/v1/clients/import",
        "First Name,Middle Name,Last Name,Email,Group\n\
         Ann,,Smith,ann@example.com,Smith Household\n\
         Bob,,Jones,,\n",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);

    let (status, content_type, clients_csv) = get_text(&app, "/api/v1/clients/export").await;
    assert_eq!(status, StatusCode::OK);
    assert!(content_type.starts_with("text/csv"));
    assert_eq!(
        clients_csv,
        "First Name,Middle Name,Last Name,Email,Group\n\
         Ann,,Smith,ann@example.com,Smith Household\n\
         Bob,,Jones,,\n"
    );

    let (status, summary) = send_csv(
        &app,
        "/api/v1/accounts/import",
        "Account Number,Description,First Name,Last Name,Custodian,Billable,Discretionary\n\
         100-A,Smith IRA,Ann,Smith,Schwab,true,true\n\
         200-A,,Nobody,Here,,true,false\n",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["imported"], 1);
    assert_eq!(summary["skipped"][0]["line"], 3);

    let (_, groups) = send(&app, Method::GET, "/api/v1/groups", None).await;
    let group_id = groups[0]["id"].as_str().unwrap().to_string();
    let (_, accounts) = send(&app, Method::GET, &format!("/api/v1/accounts?groupId={}", group_id), None).await;
    assert_eq!(accounts[0]["accountNumber"], "100-A");

    let (status, _, accounts_csv) = get_text(&app, "/api/v1/accounts/export").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        accounts_csv,
        "Account Number,Description,First Name,Last Name,Custodian,Billable,Discretionary\n\
         100-A,Smith IRA,Ann,Smith,Schwab,true,true\n"
    );

    let (status, body) = send_csv(&app, "/api/v1/clients/import", "First Name,Middle Name,Last Name\n,,Smith\n").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 400);
}
