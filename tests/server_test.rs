//! Tests for the HTTP surface, driven through the router without a socket.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use strictly_squares::{AppState, BroadcastGateway, GridEvent, MemoryStore, router};

fn app() -> (Router, BroadcastGateway) {
    let gateway = BroadcastGateway::new(16);
    let state = AppState::new(MemoryStore::new(), Arc::new(gateway.clone()));
    (router(state), gateway)
}

/// Sends one request and returns the status and the decoded JSON body
/// (`Value::Null` for an empty body).
async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("Failed to build request");

    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("Router failed");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to read body")
        .to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("Body is not JSON")
    };
    (status, value)
}

fn grid_body(name: &str) -> Value {
    json!({
        "name": name,
        "x_label": "Chiefs",
        "y_label": "Eagles",
        "price_cents": 500,
        "payouts": [25, 25, 25, 25],
    })
}

async fn create_grid(app: &Router, name: &str) -> i64 {
    let (status, body) = send(app, Method::POST, "/grids", Some(grid_body(name))).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["id"].as_i64().expect("grid id")
}

#[tokio::test]
async fn test_create_grid_validation() {
    let (app, _) = app();

    let mut bad_payouts = grid_body("Bad");
    bad_payouts["payouts"] = json!([25, 25, 25, 20]);
    let (status, body) = send(&app, Method::POST, "/grids", Some(bad_payouts)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION");

    let mut free = grid_body("Free");
    free["price_cents"] = json!(0);
    let (status, _) = send(&app, Method::POST, "/grids", Some(free)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut unnamed = grid_body("  ");
    unnamed["x_label"] = json!("");
    let (status, _) = send(&app, Method::POST, "/grids", Some(unnamed)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    create_grid(&app, "Good").await;
    let (status, _) = send(&app, Method::POST, "/grids", Some(grid_body("Good"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "duplicate name");
}

#[tokio::test]
async fn test_claim_flow_and_board() {
    let (app, _) = app();
    let grid_id = create_grid(&app, "Flow").await;

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/grids/{grid_id}/claims"),
        Some(json!({ "display_name": "Ann", "positions": [12, 3] })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["positions"], json!([3, 12]));
    assert_eq!(body["sealed"], false);

    let (status, board) = send(&app, Method::GET, &format!("/grids/{grid_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(board["available"], 98);
    assert_eq!(board["cells"][2]["claimant"], "Ann");
    assert_eq!(board["cells"][0]["claimant"], Value::Null);

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/grids/{grid_id}/claims"),
        Some(json!({ "display_name": "Bob", "positions": [4, 12] })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CONFLICT");
    assert_eq!(body["error"]["positions"], json!([12]));

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/grids/{grid_id}/claims"),
        Some(json!({ "display_name": "Bob", "positions": [0] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].get("positions").is_none());
}

#[tokio::test]
async fn test_unknown_grid_is_not_found() {
    let (app, _) = app();
    let (status, body) = send(&app, Method::GET, "/grids/41", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");

    let (status, _) = send(
        &app,
        Method::POST,
        "/grids/41/claims",
        Some(json!({ "display_name": "Ann", "positions": [1] })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_claim_publishes_events() {
    let (app, gateway) = app();
    let mut events = gateway.subscribe();
    let grid_id = create_grid(&app, "Events").await;

    for block in 0..10 {
        let positions: Vec<i64> = (1..=10).map(|n| block * 10 + n).collect();
        let (status, _) = send(
            &app,
            Method::POST,
            &format!("/grids/{grid_id}/claims"),
            Some(json!({ "display_name": format!("P{block}"), "positions": positions })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let mut taken = 0;
    let mut sealed = 0;
    while taken < 10 || sealed < 1 {
        let event = tokio::time::timeout(Duration::from_secs(5), events.recv())
            .await
            .expect("Timed out waiting for event")
            .expect("Channel closed");
        match event {
            GridEvent::CellsTaken { positions, .. } => {
                assert_eq!(positions.len(), 10);
                taken += 1;
            }
            GridEvent::GridSealed { grid_id: sealed_id } => {
                assert_eq!(i64::from(sealed_id), grid_id);
                sealed += 1;
            }
        }
    }

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/grids/{grid_id}/claims"),
        Some(json!({ "display_name": "Late", "positions": [1] })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CLOSED");
}

#[tokio::test]
async fn test_close_scores_and_winners() {
    let (app, _) = app();
    let grid_id = create_grid(&app, "Scores").await;

    let score_uri = format!("/grids/{grid_id}/scores/1");
    let (status, body) = send(
        &app,
        Method::PUT,
        &score_uri,
        Some(json!({ "x_score": 7, "y_score": 3 })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "NOT_SEALED");

    let (status, axes) = send(&app, Method::POST, &format!("/grids/{grid_id}/close"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(axes["x"].as_array().map(Vec::len), Some(10));

    let (status, _) = send(&app, Method::POST, &format!("/grids/{grid_id}/close"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(
        &app,
        Method::PUT,
        &score_uri,
        Some(json!({ "x_score": 7, "y_score": 3 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["quarter"], 1);

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/grids/{grid_id}/scores/5"),
        Some(json!({ "x_score": 7, "y_score": 3 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");

    let (status, winners) =
        send(&app, Method::GET, &format!("/grids/{grid_id}/winners"), None).await;
    assert_eq!(status, StatusCode::OK);
    let winners = winners.as_array().expect("winners array");
    assert_eq!(winners.len(), 1);
    assert_eq!(winners[0]["claimant"], Value::Null);
    // 100 cells at 500 cents, 25% for the first quarter.
    assert_eq!(winners[0]["payout_cents"], 12_500);

    let (status, body) = send(&app, Method::DELETE, &score_uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);
    let (status, _) = send(&app, Method::DELETE, &score_uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_grids_in_creation_order() {
    let (app, _) = app();
    let (status, body) = send(&app, Method::GET, "/grids", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    let first = create_grid(&app, "Early").await;
    let second = create_grid(&app, "Late").await;
    let (status, body) = send(&app, Method::GET, "/grids", None).await;
    assert_eq!(status, StatusCode::OK);
    let grids = body.as_array().expect("grids array");
    assert_eq!(grids.len(), 2);
    assert_eq!(grids[0]["id"], first);
    assert_eq!(grids[0]["name"], "Early");
    assert_eq!(grids[1]["id"], second);
}

#[tokio::test]
async fn test_malformed_requests_use_json_error_body() {
    let (app, _) = app();
    let grid_id = create_grid(&app, "Malformed").await;

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/grids/{grid_id}/claims"),
        Some(json!({ "display_name": "Ann", "positions": ["a"] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION");
    assert!(body["error"]["message"].is_string());

    let (status, body) = send(&app, Method::GET, "/grids/99999999999", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION");

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/grids/{grid_id}/scores/x"),
        Some(json!({ "x_score": 1, "y_score": 2 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION");

    let (status, body) = send(
        &app,
        Method::POST,
        "/grids",
        Some(json!({ "name": "No teams" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION");
}
