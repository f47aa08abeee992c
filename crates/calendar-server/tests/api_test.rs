use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use calendar_server::config::{Config, RateLimitConfig};
use calendar_server::db::MemoryStore;
use calendar_server::{create_router, AppState};
use chrono::{DateTime, Utc};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

// ─── Test helpers ───────────────────────────────────────────────────────

fn test_app() -> Router {
    app_with_config(Config::default())
}

fn app_with_config(config: Config) -> Router {
    let state = AppState::new(Arc::new(MemoryStore::new()), config);
    create_router(state)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn create_user(app: &Router, name: &str, email: &str) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/users",
        Some(json!({"name": name, "email": email})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["data"]["id"].as_str().unwrap().to_string()
}

async fn create_event(app: &Router, user_id: &str, payload: Value) -> Value {
    let mut payload = payload;
    payload["userId"] = json!(user_id);
    let (status, body) = send(app, Method::POST, "/api/events", Some(payload)).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["data"].clone()
}

fn standup() -> Value {
    json!({
        "title": "Standup",
        "startDate": "2024-06-01T09:00:00Z",
        "endDate": "2024-06-01T09:15:00Z"
    })
}

fn timestamp(value: &Value) -> DateTime<Utc> {
    value.as_str().unwrap().parse().unwrap()
}

// ─── Service endpoints ──────────────────────────────────────────────────

#[tokio::test]
async fn health_reports_ok() {
    let app = test_app();
    let (status, body) = send(&app, Method::GET, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    // UTC with millisecond precision, e.g. 2024-06-01T09:00:00.000Z
    let stamp = body["timestamp"].as_str().unwrap();
    assert_eq!(stamp.len(), 24, "{stamp}");
    assert!(stamp.ends_with('Z'), "{stamp}");
    assert_eq!(&stamp[19..20], ".");
}

#[tokio::test]
async fn unknown_route_is_404_envelope() {
    let app = test_app();
    let (status, body) = send(&app, Method::GET, "/api/nope", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"success": false, "error": "Route not found"}));
}

#[tokio::test]
async fn unsupported_method_is_404_envelope() {
    let app = test_app();
    let user = create_user(&app, "Ada", "ada@example.com").await;
    let id = create_event(&app, &user, standup()).await["id"]
        .as_str()
        .unwrap()
        .to_string();

    let (status, body) = send(
        &app,
        Method::PATCH,
        &format!("/api/events/{id}"),
        Some(json!({"title": "Patched", "userId": user})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"success": false, "error": "Route not found"}));

    for (method, uri) in [
        (Method::DELETE, "/api/users".to_string()),
        (Method::PUT, format!("/api/users/{user}")),
        (Method::POST, "/health".to_string()),
    ] {
        let (status, body) = send(&app, method.clone(), &uri, Some(json!({}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{method} {uri}");
        assert_eq!(body["error"], "Route not found");
    }
}

// ─── Users ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn signup_is_idempotent_by_email() {
    let app = test_app();
    let first = create_user(&app, "Ada", "ada@example.com").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/users",
        Some(json!({"name": "Someone Else", "email": "  ADA@example.com "})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "User already exists");
    assert_eq!(body["data"]["id"], first.as_str());
    assert_eq!(body["data"]["name"], "Ada");

    let (_, list) = send(&app, Method::GET, "/api/users", None).await;
    assert_eq!(list["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn signup_normalizes_and_validates() {
    let app = test_app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/users",
        Some(json!({"name": "  Grace  ", "email": " Grace@Navy.MIL "})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["name"], "Grace");
    assert_eq!(body["data"]["email"], "grace@navy.mil");
    assert_eq!(body["message"], "User created successfully");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/users",
        Some(json!({"name": "", "email": "not-an-email"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        json!([
            {"path": "name", "message": "Name is required"},
            {"path": "email", "message": "Invalid email address"}
        ])
    );
}

#[tokio::test]
async fn users_listed_newest_first_and_fetched_by_id() {
    let app = test_app();
    let ada = create_user(&app, "Ada", "ada@example.com").await;
    let bob = create_user(&app, "Bob", "bob@example.com").await;

    let (status, body) = send(&app, Method::GET, "/api/users", None).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, [bob.as_str(), ada.as_str()]);

    let (status, body) = send(&app, Method::GET, &format!("/api/users/{ada}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], "ada@example.com");

    let (status, body) = send(&app, Method::GET, "/api/users/missing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "User not found");
}

// ─── Events ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn event_lifecycle() {
    let app = test_app();
    let user = create_user(&app, "Ada", "ada@example.com").await;

    let created = create_event(&app, &user, standup()).await;
    assert_eq!(created["title"], "Standup");
    assert_eq!(created["completed"], false);
    assert_eq!(created["completedAt"], Value::Null);
    assert_eq!(created["color"], "#1a73e8");
    assert!(created.get("userId").is_none());
    let id = created["id"].as_str().unwrap().to_string();

    let before_update = Utc::now();
    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/events/{id}"),
        Some(json!({"completed": true, "userId": user})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["message"], "Event updated successfully");
    assert_eq!(body["data"]["completed"], true);
    assert!(timestamp(&body["data"]["completedAt"]) >= before_update);

    let (status, body) = send(
        &app,
        Method::DELETE,
        &format!("/api/events/{id}?userId={user}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"success": true, "message": "Event deleted successfully"})
    );

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/api/events/{id}?userId={user}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Event not found");
}

#[tokio::test]
async fn create_rejects_reversed_window_and_stores_nothing() {
    let app = test_app();
    let user = create_user(&app, "Ada", "ada@example.com").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/events",
        Some(json!({
            "title": "Backwards",
            "startDate": "2024-06-01T10:00:00Z",
            "endDate": "2024-06-01T09:00:00Z",
            "userId": user
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "End date must be after start date");

    let (_, list) = send(&app, Method::GET, &format!("/api/events?userId={user}"), None).await;
    assert_eq!(list["meta"]["total"], 0);
}

#[tokio::test]
async fn create_requires_known_user() {
    let app = test_app();
    let mut payload = standup();
    payload["userId"] = json!("6f2c1c4e-0d7e-4d0a-9a51-6f7b1f3b2a10");

    let (status, body) = send(&app, Method::POST, "/api/events", Some(payload)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "User not found");
}

#[tokio::test]
async fn create_reports_validation_errors() {
    let app = test_app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/events",
        Some(json!({"title": "", "color": "red", "startDate": "soon"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    let paths: Vec<&str> = body["error"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["path"].as_str().unwrap())
        .collect();
    assert_eq!(paths, ["title", "startDate", "endDate", "color", "userId"]);
}

#[tokio::test]
async fn wrong_field_types_are_field_violations() {
    let app = test_app();
    let user = create_user(&app, "Ada", "ada@example.com").await;

    let mut payload = standup();
    payload["title"] = json!(5);
    payload["allDay"] = json!("yes");
    payload["userId"] = json!(user);
    let (status, body) = send(&app, Method::POST, "/api/events", Some(payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({"success": false, "error": [
            {"path": "title", "message": "Expected string, received number"},
            {"path": "allDay", "message": "Expected boolean, received string"}
        ]})
    );

    let id = create_event(&app, &user, standup()).await["id"]
        .as_str()
        .unwrap()
        .to_string();
    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/events/{id}"),
        Some(json!({"title": 5, "userId": user})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        json!([{"path": "title", "message": "Expected string, received number"}])
    );

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/users",
        Some(json!({"name": ["Ada"], "email": "ada@example.com"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        json!([{"path": "name", "message": "Expected string, received array"}])
    );

    let (status, body) = send(&app, Method::POST, "/api/events", Some(json!([1, 2]))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        json!([{"path": "", "message": "Expected object, received array"}])
    );
}

#[tokio::test]
async fn create_sanitizes_text_and_ignores_orphan_completed_at() {
    let app = test_app();
    let user = create_user(&app, "Ada", "ada@example.com").await;

    let event = create_event(
        &app,
        &user,
        json!({
            "title": "  <b>Review</b> ",
            "description": "<script>x</script>",
            "location": "   ",
            "startDate": "2024-06-01T09:00:00Z",
            "endDate": "2024-06-01T10:00:00Z",
            "completedAt": "2024-06-01T10:00:00Z"
        }),
    )
    .await;

    assert_eq!(event["title"], "bReview/b");
    assert_eq!(event["description"], "scriptx/script");
    assert_eq!(event["location"], Value::Null);
    assert_eq!(event["completed"], false);
    assert_eq!(event["completedAt"], Value::Null);

    let done = create_event(
        &app,
        &user,
        json!({
            "title": "Done already",
            "startDate": "2024-06-01T09:00:00Z",
            "endDate": "2024-06-01T10:00:00Z",
            "completed": true,
            "completedAt": "2024-06-01T10:00:00Z"
        }),
    )
    .await;
    assert_eq!(
        timestamp(&done["completedAt"]),
        "2024-06-01T10:00:00Z".parse::<DateTime<Utc>>().unwrap()
    );
}

#[tokio::test]
async fn other_users_get_403() {
    let app = test_app();
    let owner = create_user(&app, "Ada", "ada@example.com").await;
    let intruder = create_user(&app, "Eve", "eve@example.com").await;
    let id = create_event(&app, &owner, standup()).await["id"]
        .as_str()
        .unwrap()
        .to_string();

    let uri = format!("/api/events/{id}?userId={intruder}");
    let (status, body) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Access denied");

    let (status, _) = send(
        &app,
        Method::PUT,
        &format!("/api/events/{id}"),
        Some(json!({"title": "Hijacked", "userId": intruder})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Ownership is settled before the body fields are checked
    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/events/{id}"),
        Some(json!({"title": "", "color": "red", "userId": intruder})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Access denied");

    let missing = uuid::Uuid::new_v4();
    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/events/{missing}"),
        Some(json!({"title": "", "userId": intruder})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Event not found");

    let (status, _) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/api/events/{id}?userId={owner}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "Standup");
}

#[tokio::test]
async fn user_id_is_required() {
    let app = test_app();
    let owner = create_user(&app, "Ada", "ada@example.com").await;
    let id = create_event(&app, &owner, standup()).await["id"]
        .as_str()
        .unwrap()
        .to_string();

    for (method, uri) in [
        (Method::GET, "/api/events".to_string()),
        (Method::GET, format!("/api/events/{id}")),
        (Method::DELETE, format!("/api/events/{id}?userId=")),
    ] {
        let (status, body) = send(&app, method, &uri, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "UserId is required");
    }

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/events/{id}"),
        Some(json!({"title": "No owner"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "UserId is required");
}

#[tokio::test]
async fn partial_update_leaves_other_fields_alone() {
    let app = test_app();
    let user = create_user(&app, "Ada", "ada@example.com").await;
    let created = create_event(
        &app,
        &user,
        json!({
            "title": "Planning",
            "description": "Quarterly",
            "startDate": "2024-06-03T13:00:00Z",
            "endDate": "2024-06-03T14:00:00Z",
            "color": "#33b679",
            "location": "Room 4",
            "recurrence": "FREQ=WEEKLY"
        }),
    )
    .await;
    let id = created["id"].as_str().unwrap();

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/events/{id}"),
        Some(json!({"title": "Planning v2", "userId": user})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let updated = &body["data"];

    assert_eq!(updated["title"], "Planning v2");
    for field in [
        "description",
        "startDate",
        "endDate",
        "allDay",
        "color",
        "location",
        "recurrence",
        "completed",
        "completedAt",
        "createdAt",
    ] {
        assert_eq!(updated[field], created[field], "{field} changed");
    }
}

#[tokio::test]
async fn update_clears_nullable_fields_and_reopens() {
    let app = test_app();
    let user = create_user(&app, "Ada", "ada@example.com").await;
    let created = create_event(
        &app,
        &user,
        json!({
            "title": "Gym",
            "location": "Downtown",
            "startDate": "2024-06-03T07:00:00Z",
            "endDate": "2024-06-03T08:00:00Z",
            "completed": true,
            "completedAt": "2024-06-03T08:00:00Z"
        }),
    )
    .await;
    let uri = format!("/api/events/{}", created["id"].as_str().unwrap());

    let (status, body) = send(
        &app,
        Method::PUT,
        &uri,
        Some(json!({"location": null, "completed": false, "userId": user})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["location"], Value::Null);
    assert_eq!(body["data"]["completed"], false);
    assert_eq!(body["data"]["completedAt"], Value::Null);
}

#[tokio::test]
async fn update_checks_window_only_when_both_dates_given() {
    let app = test_app();
    let user = create_user(&app, "Ada", "ada@example.com").await;
    let created = create_event(&app, &user, standup()).await;
    let uri = format!("/api/events/{}", created["id"].as_str().unwrap());

    let (status, body) = send(
        &app,
        Method::PUT,
        &uri,
        Some(json!({
            "startDate": "2024-06-02T10:00:00Z",
            "endDate": "2024-06-02T09:00:00Z",
            "userId": user
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "End date must be after start date");

    let (status, body) = send(
        &app,
        Method::PUT,
        &uri,
        Some(json!({"endDate": "2024-06-01T12:00:00Z", "userId": user})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        timestamp(&body["data"]["endDate"]),
        "2024-06-01T12:00:00Z".parse::<DateTime<Utc>>().unwrap()
    );
}

#[tokio::test]
async fn list_is_scoped_windowed_and_paged() {
    let app = test_app();
    let ada = create_user(&app, "Ada", "ada@example.com").await;
    let bob = create_user(&app, "Bob", "bob@example.com").await;

    for day in 1..=5 {
        create_event(
            &app,
            &ada,
            json!({
                "title": format!("Day {day}"),
                "startDate": format!("2024-06-0{day}T09:00:00Z"),
                "endDate": format!("2024-06-0{day}T10:00:00Z")
            }),
        )
        .await;
    }
    create_event(&app, &bob, standup()).await;

    let (status, body) = send(&app, Method::GET, &format!("/api/events?userId={ada}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"], json!({"total": 5}));
    assert_eq!(body["data"][0]["title"], "Day 1");

    let (_, body) = send(
        &app,
        Method::GET,
        &format!(
            "/api/events?userId={ada}&startDate=2024-06-02T00:00:00Z&endDate=2024-06-04T23:59:59Z"
        ),
        None,
    )
    .await;
    let titles: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, ["Day 2", "Day 3", "Day 4"]);

    let (_, body) = send(
        &app,
        Method::GET,
        &format!("/api/events?userId={ada}&sortOrder=desc&limit=2&offset=1"),
        None,
    )
    .await;
    assert_eq!(body["meta"], json!({"total": 5, "limit": 2, "offset": 1}));
    let titles: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, ["Day 4", "Day 3"]);
}

#[tokio::test]
async fn list_rejects_bad_query_values() {
    let app = test_app();
    let user = create_user(&app, "Ada", "ada@example.com").await;

    for (query, message) in [
        ("limit=-5", "limit must be a non-negative integer"),
        ("offset=abc", "offset must be a non-negative integer"),
        ("startDate=whenever", "Invalid startDate"),
        ("sortOrder=sideways", "sortOrder must be 'asc' or 'desc'"),
    ] {
        let (status, body) = send(
            &app,
            Method::GET,
            &format!("/api/events?userId={user}&{query}"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{query}");
        assert_eq!(body["error"], message);
    }
}

#[tokio::test]
async fn malformed_query_is_a_400_envelope() {
    let app = test_app();
    let user = create_user(&app, "Ada", "ada@example.com").await;
    let id = create_event(&app, &user, standup()).await["id"]
        .as_str()
        .unwrap()
        .to_string();

    for (method, uri) in [
        (Method::GET, format!("/api/events?userId={user}&userId=other")),
        (Method::GET, format!("/api/events/{id}?userId={user}&userId={user}")),
        (Method::DELETE, format!("/api/events/{id}?userId={user}&userId={user}")),
    ] {
        let (status, body) = send(&app, method.clone(), &uri, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{method} {uri}");
        assert_eq!(body["success"], false);
        assert!(body["error"].is_string(), "{body}");
    }

    // Still there
    let (status, _) = send(
        &app,
        Method::GET,
        &format!("/api/events/{id}?userId={user}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

// ─── Middleware ─────────────────────────────────────────────────────────

#[tokio::test]
async fn body_requests_must_be_json() {
    let app = test_app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/users")
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from("name=Ada"))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"], "Content-Type must be application/json");
}

#[tokio::test]
async fn malformed_json_is_a_400_envelope() {
    let app = test_app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/events")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["success"], false);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn rate_limit_returns_429_after_allowance() {
    let app = app_with_config(Config {
        rate_limit: RateLimitConfig {
            max_requests: 3,
            window_secs: 60,
            max_clients: 100,
        },
        ..Config::default()
    });

    for _ in 0..3 {
        let (status, _) = send(&app, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"], "Too many requests. Please try again later.");
}
