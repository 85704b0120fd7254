use std::collections::HashMap;
use std::time::Duration;

use axum::{
    extract::{Path, Query},
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde_json::{json, Value};
use tokio::net::TcpListener;

use task_manager::api::{ApiClient, ApiError};
use task_manager::fetch;
use task_manager::models::NewTask;

async fn serve(router: Router) -> ApiClient {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    ApiClient::with_base_url(&format!("http://{}/", addr), Duration::from_secs(5)).unwrap()
}

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[tokio::test]
async fn login_decodes_session() {
    let router = Router::new().route(
        "/login/",
        post(|Json(body): Json<Value>| async move {
            assert_eq!(body["email"], "pm@example.com");
            Json(json!({ "user_id": 5, "role": "manager" }))
        }),
    );
    let client = serve(router).await;

    let login = client.login("pm@example.com", "secret").await.unwrap();
    assert_eq!(login.user_id, 5);
    assert_eq!(login.role, "manager");
}

#[tokio::test]
async fn rejected_login_is_a_status_error() {
    let router = Router::new().route(
        "/login/",
        post(|| async { (StatusCode::UNAUTHORIZED, "bad credentials") }),
    );
    let client = serve(router).await;

    let err = client.login("pm@example.com", "wrong").await.unwrap_err();
    assert_eq!(err.status().map(|s| s.as_u16()), Some(401));
    assert_eq!(err.user_message(), "Invalid credentials");
}

#[tokio::test]
async fn schema_mismatch_is_a_parse_error() {
    let router = Router::new().route(
        "/projects/",
        get(|| async { Json(json!([{ "id": "seven", "name": "Website" }])) }),
    );
    let client = serve(router).await;

    let err = client.list_projects().await.unwrap_err();
    assert!(matches!(err, ApiError::Parse { ref path, .. } if path == "/projects/"));
}

#[tokio::test]
async fn projects_decode_with_dates() {
    let router = Router::new().route(
        "/projects/",
        get(|| async {
            Json(json!([{
                "id": 8,
                "name": "Website",
                "client_name": "Acme",
                "start_date": "2024-01-01",
                "end_date": "2024-06-30",
                "started": true
            }]))
        }),
    );
    let client = serve(router).await;

    let projects = client.list_projects().await.unwrap();
    assert_eq!(projects.len(), 1);
    assert_eq!(projects[0].end_date, day(2024, 6, 30));
    assert!(projects[0].started);
}

#[tokio::test]
async fn time_entries_are_filtered_by_task_and_user() {
    let router = Router::new().route(
        "/tasks/timeentries/",
        get(|Query(params): Query<HashMap<String, String>>| async move {
            assert_eq!(params.get("task_id").map(String::as_str), Some("12"));
            assert_eq!(params.get("user_id").map(String::as_str), Some("5"));
            Json(json!([{
                "id": 1,
                "task_id": 12,
                "user_id": 5,
                "work_date": "2024-01-12",
                "hours": 2.5,
                "is_billable": true
            }]))
        }),
    );
    let client = serve(router).await;

    let entries = client.list_time_entries(12, 5).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].work_date, day(2024, 1, 12));
    assert_eq!(entries[0].hours, 2.5);
}

#[tokio::test]
async fn invoice_preview_sends_period() {
    let router = Router::new().route(
        "/projects/:id/invoice-table/",
        get(
            |Path(id): Path<i32>, Query(params): Query<HashMap<String, String>>| async move {
                assert_eq!(id, 8);
                assert_eq!(params.get("start_date").map(String::as_str), Some("2024-03-04"));
                assert_eq!(params.get("end_date").map(String::as_str), Some("2024-03-10"));
                Json(json!({
                    "rows": [{
                        "task": "Build",
                        "phase": "Dev",
                        "task_contributor": "Ada",
                        "hours": 4.0,
                        "rate": 50.0,
                        "amount": 200.0
                    }],
                    "total_amount": 200.0
                }))
            },
        ),
    );
    let client = serve(router).await;

    let table = client
        .invoice_table(8, day(2024, 3, 4), day(2024, 3, 10))
        .await
        .unwrap();
    assert_eq!(table.rows.len(), 1);
    assert_eq!(table.total_amount, 200.0);
}

#[tokio::test]
async fn create_task_returns_new_id() {
    let router = Router::new().route(
        "/tasks/",
        post(|Json(body): Json<Value>| async move {
            assert_eq!(body["status"], "Not Started");
            assert_eq!(body["due_date"], "2024-01-15");
            Json(json!({ "task_id": 41 }))
        }),
    );
    let client = serve(router).await;

    let task = NewTask {
        phase_id: 3,
        title: "Wireframes".to_string(),
        description: String::new(),
        start_date: day(2024, 1, 10),
        end_date: day(2024, 1, 20),
        due_date: day(2024, 1, 15),
        status: "Not Started".to_string(),
        budget: 4000,
    };
    assert_eq!(client.create_task(&task).await.unwrap(), 41);
}

#[tokio::test]
async fn spend_refresh_skips_failed_tasks() {
    let router = Router::new().route(
        "/tasks/:id/actual-spend/",
        patch(|Path(id): Path<i32>| async move {
            if id == 2 {
                Err(StatusCode::INTERNAL_SERVER_ERROR)
            } else {
                Ok(Json(json!({ "actual_spend": f64::from(id) * 100.0 })))
            }
        }),
    );
    let client = serve(router).await;

    let spend = fetch::refresh_actual_spend(&client, &[1, 2, 3]).await;
    assert_eq!(spend.len(), 2);
    assert_eq!(spend.get(&1), Some(&100.0));
    assert_eq!(spend.get(&3), Some(&300.0));
    assert!(!spend.contains_key(&2));
}

#[tokio::test]
async fn unreachable_server_is_a_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client =
        ApiClient::with_base_url(&format!("http://{}", addr), Duration::from_secs(5)).unwrap();
    let err = client.list_projects().await.unwrap_err();
    assert!(matches!(err, ApiError::Transport { .. }));
    assert_eq!(err.user_message(), "Could not reach the server");
}
