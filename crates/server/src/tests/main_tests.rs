use super::*;
use axum::{
    body::{self, Body},
    http::{header, Request},
};
use shared::{
    domain::{RowIssueReason, StatusColor},
    protocol::EntityRow,
};
use tower::ServiceExt;

async fn test_app() -> (Router, Storage) {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let app = build_router(Arc::new(AppState {
        api: ApiContext {
            storage: storage.clone(),
        },
    }));
    (app, storage)
}

fn form(uri: &str, body: &str) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .expect("request")
}

fn json(method: &str, uri: &str, value: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(value.to_string()))
        .expect("request")
}

fn row<'a>(view: &'a DashboardView, name: &str) -> Option<&'a EntityRow> {
    view.rows.iter().find(|row| row.name == name)
}

fn form_encode(value: &str) -> String {
    value
        .bytes()
        .map(|b| {
            if b.is_ascii_alphanumeric() {
                (b as char).to_string()
            } else {
                format!("%{b:02X}")
            }
        })
        .collect()
}

async fn body_text(response: Response) -> String {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    String::from_utf8(bytes.to_vec()).expect("utf8")
}

async fn fetch_view(app: &Router) -> DashboardView {
    let request = Request::get("/api/entities")
        .body(Body::empty())
        .expect("request");
    let response = app.clone().oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    serde_json::from_str(&body_text(response).await).expect("json")
}

#[tokio::test]
async fn healthz_reports_ok_when_storage_is_ready() {
    let (app, _storage) = test_app().await;
    let request = Request::get("/healthz")
        .body(Body::empty())
        .expect("request");
    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "ok");
}

#[tokio::test]
async fn add_and_adjust_through_forms_redirects_back() {
    let (app, _storage) = test_app().await;

    let response = app
        .clone()
        .oneshot(form("/add", "name=+Juan+&status="))
        .await
        .expect("add");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let view = fetch_view(&app).await;
    let juan = row(&view, "Juan").expect("juan");
    assert_eq!(juan.formatted_status, "0.00");
    assert_eq!(juan.bar_width_percent, 0);

    let response = app
        .clone()
        .oneshot(form("/adjust", "name=Juan&delta=%2B5"))
        .await
        .expect("adjust");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let view = fetch_view(&app).await;
    let juan = row(&view, "Juan").expect("juan");
    assert_eq!(juan.formatted_status, "5.00");
    assert_eq!(juan.bar_width_percent, 100);
    assert_eq!(juan.color, StatusColor::Positive);
    assert_eq!(view.max, 5.0);

    let page = app
        .oneshot(Request::get("/").body(Body::empty()).expect("request"))
        .await
        .expect("page");
    assert_eq!(page.status(), StatusCode::OK);
    let html = body_text(page).await;
    assert!(html.contains("Juan"));
    assert!(html.contains("5.00"));
}

#[tokio::test]
async fn empty_delta_renders_inline_warning() {
    let (app, storage) = test_app().await;
    storage.upsert("Ana", 2.0).await.expect("seed");

    let response = app
        .oneshot(form("/adjust", "name=Ana&delta=+++"))
        .await
        .expect("adjust");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let html = body_text(response).await;
    assert!(html.contains("no value entered"));
    assert_eq!(storage.status_of("Ana").await.expect("lookup"), Some(2.0));
}

#[tokio::test]
async fn delete_and_reset_forms_update_the_store() {
    let (app, storage) = test_app().await;
    storage.upsert("Ana", 2.0).await.expect("ana");
    storage.upsert("Luis", -1.0).await.expect("luis");

    let response = app
        .clone()
        .oneshot(form("/reset", ""))
        .await
        .expect("reset");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(storage.status_of("Luis").await.expect("lookup"), Some(0.0));

    let response = app
        .oneshot(form("/delete", "name=Ana"))
        .await
        .expect("delete");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let names: Vec<_> = storage
        .load_all()
        .await
        .expect("load")
        .into_iter()
        .map(|r| r.name)
        .collect();
    assert_eq!(names, vec!["Luis".to_string()]);
}

#[tokio::test]
async fn bulk_form_reports_issues_inline() {
    let (app, storage) = test_app().await;

    let response = app
        .oneshot(form("/bulk", "rows=Ana%3B+3%0AAna%3B+9%0A%3B+2%0A"))
        .await
        .expect("bulk");
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("2 issue(s)"));

    let records = storage.load_all().await.expect("load");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name, "Ana");
    assert_eq!(records[0].status, 9.0);
}

#[tokio::test]
async fn json_api_covers_add_adjust_remove_and_bulk() {
    let (app, _storage) = test_app().await;

    let response = app
        .clone()
        .oneshot(json(
            "POST",
            "/api/entities",
            serde_json::json!({ "name": "Ana", "status": "3" }),
        ))
        .await
        .expect("add");
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(json(
            "POST",
            "/api/entities/adjust",
            serde_json::json!({ "name": "Ana", "delta": "0" }),
        ))
        .await
        .expect("adjust");
    assert_eq!(response.status(), StatusCode::OK);
    let adjusted: AdjustResponse = serde_json::from_str(&body_text(response).await).expect("json");
    assert_eq!(adjusted.outcome, AdjustOutcome::Unchanged);

    let response = app
        .clone()
        .oneshot(json(
            "POST",
            "/api/entities/adjust",
            serde_json::json!({ "name": "Nadie", "delta": "1" }),
        ))
        .await
        .expect("adjust unknown");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .clone()
        .oneshot(json(
            "PUT",
            "/api/entities",
            serde_json::json!({ "rows": [
                { "name": "Eva", "status": 4 },
                { "name": "Mar Azul", "status": "1,5" },
                { "name": "Leo", "status": "x" },
            ] }),
        ))
        .await
        .expect("bulk");
    assert_eq!(response.status(), StatusCode::OK);
    let replaced: BulkReplaceResponse =
        serde_json::from_str(&body_text(response).await).expect("json");
    assert_eq!(replaced.issues.len(), 1);
    assert_eq!(replaced.issues[0].reason, RowIssueReason::InvalidStatus);
    assert!(row(&replaced.view, "Ana").is_none());

    let response = app
        .clone()
        .oneshot(
            Request::delete("/api/entities/Mar%20Azul")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("remove");
    assert_eq!(response.status(), StatusCode::OK);

    let view = fetch_view(&app).await;
    let names: Vec<_> = view.rows.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["Eva", "Leo"]);
}

#[tokio::test]
async fn json_api_rejects_invalid_numbers() {
    let (app, _storage) = test_app().await;
    let response = app
        .oneshot(json(
            "POST",
            "/api/entities",
            serde_json::json!({ "name": "Ana", "status": "tres" }),
        ))
        .await
        .expect("add");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let err: ApiError = serde_json::from_str(&body_text(response).await).expect("json");
    assert_eq!(err.code, ErrorCode::Validation);
}

#[tokio::test]
async fn bulk_textarea_round_trip_keeps_full_precision() {
    let (app, storage) = test_app().await;
    storage.upsert("Ana", 1.234).await.expect("ana");
    storage.upsert("Luis", 2.0).await.expect("luis");

    let page = app
        .clone()
        .oneshot(Request::get("/").body(Body::empty()).expect("request"))
        .await
        .expect("page");
    let html = body_text(page).await;
    assert!(html.contains("Ana; 1.234"));

    let view = fetch_view(&app).await;
    let edited = page::bulk_text(&view).replace("Luis; 2", "Luis; 7");
    let response = app
        .oneshot(form("/bulk", &format!("rows={}", form_encode(&edited))))
        .await
        .expect("bulk");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    assert_eq!(storage.status_of("Ana").await.expect("lookup"), Some(1.234));
    assert_eq!(storage.status_of("Luis").await.expect("lookup"), Some(7.0));
}

#[tokio::test]
async fn names_with_line_breaks_are_rejected() {
    let (app, storage) = test_app().await;

    let response = app
        .clone()
        .oneshot(json(
            "POST",
            "/api/entities",
            serde_json::json!({ "name": "Ana\nMaria", "status": "1" }),
        ))
        .await
        .expect("add");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(storage.load_all().await.expect("load").is_empty());

    let response = app
        .oneshot(json(
            "PUT",
            "/api/entities",
            serde_json::json!({ "rows": [
                { "name": "Ana\nMaria", "status": 1 },
                { "name": "Luis", "status": 2 },
            ] }),
        ))
        .await
        .expect("bulk");
    assert_eq!(response.status(), StatusCode::OK);
    let replaced: BulkReplaceResponse =
        serde_json::from_str(&body_text(response).await).expect("json");
    assert_eq!(replaced.issues[0].reason, RowIssueReason::InvalidName);
    let names: Vec<_> = replaced.view.rows.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["Luis"]);
}
