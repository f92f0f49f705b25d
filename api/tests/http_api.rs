use api::{AppState, build_router};
use application::{CandidateService, StatsService};
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use infrastructure::{FilesystemAttachmentStore, InMemoryCandidateRepository};
use serde_json::{Value, json};
use std::path::Path;
use std::sync::Arc;
use tower::ServiceExt;

const BOUNDARY: &str = "resume-collector-test-boundary";

async fn app_with_limit(upload_dir: &Path, max_upload_bytes: usize) -> Router {
    let repository = Arc::new(InMemoryCandidateRepository::new());
    let store = Arc::new(FilesystemAttachmentStore::open(upload_dir).await.unwrap());
    let candidate_service = Arc::new(CandidateService::new(repository.clone(), store));
    let stats_service = Arc::new(StatsService::new(repository, upload_dir.to_path_buf()));
    build_router(
        AppState::new(candidate_service, stats_service),
        max_upload_bytes,
    )
}

async fn app(upload_dir: &Path) -> Router {
    app_with_limit(upload_dir, 1024 * 1024).await
}

struct Form {
    fields: Vec<(String, String)>,
    file: Option<(String, String, Vec<u8>)>,
}

impl Form {
    fn candidate(skills: &str, experience: &str, year: &str) -> Self {
        let fields = [
            ("full_name", "Margaret Hamilton"),
            ("dob", "1991-08-17"),
            ("contact_number", "555-0177"),
            ("contact_address", "Cambridge, MA"),
            ("education_qualification", "BA Mathematics"),
            ("graduation_year", year),
            ("years_of_experience", experience),
            ("skill_set", skills),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        Self {
            fields,
            file: Some((
                "resume.pdf".to_string(),
                "application/pdf".to_string(),
                b"%PDF-1.4 apollo".to_vec(),
            )),
        }
    }

    fn with_file(mut self, file_name: &str, content_type: &str) -> Self {
        let data = self.file.take().map(|(_, _, data)| data).unwrap_or_default();
        self.file = Some((file_name.to_string(), content_type.to_string(), data));
        self
    }

    fn without(mut self, field: &str) -> Self {
        self.fields.retain(|(name, _)| name != field);
        self
    }

    fn without_file(mut self) -> Self {
        self.file = None;
        self
    }

    fn body(&self) -> Vec<u8> {
        let mut body = Vec::new();
        for (name, value) in &self.fields {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }
        if let Some((file_name, content_type, data)) = &self.file {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"resume_file\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn request(&self, uri: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(self.body()))
            .unwrap()
    }
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

async fn send_json(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let (status, bytes) = send(app, request).await;
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn delete(uri: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn create(app: &Router, form: Form) -> Value {
    let (status, body) = send_json(app, form.request("/candidates/")).await;
    assert_eq!(status, StatusCode::CREATED, "unexpected body: {body}");
    body
}

fn files_in(dir: &Path) -> usize {
    std::fs::read_dir(dir).unwrap().count()
}

#[tokio::test]
async fn health_reports_healthy() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path()).await;
    let (status, body) = send_json(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "healthy" }));
}

#[tokio::test]
async fn create_returns_record_and_stores_file() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path()).await;

    let body = create(&app, Form::candidate(" Python, C++ , SQL,", "4.5", "2013")).await;

    let id = body["id"].as_str().unwrap();
    assert!(!id.is_empty());
    assert_eq!(body["full_name"], "Margaret Hamilton");
    assert_eq!(body["dob"], "1991-08-17");
    assert_eq!(body["graduation_year"], 2013);
    assert_eq!(body["years_of_experience"], 4.5);
    assert_eq!(body["skill_set"], json!(["Python", "C++", "SQL"]));

    let stored = dir.path().join(format!("{id}.pdf"));
    assert_eq!(body["resume_file_path"], json!(stored.display().to_string()));
    assert_eq!(std::fs::read(&stored).unwrap(), b"%PDF-1.4 apollo");

    let (status, fetched) = send_json(&app, get(&format!("/candidates/{id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, body);
}

#[tokio::test]
async fn create_without_trailing_slash_is_accepted() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path()).await;
    let (status, _) = send_json(
        &app,
        Form::candidate("Go", "1", "2020").request("/candidates"),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn unsupported_attachment_type_is_bad_request() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path()).await;

    let form = Form::candidate("Rust", "2", "2020").with_file("notes.txt", "text/plain");
    let (status, body) = send_json(&app, form.request("/candidates/")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().contains("Invalid file type"));
    assert_eq!(files_in(dir.path()), 0);
    let (_, listed) = send_json(&app, get("/candidates/")).await;
    assert_eq!(listed, json!([]));
}

#[tokio::test]
async fn missing_or_invalid_fields_are_unprocessable() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path()).await;

    let cases = [
        Form::candidate("Rust", "2", "2020").without("full_name"),
        Form::candidate("Rust", "2", "twenty-twenty"),
        Form::candidate("Rust", "-1", "2020"),
        Form::candidate("Rust", "2", "2020").without_file(),
    ];
    for form in cases {
        let (status, body) = send_json(&app, form.request("/candidates/")).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "body: {body}");
        assert!(body["detail"].is_string());
    }
    assert_eq!(files_in(dir.path()), 0);
}

#[tokio::test]
async fn oversized_upload_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let app = app_with_limit(dir.path(), 64).await;

    let (status, _) = send(&app, Form::candidate("Rust", "2", "2020").request("/candidates/")).await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(files_in(dir.path()), 0);
}

#[tokio::test]
async fn unknown_candidate_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path()).await;

    let (status, body) = send_json(&app, get("/candidates/does-not-exist")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Candidate not found");

    let (status, _) = send_json(&app, delete("/candidates/does-not-exist")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_removes_record_and_file() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path()).await;
    let kept = create(&app, Form::candidate("Rust", "2", "2020")).await;
    let removed = create(&app, Form::candidate("Go", "3", "2021")).await;
    let removed_id = removed["id"].as_str().unwrap();

    let (status, bytes) = send(&app, delete(&format!("/candidates/{removed_id}"))).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(bytes.is_empty());

    assert!(!Path::new(removed["resume_file_path"].as_str().unwrap()).exists());
    assert_eq!(files_in(dir.path()), 1);

    let (status, _) = send_json(&app, get(&format!("/candidates/{removed_id}"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, listed) = send_json(&app, get("/candidates/")).await;
    assert_eq!(listed, json!([kept]));
}

#[tokio::test]
async fn listing_applies_query_filters() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path()).await;
    let sql = create(&app, Form::candidate("SQL, Go", "2.9", "2018")).await;
    let python = create(&app, Form::candidate("Python", "3.0", "2019")).await;

    let (status, all) = send_json(&app, get("/candidates/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all, json!([sql.clone(), python.clone()]));

    let (_, by_skill) = send_json(&app, get("/candidates/?skill=sql")).await;
    assert_eq!(by_skill, json!([sql.clone()]));

    let (_, by_experience) = send_json(&app, get("/candidates/?min_experience=3.0")).await;
    assert_eq!(by_experience, json!([python.clone()]));

    let (_, by_year) = send_json(&app, get("/candidates?graduation_year=2018")).await;
    assert_eq!(by_year, json!([sql.clone()]));

    let (_, combined) =
        send_json(&app, get("/candidates/?skill=go&min_experience=3&graduation_year=2018")).await;
    assert_eq!(combined, json!([]));

    let (_, empty_skill) = send_json(&app, get("/candidates/?skill=")).await;
    assert_eq!(empty_skill, json!([sql, python]));
}

#[tokio::test]
async fn malformed_query_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path()).await;
    for uri in [
        "/candidates/?graduation_year=soon",
        "/candidates/?min_experience=abc",
    ] {
        let (status, body) = send_json(&app, get(uri)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "uri: {uri}");
        assert!(body["detail"].is_string(), "uri: {uri}, body: {body}");
    }
}

#[tokio::test]
async fn non_multipart_create_is_rejected_with_detail() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path()).await;
    let request = Request::builder()
        .method("POST")
        .uri("/candidates/")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"full_name":"Ada"}"#))
        .unwrap();

    let (status, body) = send_json(&app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].is_string(), "body: {body}");
    assert_eq!(files_in(dir.path()), 0);
}

#[tokio::test]
async fn oversized_upload_reports_detail() {
    let dir = tempfile::tempdir().unwrap();
    let app = app_with_limit(dir.path(), 64).await;

    let (status, body) =
        send_json(&app, Form::candidate("Rust", "2", "2020").request("/candidates/")).await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(body["detail"].is_string(), "body: {body}");
}

#[tokio::test]
async fn stats_count_live_candidates() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path()).await;
    create(&app, Form::candidate("Rust", "2", "2020")).await;

    let (status, body) = send_json(&app, get("/stats")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["engine"]["total_candidates"], 1);
    assert_eq!(
        body["engine"]["upload_directory"],
        json!(dir.path().display().to_string())
    );
}
