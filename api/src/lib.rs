use axum::{
    Router,
    extract::{
        DefaultBodyLimit, Multipart, Path, Query, State,
        multipart::{MultipartError, MultipartRejection},
        rejection::QueryRejection,
    },
    http::StatusCode,
    response::{IntoResponse, Json as JsonResponse, Response},
    routing::{delete, get, post},
};
use serde_json::json;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use application::{
    ApplicationError, AttachmentUpload, CandidateFilter, CandidateService,
    CreateCandidateRequest, StatsService,
};
use domain::DomainError;

pub mod config;

/// Multipart part carrying the resume file.
pub const RESUME_FIELD: &str = "resume_file";

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    candidate_service: Arc<CandidateService>,
    stats_service: Arc<StatsService>,
}

impl AppState {
    pub fn new(candidate_service: Arc<CandidateService>, stats_service: Arc<StatsService>) -> Self {
        Self {
            candidate_service,
            stats_service,
        }
    }
}

/// Builds the HTTP surface. Candidate collection routes answer both with and
/// without the trailing slash.
pub fn build_router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/stats", get(get_stats_handler))
        // Candidate collection
        .route("/candidates", post(create_candidate_handler))
        .route("/candidates", get(list_candidates_handler))
        .route("/candidates/", post(create_candidate_handler))
        .route("/candidates/", get(list_candidates_handler))
        // Single candidate
        .route("/candidates/:id", get(get_candidate_handler))
        .route("/candidates/:id", delete(delete_candidate_handler))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// --- API Handlers ---

async fn health_check() -> impl IntoResponse {
    info!("Health check endpoint called");
    (StatusCode::OK, JsonResponse(json!({ "status": "healthy" })))
}

async fn get_stats_handler(State(state): State<AppState>) -> Response {
    info!("Received request to get statistics");
    match state.stats_service.get_stats().await {
        Ok(stats_response) => (StatusCode::OK, JsonResponse(stats_response)).into_response(),
        Err(e) => {
            error!("Failed to get statistics via handler: {}", e);
            map_application_error_to_response(e)
        }
    }
}

/// Handler for submitting a candidate (POST /candidates/).
async fn create_candidate_handler(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    info!("Received request to create candidate");
    let multipart = match multipart {
        Ok(multipart) => multipart,
        Err(rejection) => {
            warn!("Rejected create request: {}", rejection);
            return detail_response(rejection.status(), rejection.body_text());
        }
    };
    let request = match read_submission(multipart).await {
        Ok(request) => request,
        Err(response) => return response,
    };
    match state.candidate_service.create_candidate(request).await {
        Ok(candidate) => {
            info!(candidate_id = %candidate.id(), "Candidate created successfully via handler");
            (StatusCode::CREATED, JsonResponse(candidate)).into_response()
        }
        Err(e) => {
            error!("Failed to create candidate via handler: {}", e);
            map_application_error_to_response(e)
        }
    }
}

/// Handler for listing candidates (GET /candidates/?skill=&min_experience=&graduation_year=).
async fn list_candidates_handler(
    State(state): State<AppState>,
    query: Result<Query<CandidateFilter>, QueryRejection>,
) -> Response {
    let Query(filter) = match query {
        Ok(query) => query,
        Err(rejection) => {
            warn!("Rejected candidate query: {}", rejection);
            return detail_response(rejection.status(), rejection.body_text());
        }
    };
    info!(
        skill = ?filter.skill,
        min_experience = ?filter.min_experience,
        graduation_year = ?filter.graduation_year,
        "Received request to list candidates"
    );
    match state.candidate_service.list_candidates(&filter).await {
        Ok(candidates) => (StatusCode::OK, JsonResponse(candidates)).into_response(),
        Err(e) => {
            error!("Failed to list candidates via handler: {}", e);
            map_application_error_to_response(e)
        }
    }
}

/// Handler for fetching one candidate (GET /candidates/:id).
async fn get_candidate_handler(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    info!(candidate_id = %id, "Received request to get candidate");
    match state.candidate_service.get_candidate(&id).await {
        Ok(candidate) => (StatusCode::OK, JsonResponse(candidate)).into_response(),
        Err(e) => {
            warn!(candidate_id = %id, "Failed to get candidate via handler: {}", e);
            map_application_error_to_response(e)
        }
    }
}

/// Handler for deleting a candidate (DELETE /candidates/:id).
async fn delete_candidate_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Response {
    info!(candidate_id = %id, "Received request to delete candidate");
    match state.candidate_service.delete_candidate(&id).await {
        Ok(()) => {
            info!(candidate_id = %id, "Candidate deleted successfully via handler");
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => {
            warn!(candidate_id = %id, "Failed to delete candidate via handler: {}", e);
            map_application_error_to_response(e)
        }
    }
}

/// Collects the multipart form into a create request. Text parts become
/// fields; the `resume_file` part becomes the attachment.
async fn read_submission(mut multipart: Multipart) -> Result<CreateCandidateRequest, Response> {
    let mut request = CreateCandidateRequest::default();
    let mut attachment = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return Err(multipart_error_response(e)),
        };
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        if name == RESUME_FIELD {
            let file_name = field.file_name().map(str::to_string);
            let content_type = field.content_type().map(str::to_string);
            let data = field.bytes().await.map_err(multipart_error_response)?;
            attachment = Some(AttachmentUpload {
                file_name,
                content_type,
                data: data.to_vec(),
            });
        } else {
            let value = field.text().await.map_err(multipart_error_response)?;
            request.fields.insert(name, value);
        }
    }

    request.attachment = attachment.ok_or_else(|| {
        map_application_error_to_response(
            DomainError::MissingField(RESUME_FIELD.to_string()).into(),
        )
    })?;
    Ok(request)
}

fn multipart_error_response(err: MultipartError) -> Response {
    warn!("Rejected multipart body: {}", err);
    let status = err.status();
    detail_response(status, err.body_text())
}

fn detail_response(status: StatusCode, detail: String) -> Response {
    (status, JsonResponse(json!({ "detail": detail }))).into_response()
}

/// Maps ApplicationError to an HTTP status and `{"detail": ...}` body.
fn map_application_error_to_response(err: ApplicationError) -> Response {
    let (status, detail) = match err {
        ApplicationError::UnsupportedAttachmentType(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        ApplicationError::DomainError(domain_err) => {
            warn!("Domain validation failed: {}", domain_err);
            (StatusCode::UNPROCESSABLE_ENTITY, domain_err.to_string())
        }
        ApplicationError::NotFound(_) => {
            (StatusCode::NOT_FOUND, "Candidate not found".to_string())
        }
        ApplicationError::StorageWriteFailure { .. } => {
            error!("Attachment storage error: {}", err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Could not save file".to_string(),
            )
        }
        ApplicationError::StorageDeleteFailure { .. } => {
            error!("Attachment storage error: {}", err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Could not delete file".to_string(),
            )
        }
        ApplicationError::DuplicateIdentity(id) => {
            error!(candidate_id = %id, "Identity collision on insert");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "An internal server error occurred".to_string(),
            )
        }
        ApplicationError::InfrastructureError(msg) => {
            error!("Underlying infrastructure error: {}", msg);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "An internal server error occurred".to_string(),
            )
        }
    };
    detail_response(status, detail)
}
