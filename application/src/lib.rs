use async_trait::async_trait;
use domain::{
    AttachmentKind, Candidate, CandidateId, CandidateProfile, DomainError, stored_file_name,
};
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use sysinfo::{Disks, MemoryRefreshKind, Pid, System};
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

pub mod query;

pub use query::{CandidateFilter, filter_candidates};

// --- Application Errors ---
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("Invalid file type '{0}'. Only PDF, DOC, and DOCX are allowed.")]
    UnsupportedAttachmentType(String),
    #[error("Candidate not found: {0}")]
    NotFound(String),
    #[error("Could not save file '{file_name}': {source}")]
    StorageWriteFailure {
        file_name: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Could not delete file '{}': {source}", path.display())]
    StorageDeleteFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// A generated identity collided with a live record. Never expected.
    #[error("Candidate identity already exists: {0}")]
    DuplicateIdentity(String),
    #[error("Domain validation error: {0}")]
    DomainError(#[from] DomainError),
    #[error("Infrastructure error: {0}")]
    InfrastructureError(String),
}

// --- Infrastructure Interfaces (Traits) ---

/// Owner of the in-memory candidate collection.
#[async_trait]
pub trait CandidateRepository: Send + Sync {
    /// Appends a record. Fails with `DuplicateIdentity` if the id is taken.
    async fn insert(&self, candidate: Candidate) -> Result<(), ApplicationError>;
    /// Looks a record up by id, or `NotFound`.
    async fn get(&self, id: &CandidateId) -> Result<Candidate, ApplicationError>;
    /// Removes and returns a record, or `NotFound`. Never touches attachments.
    async fn delete(&self, id: &CandidateId) -> Result<Candidate, ApplicationError>;
    /// Snapshot of every record in insertion order.
    async fn list_all(&self) -> Result<Vec<Candidate>, ApplicationError>;
    /// Number of live records.
    async fn count(&self) -> Result<usize, ApplicationError>;
}

/// Durable storage for resume files.
#[async_trait]
pub trait AttachmentStore: Send + Sync {
    /// Writes `data` under `file_name` and returns the stored file's path.
    async fn save(&self, file_name: &str, data: &[u8]) -> Result<PathBuf, ApplicationError>;
    /// Removes the file at `path`. A file that is already gone is not an error.
    async fn delete(&self, path: &Path) -> Result<(), ApplicationError>;
}

// --- Request/Response Models (Data Transfer Objects - DTOs) ---

/// The uploaded resume as received from the client.
#[derive(Debug, Clone, Default)]
pub struct AttachmentUpload {
    /// Original file name, used only to pick the stored extension.
    pub file_name: Option<String>,
    /// Declared MIME type.
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

/// Request to create a candidate: raw text fields plus the resume.
#[derive(Debug, Clone, Default)]
pub struct CreateCandidateRequest {
    /// Field name -> raw text value.
    pub fields: HashMap<String, String>,
    pub attachment: AttachmentUpload,
}

#[derive(Serialize, Debug)]
pub struct MemoryStats {
    total_bytes: u64,
    used_bytes: u64,
    free_bytes: u64,
    available_bytes: u64,
    process_used_bytes: u64,
}

#[derive(Serialize, Debug)]
pub struct DiskStats {
    disk_path: String, // Mount point holding the upload directory
    total_bytes: u64,
    available_bytes: u64,
}

#[derive(Serialize, Debug)]
pub struct EngineStats {
    total_candidates: usize,
    upload_directory: String,
}

#[derive(Serialize, Debug)]
pub struct SystemInfo {
    os_name: String,
    os_version: String,
}

/// Response for the /stats endpoint.
#[derive(Serialize, Debug)]
pub struct StatsResponse {
    system_info: SystemInfo,
    memory: MemoryStats,
    disk: DiskStats,
    engine: EngineStats,
}

impl StatsResponse {
    pub fn total_candidates(&self) -> usize {
        self.engine.total_candidates
    }
}

// --- Application Services (Use Cases) ---

/// Keeps a record and its resume file together: both are created in
/// `create_candidate` and both are removed in `delete_candidate`.
pub struct CandidateService {
    repository: Arc<dyn CandidateRepository>,
    attachments: Arc<dyn AttachmentStore>,
}

impl CandidateService {
    pub fn new(
        repository: Arc<dyn CandidateRepository>,
        attachments: Arc<dyn AttachmentStore>,
    ) -> Self {
        Self {
            repository,
            attachments,
        }
    }

    /// Validates the submission, stores the resume, then inserts the record.
    ///
    /// Nothing is written unless every field and the attachment type are
    /// valid, and the record is only inserted after the file is on disk.
    #[instrument(skip(self, request), fields(file_name = ?request.attachment.file_name))]
    pub async fn create_candidate(
        &self,
        request: CreateCandidateRequest,
    ) -> Result<Candidate, ApplicationError> {
        info!("Attempting to create candidate");
        let CreateCandidateRequest { fields, attachment } = request;

        // 1. Validate the declared attachment type
        let content_type = attachment.content_type.as_deref().unwrap_or_default();
        let kind = AttachmentKind::from_content_type(content_type).ok_or_else(|| {
            warn!(content_type = %content_type, "Rejected attachment with unsupported type");
            ApplicationError::UnsupportedAttachmentType(content_type.to_string())
        })?;

        // 2. Validate the remaining fields before any side effect
        let profile = CandidateProfile::from_fields(&fields)?;
        debug!(kind = ?kind, skills = profile.skill_set.len(), "Submission validated");

        // 3. Allocate the identity, which also names the stored file
        let id = CandidateId::generate();
        let file_name = stored_file_name(&id, attachment.file_name.as_deref());

        // 4. Persist the attachment
        let attachment_path = self
            .attachments
            .save(&file_name, &attachment.data)
            .await
            .map_err(|e| {
                error!(candidate_id = %id, "Failed to store attachment: {}", e);
                e
            })?;
        debug!(candidate_id = %id, path = %attachment_path.display(), "Attachment stored");

        // 5. Insert the record
        let candidate = Candidate::new(id, profile, attachment_path);
        if let Err(e) = self.repository.insert(candidate.clone()).await {
            error!(candidate_id = %candidate.id(), "Failed to insert candidate: {}", e);
            if let Err(cleanup_err) = self.attachments.delete(candidate.attachment_path()).await {
                error!(candidate_id = %candidate.id(), "Rollback failed: could not delete stored attachment: {}", cleanup_err);
            }
            return Err(e);
        }

        info!(candidate_id = %candidate.id(), "Candidate created successfully");
        Ok(candidate)
    }

    #[instrument(skip(self))]
    pub async fn get_candidate(&self, id: &str) -> Result<Candidate, ApplicationError> {
        debug!("Attempting to retrieve candidate");
        self.repository
            .get(&CandidateId::new(id.to_string()))
            .await
    }

    #[instrument(skip(self))]
    pub async fn list_candidates(
        &self,
        filter: &CandidateFilter,
    ) -> Result<Vec<Candidate>, ApplicationError> {
        let all = self.repository.list_all().await?;
        let total = all.len();
        let matched = filter_candidates(all, filter);
        info!(total, matched = matched.len(), "Candidates listed");
        Ok(matched)
    }

    /// Removes a candidate and, best-effort, its resume file.
    ///
    /// A failed file delete is logged and ignored so that the record is still
    /// removed; the file is then orphaned on storage.
    #[instrument(skip(self))]
    pub async fn delete_candidate(&self, id: &str) -> Result<(), ApplicationError> {
        info!("Attempting to delete candidate");
        let id = CandidateId::new(id.to_string());

        // 1. The record must exist
        let candidate = self.repository.get(&id).await.map_err(|e| {
            warn!(candidate_id = %id, "Deletion failed: {}", e);
            e
        })?;

        // 2. Remove the attachment, tolerating failure
        match self.attachments.delete(candidate.attachment_path()).await {
            Ok(()) => {
                debug!(candidate_id = %id, "Attachment deleted");
            }
            Err(e) => {
                warn!(
                    candidate_id = %id,
                    path = %candidate.attachment_path().display(),
                    "Attachment could not be deleted and is now orphaned: {}", e
                );
            }
        }

        // 3. Remove the record
        self.repository.delete(&id).await?;
        info!(candidate_id = %id, "Candidate deleted successfully");
        Ok(())
    }
}

pub struct StatsService {
    repository: Arc<dyn CandidateRepository>,
    upload_dir: PathBuf,
}

impl StatsService {
    pub fn new(repository: Arc<dyn CandidateRepository>, upload_dir: PathBuf) -> Self {
        Self {
            repository,
            upload_dir,
        }
    }

    #[instrument(skip(self))]
    pub async fn get_stats(&self) -> Result<StatsResponse, ApplicationError> {
        info!("Gathering service and system statistics");

        let total_candidates = self.repository.count().await.map_err(|e| {
            error!("Failed to count candidates for stats: {}", e);
            ApplicationError::InfrastructureError("Failed to retrieve candidate count".to_string())
        })?;

        let engine_stats = EngineStats {
            total_candidates,
            upload_directory: self.upload_dir.display().to_string(),
        };
        debug!("Engine stats gathered: {:?}", engine_stats);

        // sysinfo probing is blocking; the upload directory is moved in to pick its disk
        let upload_dir = self.upload_dir.clone();
        let (system_info, memory_stats, disk_stats) = tokio::task::spawn_blocking(move || {
            let mut sys = System::new_all();
            sys.refresh_memory_specifics(MemoryRefreshKind::everything());
            let disks = Disks::new_with_refreshed_list();

            let current_pid = Pid::from(std::process::id() as usize);
            let process_memory = sys.process(current_pid).map_or(0, |p| p.memory());

            let memory_stats = MemoryStats {
                total_bytes: sys.total_memory(),
                used_bytes: sys.used_memory(),
                free_bytes: sys.free_memory(),
                available_bytes: sys.available_memory(),
                process_used_bytes: process_memory,
            };

            // The disk is the one holding uploads, not the working directory:
            // longest mount point prefixing the canonical upload path.
            // A missing directory resolves relative to the cwd.
            let target = std::fs::canonicalize(&upload_dir).unwrap_or_else(|_| {
                std::env::current_dir()
                    .map(|cwd| cwd.join(&upload_dir))
                    .unwrap_or_else(|_| PathBuf::from("/"))
            });
            let mut disk_stats = DiskStats {
                disk_path: "unknown".to_string(),
                total_bytes: 0,
                available_bytes: 0,
            };
            let mut best_match_len = 0;
            for disk in &disks {
                let mount_point = disk.mount_point();
                if target.starts_with(mount_point) {
                    let mount_point_len = mount_point.as_os_str().len();
                    if mount_point_len > best_match_len {
                        best_match_len = mount_point_len;
                        disk_stats = DiskStats {
                            disk_path: mount_point.to_string_lossy().into_owned(),
                            total_bytes: disk.total_space(),
                            available_bytes: disk.available_space(),
                        };
                    }
                }
            }

            let system_info = SystemInfo {
                os_name: System::name().unwrap_or_else(|| "Unknown OS".to_string()),
                os_version: System::os_version().unwrap_or_else(|| "Unknown Version".to_string()),
            };

            (system_info, memory_stats, disk_stats)
        })
        .await
        .map_err(|e| {
            ApplicationError::InfrastructureError(format!(
                "System stat gathering task failed: {}",
                e // JoinError
            ))
        })?;

        debug!(
            "System stats gathered: {:?}, {:?}, {:?}",
            system_info, memory_stats, disk_stats
        );

        Ok(StatsResponse {
            system_info,
            memory: memory_stats,
            disk: disk_stats,
            engine: engine_stats,
        })
    }
}
