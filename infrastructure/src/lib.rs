// Module declarations
pub mod persistence;
pub mod storage;

// Re-export all implementations
pub use persistence::InMemoryCandidateRepository;
pub use storage::FilesystemAttachmentStore;
