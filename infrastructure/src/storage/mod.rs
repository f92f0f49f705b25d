pub mod filesystem_attachment_store;

pub use filesystem_attachment_store::FilesystemAttachmentStore;
