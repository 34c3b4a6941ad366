use crate::models::ResourceKind;
use thiserror::Error;

/// Local, pre-network validation failures. Recoverable by the user
/// re-selecting their input; never the result of a network call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid file type: only CSV files are accepted")]
    InvalidFileType,

    #[error("file too large: {size_bytes} bytes exceeds the {max_bytes} byte limit")]
    FileTooLarge { size_bytes: u64, max_bytes: u64 },

    #[error("missing field: {0} is required")]
    MissingField(&'static str),

    #[error("invalid resource name: {0}")]
    InvalidResourceName(String),
}

/// Failures obtaining an upload authorization. Aborts the workflow before
/// any bytes are sent or any cache entry is written.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("authorization service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("authorization rejected (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },
}

/// Byte-transfer failures. Aborts before registration; no cache effect.
#[derive(Error, Debug)]
pub enum TransferError {
    #[error("upload authorization expired before the transfer started")]
    Expired,

    #[error("transfer failed: {0}")]
    IoFailure(String),
}

/// Post-transfer registration failures. The failed kind's speculative cache
/// entry is rolled back; the uploaded bytes and the sibling kind's outcome
/// are left as they are, so the error text must say so.
#[derive(Error, Debug)]
pub enum RegistrationError {
    #[error("{0}")]
    InvalidName(ValidationError),

    #[error(
        "file uploaded but not fully registered: the {kind} record could not be created \
         ({reason}); the uploaded bytes and the other record were kept"
    )]
    Partial { kind: ResourceKind, reason: String },

    #[error(
        "file uploaded but not registered: dataset creation failed ({dataset_reason}); \
         thing creation failed ({thing_reason}); the uploaded bytes were kept"
    )]
    Total {
        dataset_reason: String,
        thing_reason: String,
    },
}

impl RegistrationError {
    /// The resource kinds whose create requests failed.
    pub fn failed_kinds(&self) -> Vec<ResourceKind> {
        match self {
            RegistrationError::InvalidName(_) => vec![],
            RegistrationError::Partial { kind, .. } => vec![*kind],
            RegistrationError::Total { .. } => vec![ResourceKind::Dataset, ResourceKind::Thing],
        }
    }
}

/// Top-level error for one coordinator invocation.
#[derive(Error, Debug)]
pub enum UploadError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Transfer(#[from] TransferError),

    #[error(transparent)]
    Registration(#[from] RegistrationError),
}
