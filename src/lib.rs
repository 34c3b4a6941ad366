pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

pub use cache::{CacheEntry, CorrelationToken, PortalCache, Provenance, ResourceCache};
pub use config::PortalConfig;
pub use error::{AuthError, RegistrationError, TransferError, UploadError, ValidationError};
pub use models::{
    Dataset, ResourceKind, Thing, UploadAuthorization, UploadCandidate, UploadOutcome,
    UploadReceipt,
};
pub use services::coordinator::UploadCoordinator;
pub use services::tally::{InMemoryTally, NoopTally, UploadTally};
