use crate::cache::ResourceRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

/// File metadata captured on selection. Transient: discarded on reset or
/// once the workflow completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadCandidate {
    pub file_name: String,
    pub declared_content_type: String,
    pub size_bytes: u64,
}

/// Proof that a candidate passed validation. Only constructible through
/// `utils::validation::validate`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedCandidate {
    inner: UploadCandidate,
}

impl ValidatedCandidate {
    pub(crate) fn new(inner: UploadCandidate) -> Self {
        Self { inner }
    }

    pub fn file_name(&self) -> &str {
        &self.inner.file_name
    }

    pub fn content_type(&self) -> &str {
        &self.inner.declared_content_type
    }

    pub fn size_bytes(&self) -> u64 {
        self.inner.size_bytes
    }
}

/// Request body for the presign endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresignRequest {
    pub file_name: String,
    pub content_type: String,
}

/// A short-lived, single-use credential permitting one byte transfer to a
/// specific destination. The expiry is service-supplied, never synthesized
/// by the caller.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadAuthorization {
    pub upload_url: Url,
    pub file_key: String,
    pub expires_at: DateTime<Utc>,
}

/// Observable state of one upload attempt, published on a watch channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    InProgress(u8),
    Succeeded,
    Failed(String),
}

/// The two resource kinds registered per successful upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Dataset,
    Thing,
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceKind::Dataset => write!(f, "dataset"),
            ResourceKind::Thing => write!(f, "thing"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub id: String,
    pub name: String,
    pub owner: String,
    pub visibility: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thing {
    pub id: String,
    pub name: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl ResourceRecord for Dataset {
    fn id(&self) -> &str {
        &self.id
    }
}

impl ResourceRecord for Thing {
    fn id(&self) -> &str {
        &self.id
    }
}

/// What a fully successful workflow hands back to the caller.
#[derive(Debug, Clone)]
pub struct UploadReceipt {
    pub file_key: String,
    pub dataset: Dataset,
    pub thing: Thing,
}

/// Embed target for the dashboard, resolved to an absolute URL.
#[derive(Debug, Clone)]
pub struct DashboardEmbed {
    pub url: Url,
    pub expires_at: Option<DateTime<Utc>>,
}
