use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::config::PortalConfig;
use crate::error::AuthError;
use crate::models::{PresignRequest, UploadAuthorization, ValidatedCandidate};

/// Structured error payload returned by the issuing service on rejection.
#[derive(Debug, Deserialize)]
struct RejectionBody {
    error: String,
}

/// Obtains short-lived upload authorizations from the presign endpoint.
///
/// Sends the candidate's name and content type; receives the destination
/// URL, a file key, and a service-supplied expiry. No cache mutation.
pub struct AuthorizationRequester {
    client: Client,
    endpoint: String,
}

impl AuthorizationRequester {
    pub fn new(client: Client, config: &PortalConfig) -> Self {
        Self {
            client,
            endpoint: config.presign_url(),
        }
    }

    pub async fn request_authorization(
        &self,
        candidate: &ValidatedCandidate,
    ) -> Result<UploadAuthorization, AuthError> {
        let body = PresignRequest {
            file_name: candidate.file_name().to_string(),
            content_type: candidate.content_type().to_string(),
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| AuthError::ServiceUnavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<RejectionBody>()
                .await
                .map(|b| b.error)
                .unwrap_or_else(|_| format!("HTTP {status}"));
            return Err(AuthError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let authorization = response
            .json::<UploadAuthorization>()
            .await
            .map_err(|e| AuthError::ServiceUnavailable(format!("malformed presign response: {e}")))?;

        debug!(
            file_key = %authorization.file_key,
            expires_at = %authorization.expires_at,
            "upload authorization issued"
        );

        Ok(authorization)
    }
}
