//! Drives one upload workflow end to end:
//! validate -> authorize -> transfer -> register.

use bytes::Bytes;
use futures::StreamExt;
use reqwest::Client;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

use crate::cache::PortalCache;
use crate::config::PortalConfig;
use crate::error::{TransferError, UploadError};
use crate::models::{UploadCandidate, UploadOutcome, UploadReceipt};
use crate::services::presign::AuthorizationRequester;
use crate::services::registrar::ResourceRegistrar;
use crate::services::tally::UploadTally;
use crate::services::transfer::TransferExecutor;
use crate::utils::validation;

/// Coordinates the upload-then-register workflow against one backend.
///
/// Failure semantics per stage:
/// - validation failures never reach the network;
/// - authorization and transfer failures abort before any cache mutation;
/// - registration failures roll back only the failed kind's speculative
///   entry, while the transferred bytes stay put (surfaced in the error
///   text as "uploaded but not fully registered").
///
/// No stage is retried automatically. There is no cancellation API: a caller
/// that abandons an invocation leaves its speculative entries pending until
/// the in-flight requests settle on their own. This is a known limitation,
/// not silent leakage.
pub struct UploadCoordinator {
    config: PortalConfig,
    authorizer: AuthorizationRequester,
    transfer: TransferExecutor,
    registrar: ResourceRegistrar,
    cache: Arc<PortalCache>,
    tally: Arc<dyn UploadTally>,
    progress: watch::Sender<UploadOutcome>,
}

impl UploadCoordinator {
    pub fn new(
        client: Client,
        config: PortalConfig,
        cache: Arc<PortalCache>,
        tally: Arc<dyn UploadTally>,
    ) -> Self {
        let (progress, _) = watch::channel(UploadOutcome::InProgress(0));
        Self {
            authorizer: AuthorizationRequester::new(client.clone(), &config),
            transfer: TransferExecutor::new(client.clone()),
            registrar: ResourceRegistrar::new(client, &config, cache.clone()),
            config,
            cache,
            tally,
            progress,
        }
    }

    /// The cache this coordinator writes; presentation code reads it freely.
    pub fn cache(&self) -> &Arc<PortalCache> {
        &self.cache
    }

    /// Subscribe to progress and outcome updates. Concurrent uploads share
    /// the channel, so observers of a specific attempt should subscribe
    /// before starting it and stop at its terminal outcome.
    pub fn subscribe(&self) -> watch::Receiver<UploadOutcome> {
        self.progress.subscribe()
    }

    /// Runs the full workflow for one file. Returns the receipt on full
    /// success; every failure leaves the cache in the well-defined state
    /// described on the type.
    pub async fn upload(
        &self,
        candidate: UploadCandidate,
        bytes: Bytes,
    ) -> Result<UploadReceipt, UploadError> {
        match self.run(candidate, bytes).await {
            Ok(receipt) => {
                let _ = self.progress.send(UploadOutcome::Succeeded);
                Ok(receipt)
            }
            Err(err) => {
                let _ = self.progress.send(UploadOutcome::Failed(err.to_string()));
                Err(err)
            }
        }
    }

    async fn run(
        &self,
        candidate: UploadCandidate,
        bytes: Bytes,
    ) -> Result<UploadReceipt, UploadError> {
        let validated = validation::validate_with_limit(&candidate, self.config.max_upload_size)?;
        let _ = self.progress.send(UploadOutcome::InProgress(0));

        let authorization = self.authorizer.request_authorization(&validated).await?;
        let file_key = authorization.file_key.clone();

        let stream = self.transfer.transfer(bytes, authorization);
        tokio::pin!(stream);
        let mut last_pct = 0u8;
        while let Some(item) = stream.next().await {
            last_pct = item?;
            let _ = self.progress.send(UploadOutcome::InProgress(last_pct));
        }
        // A progress sequence that ends short of 100 is a failure, never a
        // partial success.
        if last_pct != 100 {
            return Err(UploadError::Transfer(TransferError::IoFailure(
                "transfer ended before completion".to_string(),
            )));
        }

        self.tally.record_upload(&file_key);

        let (dataset, thing) = self
            .registrar
            .register_after_upload(validated.file_name())
            .await?;

        info!(
            file_name = %validated.file_name(),
            %file_key,
            dataset_id = %dataset.id,
            thing_id = %thing.id,
            "upload workflow complete"
        );

        Ok(UploadReceipt {
            file_key,
            dataset,
            thing,
        })
    }
}
