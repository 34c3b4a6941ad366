use async_stream::stream;
use bytes::Bytes;
use chrono::Utc;
use futures::{Stream, StreamExt};
use reqwest::{Body, Client};
use tokio::sync::mpsc;
use tracing::debug;

use crate::error::TransferError;
use crate::models::UploadAuthorization;

/// Bytes handed to the transport per progress tick
const CHUNK_SIZE: usize = 64 * 1024;

/// Streams file bytes to the destination named by an upload authorization.
///
/// Progress is exposed as a lazy, finite, monotonically non-decreasing
/// percentage sequence, decoupled from the transport's actual chunking. The
/// sequence terminates at exactly 100 only once the destination acknowledged
/// the bytes; any earlier termination is a failure. A transfer is not
/// restartable: a fresh attempt needs a fresh authorization.
pub struct TransferExecutor {
    client: Client,
}

impl TransferExecutor {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Performs a single PUT of `bytes` to the authorized destination.
    ///
    /// The authorization is consumed: it is single-use and checked against
    /// its expiry before any byte leaves the process.
    pub fn transfer(
        &self,
        bytes: Bytes,
        authorization: UploadAuthorization,
    ) -> impl Stream<Item = Result<u8, TransferError>> {
        let client = self.client.clone();

        stream! {
            if Utc::now() >= authorization.expires_at {
                yield Err(TransferError::Expired);
                return;
            }

            let total = bytes.len();
            let mut chunks = Vec::with_capacity(total / CHUNK_SIZE + 1);
            let mut offset = 0;
            while offset < total {
                let end = (offset + CHUNK_SIZE).min(total);
                chunks.push(bytes.slice(offset..end));
                offset = end;
            }

            // The body reports back how many bytes the transport has pulled.
            // The sender lives inside the request body, so the channel closes
            // once the transport is done with it, success or not.
            let (tx, mut rx) = mpsc::unbounded_channel::<usize>();
            let body = Body::wrap_stream(futures::stream::iter(chunks).map(move |chunk| {
                let _ = tx.send(chunk.len());
                Ok::<Bytes, std::convert::Infallible>(chunk)
            }));

            let request = client
                .put(authorization.upload_url.clone())
                .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
                .body(body)
                .send();
            let in_flight = tokio::spawn(request);

            let mut sent = 0usize;
            let mut last_pct = 0u8;
            while let Some(pulled) = rx.recv().await {
                sent += pulled;
                // Hold below 100 until the destination acknowledges.
                let pct = ((sent.saturating_mul(100) / total.max(1)) as u8).min(99);
                if pct > last_pct {
                    last_pct = pct;
                    yield Ok(pct);
                }
            }

            let outcome = match in_flight.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    yield Err(TransferError::IoFailure(format!("transfer task failed: {e}")));
                    return;
                }
            };
            match acknowledge(outcome) {
                Ok(()) => {
                    debug!(file_key = %authorization.file_key, total, "transfer complete");
                    yield Ok(100);
                }
                Err(e) => yield Err(e),
            }
        }
    }
}

fn acknowledge(outcome: Result<reqwest::Response, reqwest::Error>) -> Result<(), TransferError> {
    let response = outcome.map_err(|e| TransferError::IoFailure(e.to_string()))?;
    let status = response.status();
    if !status.is_success() {
        return Err(TransferError::IoFailure(format!(
            "upload destination returned HTTP {status}"
        )));
    }
    Ok(())
}
