//! Registers an uploaded artifact as two related resources on the remote
//! data service, writing speculative cache entries up front and reconciling
//! them once the service responds.

use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::cache::PortalCache;
use crate::config::PortalConfig;
use crate::error::RegistrationError;
use crate::models::{Dataset, ResourceKind, Thing};
use crate::utils::validation::validate_resource_name;

const CREATE_DATASET: &str = "mutation CreateDataset($name: String!) { \
     createDataset(name: $name) { id name owner visibility created_at } }";

const CREATE_THING: &str = "mutation CreateThing($name: String!) { \
     createThing(name: $name) { id name status created_at } }";

#[derive(Serialize)]
struct GraphqlRequest<'a> {
    query: &'a str,
    variables: NameVariables<'a>,
}

#[derive(Serialize)]
struct NameVariables<'a> {
    name: &'a str,
}

#[derive(Deserialize)]
struct GraphqlResponse<D> {
    data: Option<D>,
    errors: Option<Vec<GraphqlError>>,
}

#[derive(Deserialize)]
struct GraphqlError {
    message: String,
}

#[derive(Deserialize)]
struct CreateDatasetData {
    #[serde(rename = "createDataset")]
    create_dataset: Dataset,
}

#[derive(Deserialize)]
struct CreateThingData {
    #[serde(rename = "createThing")]
    create_thing: Thing,
}

pub struct ResourceRegistrar {
    client: Client,
    endpoint: String,
    cache: Arc<PortalCache>,
}

impl ResourceRegistrar {
    pub fn new(client: Client, config: &PortalConfig, cache: Arc<PortalCache>) -> Self {
        Self {
            client,
            endpoint: config.graphql_url(),
            cache,
        }
    }

    /// Creates the dataset and thing records for one uploaded artifact.
    ///
    /// Speculative entries for both kinds are inserted before any request is
    /// issued, then the two creates run concurrently (the order between the
    /// kinds is unspecified). Each response reconciles its own speculative
    /// entry: confirmed in place on success, rolled back on failure. A
    /// failure of one kind never disturbs the other kind's outcome, and the
    /// already-transferred bytes are never undone, so partial failure is
    /// reported distinctly from total failure.
    pub async fn register_after_upload(
        &self,
        name: &str,
    ) -> Result<(Dataset, Thing), RegistrationError> {
        validate_resource_name(name).map_err(RegistrationError::InvalidName)?;

        let dataset_token = self
            .cache
            .datasets
            .insert_speculative(speculative_dataset(name))
            .await;
        let thing_token = self
            .cache
            .things
            .insert_speculative(speculative_thing(name))
            .await;
        info!(%name, "speculative entries inserted, issuing create requests");

        let (dataset_outcome, thing_outcome) = tokio::join!(
            self.execute::<CreateDatasetData>(CREATE_DATASET, name),
            self.execute::<CreateThingData>(CREATE_THING, name),
        );

        let dataset = match dataset_outcome {
            Ok(data) => {
                let dataset = data.create_dataset;
                self.cache
                    .datasets
                    .confirm(dataset_token, dataset.clone())
                    .await;
                Ok(dataset)
            }
            Err(reason) => {
                self.cache.datasets.rollback(dataset_token).await;
                warn!(%name, %reason, "dataset creation failed, speculative entry rolled back");
                Err(reason)
            }
        };

        let thing = match thing_outcome {
            Ok(data) => {
                let thing = data.create_thing;
                self.cache.things.confirm(thing_token, thing.clone()).await;
                Ok(thing)
            }
            Err(reason) => {
                self.cache.things.rollback(thing_token).await;
                warn!(%name, %reason, "thing creation failed, speculative entry rolled back");
                Err(reason)
            }
        };

        match (dataset, thing) {
            (Ok(dataset), Ok(thing)) => Ok((dataset, thing)),
            (Ok(_), Err(reason)) => Err(RegistrationError::Partial {
                kind: ResourceKind::Thing,
                reason,
            }),
            (Err(reason), Ok(_)) => Err(RegistrationError::Partial {
                kind: ResourceKind::Dataset,
                reason,
            }),
            (Err(dataset_reason), Err(thing_reason)) => Err(RegistrationError::Total {
                dataset_reason,
                thing_reason,
            }),
        }
    }

    async fn execute<D: DeserializeOwned>(
        &self,
        query: &'static str,
        name: &str,
    ) -> Result<D, String> {
        let body = GraphqlRequest {
            query,
            variables: NameVariables { name },
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| format!("data service unreachable: {e}"))?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("data service returned HTTP {status}"));
        }

        let parsed: GraphqlResponse<D> = response
            .json()
            .await
            .map_err(|e| format!("malformed data service response: {e}"))?;

        if let Some(errors) = parsed.errors {
            if !errors.is_empty() {
                return Err(errors
                    .into_iter()
                    .map(|e| e.message)
                    .collect::<Vec<_>>()
                    .join("; "));
            }
        }

        parsed
            .data
            .ok_or_else(|| "data service response contained no data".to_string())
    }
}

/// Optimistic dataset record, shaped the way the service will shape it. The
/// placeholder id never leaves the process.
fn speculative_dataset(name: &str) -> Dataset {
    Dataset {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        owner: "you".to_string(),
        visibility: "private".to_string(),
        created_at: Utc::now(),
    }
}

fn speculative_thing(name: &str) -> Thing {
    Thing {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        status: "ACTIVE".to_string(),
        created_at: Utc::now(),
    }
}
