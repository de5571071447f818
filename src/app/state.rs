use crate::adapter::triton::TritonClient;
use crate::config::Settings;
use crate::domain::WriteArgs;
use crate::error::SummarizerError;
use crate::pipeline::PersistenceCorrelator;
use crate::port::BatchInference;
use crate::store::{ConnectionManager, WriteOutcome};
use std::sync::Arc;
use tracing::info;

/// Shared application state: the request pipeline and the inference client
/// used for readiness probes.
#[derive(Clone)]
pub struct AppState {
    pub correlator: Arc<PersistenceCorrelator>,
    pub inference: Arc<dyn BatchInference>,
}

impl AppState {
    /// Connect to ClickHouse and Triton, bootstrap the schema, and harvest the
    /// insert template once for the lifetime of the process.
    pub async fn build(settings: &Settings) -> Result<Self, SummarizerError> {
        let mut manager = ConnectionManager::new();
        manager.connect(settings).await?;
        manager.ensure_schema().await?;

        let inference: Arc<dyn BatchInference> = Arc::new(TritonClient::connect(settings).await?);
        Self::new(Arc::new(manager), inference).await
    }

    /// Assemble state from an already-connected manager.
    pub async fn new(
        manager: Arc<ConnectionManager>,
        inference: Arc<dyn BatchInference>,
    ) -> Result<Self, SummarizerError> {
        let template = match manager.prepare().write(WriteArgs::neutral()).await? {
            WriteOutcome::Template(template) => template,
            WriteOutcome::Written(id) => {
                return Err(SummarizerError::Connection(format!(
                    "prepared write unexpectedly inserted row {id}"
                )));
            }
        };
        info!(
            statement = %template.sql(),
            generation = template.generation(),
            "Insert template ready"
        );

        let correlator = Arc::new(PersistenceCorrelator::new(
            inference.clone(),
            manager,
            template,
        ));
        Ok(Self {
            correlator,
            inference,
        })
    }
}
