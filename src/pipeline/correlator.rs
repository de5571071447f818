use std::sync::Arc;

use tracing::{error, info, instrument};

use crate::domain::{ArticleRequest, WriteRecord};
use crate::error::SummarizerError;
use crate::port::BatchInference;
use crate::store::{ConnectionManager, StatementTemplate};

/// Runs one request end to end: a single inference call for the whole batch,
/// then one insert per (article, summary) pair in input order.
pub struct PersistenceCorrelator {
    inference: Arc<dyn BatchInference>,
    store: Arc<ConnectionManager>,
    template: StatementTemplate,
}

impl PersistenceCorrelator {
    /// `template` must come from `store`'s current session; it is reused for
    /// every row this correlator writes.
    #[must_use]
    pub fn new(
        inference: Arc<dyn BatchInference>,
        store: Arc<ConnectionManager>,
        template: StatementTemplate,
    ) -> Self {
        Self {
            inference,
            store,
            template,
        }
    }

    /// Summaries in request order.
    ///
    /// Rows are written one at a time. The first failed insert stops the loop;
    /// rows already written stay, and the error reports how many. A missing or
    /// replaced session is a connection error, raised before inference runs.
    #[instrument(skip_all, fields(batch = articles.len()))]
    pub async fn summarize(
        &self,
        articles: &[ArticleRequest],
    ) -> Result<Vec<String>, SummarizerError> {
        if articles.is_empty() {
            return Ok(Vec::new());
        }
        self.store.check_template(&self.template)?;

        let prompts: Vec<String> = articles.iter().map(ArticleRequest::prompt).collect();
        let summaries = self.inference.infer_batch(prompts).await?;
        if summaries.len() != articles.len() {
            return Err(SummarizerError::Inference(format!(
                "expected {} summaries, got {}",
                articles.len(),
                summaries.len()
            )));
        }

        let total = articles.len();
        for (written, (article, summary)) in articles.iter().zip(&summaries).enumerate() {
            let bound = self
                .template
                .bind(WriteRecord::correlate(article, summary.clone()));
            if let Err(e) = self.store.execute_insert(&bound).await {
                error!(written, total, "Failed to persist summary: {e}");
                return Err(SummarizerError::Persistence {
                    written,
                    total,
                    message: e.to_string(),
                });
            }
        }

        info!("Persisted {total} summaries");
        Ok(summaries)
    }
}
