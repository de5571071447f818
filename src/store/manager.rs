use std::sync::Arc;

use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::gate::PrepareGate;
use super::template::{BoundInsert, SUMMARIES_TABLE, StatementTemplate};
use crate::adapter::clickhouse::{ClickHouseSession, SummaryRow};
use crate::config::Settings;
use crate::domain::{WriteArgs, WriteRecord};
use crate::error::SummarizerError;
use crate::port::SummarySession;

/// Whether a write should harvest a template or insert a row.
///
/// Always supplied by the caller; the manager itself has no mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriteMode {
    Prepared,
    Unprepared,
}

#[derive(Clone, Debug)]
pub enum WriteOutcome {
    Template(StatementTemplate),
    Written(Uuid),
}

/// Owns the store session.
///
/// Replacing the session (`connect`/`attach`) needs `&mut self`, so it happens
/// before the manager is shared. Every replacement bumps the generation, which
/// invalidates templates harvested from the previous session.
pub struct ConnectionManager {
    session: Option<Arc<dyn SummarySession>>,
    generation: u64,
    table: String,
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionManager {
    #[must_use]
    pub fn new() -> Self {
        Self::for_table(SUMMARIES_TABLE)
    }

    #[must_use]
    pub fn for_table(table: impl Into<String>) -> Self {
        Self {
            session: None,
            generation: 0,
            table: table.into(),
        }
    }

    /// Open a ClickHouse session and verify it with a round trip.
    /// Replaces any existing session.
    #[instrument(skip_all, fields(url = %settings.clickhouse_url(), database = %settings.clickhouse_database))]
    pub async fn connect(&mut self, settings: &Settings) -> Result<(), SummarizerError> {
        let session = ClickHouseSession::from_settings(settings);
        session.ping().await?;
        self.attach(Arc::new(session));
        info!(generation = self.generation, "Connected to ClickHouse");
        Ok(())
    }

    /// Install an already-open session. Replaces any existing session.
    pub fn attach(&mut self, session: Arc<dyn SummarySession>) {
        self.session = Some(session);
        self.generation += 1;
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Gate that turns writes into template harvesting.
    #[must_use]
    pub fn prepare(&self) -> PrepareGate<'_> {
        PrepareGate::new(self, WriteMode::Prepared)
    }

    /// Gate that performs real writes.
    #[must_use]
    pub fn unprepare(&self) -> PrepareGate<'_> {
        PrepareGate::new(self, WriteMode::Unprepared)
    }

    /// `Prepared` returns the insert template and touches nothing; `Unprepared`
    /// inserts one row under a freshly minted article id.
    pub async fn write(
        &self,
        mode: WriteMode,
        args: WriteArgs,
    ) -> Result<WriteOutcome, SummarizerError> {
        let template = self.insert_template()?;
        match mode {
            WriteMode::Prepared => Ok(WriteOutcome::Template(template)),
            WriteMode::Unprepared => {
                let bound = template.bind(WriteRecord::from_args(args));
                let article_id = bound.row().article_id;
                self.execute_insert(&bound).await?;
                Ok(WriteOutcome::Written(article_id))
            }
        }
    }

    /// Template for the summaries insert, bound to the current session.
    pub fn insert_template(&self) -> Result<StatementTemplate, SummarizerError> {
        self.session()?;
        Ok(StatementTemplate::new(self.table.as_str(), self.generation))
    }

    /// Fails with a connection error when there is no session or `template`
    /// was harvested from a session that has since been replaced.
    pub fn check_template(&self, template: &StatementTemplate) -> Result<(), SummarizerError> {
        self.session()?;
        if template.generation() != self.generation {
            return Err(SummarizerError::Connection(format!(
                "statement template from session generation {} used against generation {}",
                template.generation(),
                self.generation
            )));
        }
        Ok(())
    }

    pub async fn execute_insert(&self, bound: &BoundInsert) -> Result<(), SummarizerError> {
        self.check_template(bound.template())?;
        self.session()?.execute(bound).await?;
        debug!(
            user_id = bound.row().user_id,
            article_id = %bound.row().article_id,
            "Inserted summary row"
        );
        Ok(())
    }

    /// Every row in the table. Verification tooling only.
    pub async fn scan_all(&self) -> Result<Vec<SummaryRow>, SummarizerError> {
        self.session()?.scan(&self.table).await
    }

    pub async fn ensure_schema(&self) -> Result<(), SummarizerError> {
        self.session()?.ensure_schema(&self.table).await
    }

    fn session(&self) -> Result<&Arc<dyn SummarySession>, SummarizerError> {
        self.session
            .as_ref()
            .ok_or_else(|| SummarizerError::Connection("no active store session".into()))
    }
}
