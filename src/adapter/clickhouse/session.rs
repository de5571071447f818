use crate::adapter::clickhouse::row::SummaryRow;
use crate::config::Settings;
use crate::error::SummarizerError;
use crate::port::{PortFuture, SummarySession};
use crate::store::BoundInsert;
use clickhouse::Client;
use tracing::{info, warn};

/// ClickHouse-backed summaries session.
///
/// `client` is scoped to the configured database; `admin` is not, so it can
/// create that database in the first place.
pub struct ClickHouseSession {
    client: Client,
    admin: Client,
    database: String,
}

impl ClickHouseSession {
    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        let admin = Client::default()
            .with_url(settings.clickhouse_url())
            .with_user(&settings.clickhouse_user)
            .with_password(&settings.clickhouse_password);
        let client = admin.clone().with_database(&settings.clickhouse_database);

        Self {
            client,
            admin,
            database: settings.clickhouse_database.clone(),
        }
    }
}

fn create_table_sql(database: &str, table: &str) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {database}.{table} (
            user_id Int32,
            article_id UUID,
            original_text String,
            categories Array(String),
            summary String,
            user_review Int32 DEFAULT -1
        )
        ENGINE = MergeTree
        ORDER BY (user_id, article_id)"
    )
}

impl SummarySession for ClickHouseSession {
    fn ping(&self) -> PortFuture<'_, ()> {
        Box::pin(async move {
            self.client
                .query("SELECT 1")
                .execute()
                .await
                .map_err(|e| SummarizerError::Connection(format!("ClickHouse unreachable: {e}")))
        })
    }

    fn ensure_schema<'a>(&'a self, table: &'a str) -> PortFuture<'a, ()> {
        Box::pin(async move {
            self.admin
                .query(&format!("CREATE DATABASE IF NOT EXISTS {}", self.database))
                .execute()
                .await?;
            self.admin
                .query(&create_table_sql(&self.database, table))
                .execute()
                .await?;
            info!(database = %self.database, table, "Summaries schema ready");
            Ok(())
        })
    }

    fn execute<'a>(&'a self, insert: &'a BoundInsert) -> PortFuture<'a, ()> {
        Box::pin(async move {
            let mut writer = self
                .client
                .insert::<SummaryRow>(insert.template().table())?;
            if let Err(e) = writer.write(insert.row()).await {
                warn!("Failed to write summary row to ClickHouse: {e}");
                return Err(e.into());
            }
            writer.end().await?;
            Ok(())
        })
    }

    fn scan<'a>(&'a self, table: &'a str) -> PortFuture<'a, Vec<SummaryRow>> {
        Box::pin(async move {
            let rows = self
                .client
                .query(&format!("SELECT ?fields FROM {table} ORDER BY user_id"))
                .fetch_all::<SummaryRow>()
                .await?;
            Ok(rows)
        })
    }
}
