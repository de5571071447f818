use crate::adapter::clickhouse::SummaryRow;
use crate::domain::WriteRecord;

/// Table holding one row per generated summary, ordered by (user_id, article_id).
pub const SUMMARIES_TABLE: &str = "summaries_by_user_id";

/// Column order of the insert statement. Matches `SummaryRow` field order.
pub const SUMMARY_COLUMNS: [&str; 6] = [
    "user_id",
    "article_id",
    "original_text",
    "categories",
    "summary",
    "user_review",
];

/// Reusable insert descriptor for the summaries row shape.
///
/// Stamped with the generation of the session it was harvested from; binding
/// is pure, execution is refused once that session has been replaced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatementTemplate {
    table: String,
    generation: u64,
}

impl StatementTemplate {
    pub(crate) fn new(table: impl Into<String>, generation: u64) -> Self {
        Self {
            table: table.into(),
            generation,
        }
    }

    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Parameterized form of the statement, one `?` per column.
    #[must_use]
    pub fn sql(&self) -> String {
        let placeholders = vec!["?"; SUMMARY_COLUMNS.len()].join(", ");
        format!(
            "INSERT INTO {} ({}) VALUES ({placeholders})",
            self.table,
            SUMMARY_COLUMNS.join(", ")
        )
    }

    #[must_use]
    pub fn bind(&self, record: WriteRecord) -> BoundInsert {
        BoundInsert {
            template: self.clone(),
            row: SummaryRow::from(record),
        }
    }
}

/// A template together with the values of one row.
#[derive(Clone, Debug)]
pub struct BoundInsert {
    template: StatementTemplate,
    row: SummaryRow,
}

impl BoundInsert {
    #[must_use]
    pub fn template(&self) -> &StatementTemplate {
        &self.template
    }

    #[must_use]
    pub fn row(&self) -> &SummaryRow {
        &self.row
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::WriteArgs;

    #[test]
    fn test_sql_lists_columns_in_row_order() {
        let template = StatementTemplate::new(SUMMARIES_TABLE, 1);
        assert_eq!(
            template.sql(),
            "INSERT INTO summaries_by_user_id (user_id, article_id, original_text, categories, summary, user_review) VALUES (?, ?, ?, ?, ?, ?)"
        );
    }

    #[test]
    fn test_bind_keeps_template_and_values() {
        let template = StatementTemplate::new(SUMMARIES_TABLE, 3);
        let record = WriteRecord::from_args(WriteArgs {
            user_id: 9,
            original_text: "Summarize: a\nb".into(),
            categories: vec!["x".into()],
            summary: "s".into(),
            user_review: -1,
        });
        let article_id = record.article_id();

        let bound = template.bind(record);

        assert_eq!(bound.template().generation(), 3);
        assert_eq!(bound.row().user_id, 9);
        assert_eq!(bound.row().article_id, article_id);
        assert_eq!(bound.row().summary, "s");
    }
}
