use crate::domain::WriteRecord;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(clickhouse::Row, Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct SummaryRow {
    pub user_id: i32, // Int32, partition key
    #[serde(with = "clickhouse::serde::uuid")]
    pub article_id: Uuid, // UUID, unique per row
    pub original_text: String, // String
    pub categories: Vec<String>, // Array(String)
    pub summary: String, // String
    pub user_review: i32, // Int32, -1 until reviewed
}

impl From<WriteRecord> for SummaryRow {
    fn from(record: WriteRecord) -> Self {
        Self {
            user_id: record.user_id(),
            article_id: record.article_id(),
            original_text: record.original_text().to_string(),
            categories: record.categories().to_vec(),
            summary: record.summary().to_string(),
            user_review: record.user_review(),
        }
    }
}

impl SummaryRow {
    /// True for rows carrying the neutral template payload instead of data.
    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        self.user_id == 0
            && self.original_text.is_empty()
            && self.categories.is_empty()
            && self.summary.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{REVIEW_PENDING, WriteArgs};

    #[test]
    fn test_summary_row_from_write_record() {
        let record = WriteRecord::from_args(WriteArgs {
            user_id: 12,
            original_text: "Summarize: Title\nBody".to_string(),
            categories: vec!["tech".to_string(), "ai".to_string()],
            summary: "A short summary".to_string(),
            user_review: REVIEW_PENDING,
        });
        let article_id = record.article_id();

        let row = SummaryRow::from(record);

        assert_eq!(row.user_id, 12);
        assert_eq!(row.article_id, article_id);
        assert_eq!(row.original_text, "Summarize: Title\nBody");
        assert_eq!(row.categories, vec!["tech".to_string(), "ai".to_string()]);
        assert_eq!(row.summary, "A short summary");
        assert_eq!(row.user_review, -1);
        assert!(!row.is_placeholder());
    }

    #[test]
    fn test_neutral_payload_is_placeholder() {
        let row = SummaryRow::from(WriteRecord::from_args(WriteArgs::neutral()));
        assert!(row.is_placeholder());
    }
}
