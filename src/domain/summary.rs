use uuid::Uuid;

use super::ArticleRequest;

/// `user_review` value for rows nobody has reviewed yet.
pub const REVIEW_PENDING: i32 = -1;

/// Caller-supplied column values for a single write, everything except the
/// article id which is always minted at write time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WriteArgs {
    pub user_id: i32,
    pub original_text: String,
    pub categories: Vec<String>,
    pub summary: String,
    pub user_review: i32,
}

impl WriteArgs {
    /// Placeholder payload used when harvesting a statement template.
    #[must_use]
    pub fn neutral() -> Self {
        Self {
            user_id: 0,
            original_text: String::new(),
            categories: Vec::new(),
            summary: String::new(),
            user_review: REVIEW_PENDING,
        }
    }

    #[must_use]
    pub fn is_neutral(&self) -> bool {
        *self == Self::neutral()
    }
}

/// One (article, generated summary) pair ready to be persisted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WriteRecord {
    user_id: i32,
    article_id: Uuid,
    original_text: String,
    categories: Vec<String>,
    summary: String,
    user_review: i32,
}

impl WriteRecord {
    /// Correlate an article with the summary generated for it.
    #[must_use]
    pub fn correlate(article: &ArticleRequest, summary: String) -> Self {
        Self::from_args(WriteArgs {
            user_id: article.user_id,
            original_text: article.prompt(),
            categories: article.categories.clone(),
            summary,
            user_review: REVIEW_PENDING,
        })
    }

    /// Build a record with a fresh article id.
    #[must_use]
    pub fn from_args(args: WriteArgs) -> Self {
        Self {
            user_id: args.user_id,
            article_id: Uuid::new_v4(),
            original_text: args.original_text,
            categories: args.categories,
            summary: args.summary,
            user_review: args.user_review,
        }
    }

    #[must_use]
    pub fn user_id(&self) -> i32 {
        self.user_id
    }

    #[must_use]
    pub fn article_id(&self) -> Uuid {
        self.article_id
    }

    #[must_use]
    pub fn original_text(&self) -> &str {
        &self.original_text
    }

    #[must_use]
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    #[must_use]
    pub fn summary(&self) -> &str {
        &self.summary
    }

    #[must_use]
    pub fn user_review(&self) -> i32 {
        self.user_review
    }
}
