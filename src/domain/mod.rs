pub mod article;
pub mod summary;

pub use article::ArticleRequest;
pub use summary::{REVIEW_PENDING, WriteArgs, WriteRecord};
