pub mod row;
pub mod session;

pub use row::SummaryRow;
pub use session::ClickHouseSession;
