pub mod correlator;

pub use correlator::PersistenceCorrelator;
