pub mod clickhouse;
pub mod triton;
