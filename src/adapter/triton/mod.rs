pub mod client;
pub mod tensor;

pub use client::TritonClient;
pub use tensor::{BytesTensor, TensorError};
