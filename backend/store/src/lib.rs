pub mod memory;
pub mod rest;

pub use memory::{InMemoryConversionStore, StoreOp};
pub use rest::RestConversionStore;
