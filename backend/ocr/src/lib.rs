//! Clients for the remote text-extraction function.

pub mod mock;
pub mod remote;

pub use mock::MockOcrClient;
pub use remote::RemoteOcrClient;
