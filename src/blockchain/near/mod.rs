//! NEAR Protocol backend used by token deployment.

pub mod client;
pub mod keys;
pub mod transaction;

pub use client::{NearAccountClient, NearClientFactory, NearRpcConnector};
pub use keys::{AccountIdentity, ImplicitAccount, NamedAccount, NearKeyPair};
