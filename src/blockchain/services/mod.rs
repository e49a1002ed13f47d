//! Ordered call sequences behind the write actions.

pub mod deploy;
pub mod transfer;
