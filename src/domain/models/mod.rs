//! Domain models shared across services and storage backends.

pub mod goal;
pub mod transaction;
pub mod wallet;
