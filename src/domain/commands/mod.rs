//! Command and query types exchanged between callers and domain services.
//!
//! These are the shapes the HTTP layer (or any other host) hands to the
//! engine, kept free of transport concerns.

pub mod forecast;
pub mod goal;
pub mod transactions;
pub mod wallet;
