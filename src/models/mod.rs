//! Data models representing the bank's entities.
//!
//! This module contains the domain structures, their table row shapes and
//! the request/response bodies of the API.

/// Account entity and money-movement requests
pub mod account;
/// Customer aggregate
pub mod customer;
/// Saved transfer targets
pub mod recipient;
