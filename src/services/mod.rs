//! Business logic services.
//!
//! Services contain core business logic separated from HTTP handlers.
//! They validate input, drive the customer aggregate and the ledger, and
//! persist through the registry.

pub mod account_service;
pub mod customer_service;
