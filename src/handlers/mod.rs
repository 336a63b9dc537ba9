//! HTTP request handlers (route handlers).
//!
//! Each handler is an async function that:
//! 1. Receives HTTP request data (JSON body, URL params)
//! 2. Calls the matching service
//! 3. Returns HTTP response (JSON, status code)

/// Deposits, withdrawals and transfers
pub mod accounts;
/// Customers, their accounts and recipients
pub mod customers;
pub mod health;
