//! Bank ledger service.
//!
//! A REST API for managing customers, their checking and savings accounts,
//! and saved transfer recipients. Money moves through an admission-checked
//! ledger: deposits, withdrawals and transfers either apply completely or are
//! declined with a reason, leaving every balance untouched.
//!
//! # Architecture
//!
//! - **Web Framework**: Axum (async HTTP server)
//! - **Storage**: in-memory or PostgreSQL with sqlx, behind the [`registry::Registry`] trait
//! - **Format**: JSON requests/responses

pub mod app;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod ledger;
pub mod models;
pub mod registry;
pub mod services;
pub mod state;
pub mod validation;
