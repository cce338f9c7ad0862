//! The `taskdeck` library crate.
//!
//! This crate contains the core business logic for the TaskDeck backend:
//! domain models with their database operations, authentication (password
//! hashing and bearer tokens), authorization rules, blob storage for
//! uploaded files, routing configuration, and error handling. The binary
//! (`main.rs`) wires these together into an HTTP server.

pub mod auth;
pub mod authz;
pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod storage;
