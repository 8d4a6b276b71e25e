//! Dental-Com Core - Shared types library.
//!
//! This crate provides common types used across all Dental-Com components:
//! - `storefront` - Public REST API and server-rendered pages
//! - `cli` - Command-line tools for migrations, seeding and user management
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. Pricing and slug rules live here so the server,
//! the CLI seeder and the tests all agree on them.
//!
//! # Modules
//!
//! - [`types`] - Typed IDs, emails, ratings, choice enums, slugs and pricing

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
