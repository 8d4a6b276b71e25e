//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - Guest and Google sign-in, JWT issue and verification

pub mod auth;
