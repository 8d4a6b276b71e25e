//! Core types for Dental-Com.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod pricing;
pub mod rating;
pub mod slug;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use pricing::{SalePricing, format_money};
pub use rating::{Rating, RatingError};
pub use slug::{simple_slug, slugify};
pub use status::*;
