//! Business logic services.
//!
//! # Services
//!
//! - `auth` - Account registration, login and staff provisioning
//! - `catalog_cache` - Cached taxonomy and brand showcase
//! - `conversions` - Conversion-tracking seam
//! - `email` - Order notification email
//! - `notify` - Post-commit side effects of a placed order

pub mod auth;
pub mod catalog_cache;
pub mod conversions;
pub mod email;
pub mod notify;
