//! Gadzilla Core - Shared domain types.
//!
//! Used by:
//! - `storefront` - Public JSON API, checkout, and the staff admin API
//! - `cli` - Migrations, staff accounts, and catalog seeding
//!
//! # Architecture
//!
//! The core crate contains only types and pure validation - no I/O, no
//! database access, no HTTP. Enable the `postgres` feature to get `sqlx`
//! encoding for ids and enums.
//!
//! # Modules
//!
//! - [`types`] - Type-safe ids, emails, phone numbers, order and catalog enums,
//!   and shipping rates

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
