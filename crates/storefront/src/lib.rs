//! Gadzilla shop backend.
//!
//! JSON API for the storefront frontend: catalog, carts, checkout with
//! row-locked stock reservation, accounts, wishlists and the staff admin
//! API. The binary in `main.rs` wires [`routes::app`] to a listener; the
//! library form exists so the router and the checkout coordinator can be
//! tested directly.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod checkout;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
