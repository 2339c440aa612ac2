//! CTC Engine library crate.
//!
//! This crate decomposes a monthly CTC or gross amount into salary heads,
//! statutory contributions and a balancing special allowance.  External
//! applications may call [`engine::calculate`] or [`engine::run_payroll`]
//! directly, or embed the HTTP API via [`api::build_router`].

pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod models;
pub mod money;
pub mod rates;
pub mod resolver;
pub mod store;
