//! Client for a support-ticketing REST backend: session handling, ticket
//! normalization and filtering, and the dashboards built on them.

pub mod api;
pub mod board;
pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod filter;
pub mod models;
pub mod normalize;
pub mod session;
pub mod validate;

#[cfg(test)]
pub mod testing;
