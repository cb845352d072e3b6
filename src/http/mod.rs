//! HTTP surface: router, guards and handlers

pub mod auth;
pub mod catalog;
pub mod enquiries;
pub mod error;
pub mod invoices;
pub mod middleware;
pub mod routes;

pub use routes::build_router;
