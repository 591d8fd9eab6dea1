//! Authenticating API gateway for the smp services.
//!
//! Every request passes an ordered pre-filter chain (credential check, then
//! route decoration) before it is forwarded to a backend.
pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod services;
pub mod state;
