//! HTTP endpoint handlers.
//!
//! Handlers are thin: open a connection, call the domain module, wrap
//! the result in JSON.

pub mod admin;
pub mod auth;
pub mod doctor;
pub mod health;
pub mod patient;
pub mod visits;
