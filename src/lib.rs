//! Tradebook Trading Journal Library
//!
//! Core components for the tradebook journal service: domain entities and
//! metrics, the journal application service, persistence, and auth plumbing.

pub mod application;
pub mod auth;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod persistence;
pub mod rate_limit;
