//! gemmarks: a hierarchical, taggable bookmark store for Gemini browsing,
//! with structured-file persistence and remote link-list refresh.
//!
//! This library crate exposes all modules for use by the binaries and integration tests.

pub mod app;
pub mod managers;
pub mod platform;
pub mod rpc_handler;
pub mod services;
pub mod storage;
pub mod types;
