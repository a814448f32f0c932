//! Library crate for usradmin-tui.
//!
//! This crate exposes the building blocks of the TUI:
//! - Remote API client, models and worker channel protocol (`api`)
//! - Application state, selection machine and event loop (`app`)
//! - Theme preference state and palettes (`theme`)
//! - UI rendering and widgets (`ui`)
//! - Form input validation (`validate`)
//!
//! It is used by the `usradmin-tui` binary and by tests.
#![doc = include_str!("../README.md")]
#![deny(rustdoc::broken_intra_doc_links)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod api;
pub mod app;
pub mod theme;
pub mod ui;
pub mod validate;

// Re-export commonly used items at the crate root for convenience
/// Application state shared between the event loop, the UI and tests.
pub use app::AppState;
/// The user record as served by the remote API.
pub use api::User;
