//! LSP Protocol Implementation
//!
//! Publishes scan diagnostics and serves hover, completion and document
//! symbols for markdown code blocks.

pub mod backend;
pub mod document;
pub mod handlers;
pub mod server;

pub use backend::Backend;
pub use server::serve;
