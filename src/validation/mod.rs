//! Validation Engine
//!
//! Fence state machine, formatting rules and diagnostic synthesis, kept
//! separate from parsing and LSP concerns.

pub mod engine;
pub mod rules;
pub mod state_machine;
pub mod synthesizer;

pub use engine::{
    Diagnostic, DiagnosticKind, Rule, ScanResult, Severity, code_blocks, scan, scan_with,
};
pub use state_machine::{CodeBlock, FenceEvent, FenceRole, FenceState, FenceStateMachine, FenceTrace};
