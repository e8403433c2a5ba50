// THEORY:
// This file is the main entry point for the `contour_march` library crate.
// It exposes `pipeline::run` (and `run_with_store` for callers that bring their own
// image I/O) as the high-level interface. The stages behind it live in
// `core_modules`, one module per phase, with `shared_state` tying them together:
// the partitioner hands out disjoint work, the lazy slots build each shared
// resource once, and the phase barriers order everything.

pub mod config;
pub mod core_modules;
pub mod error;
pub mod pipeline;

pub use config::RunConfig;
pub use error::{ContourError, Result};
