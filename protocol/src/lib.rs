//! Wire contract between the workbench client and the exercise service.
//!
//! The service exposes five named POST handlers (`save_file`, `delete_file`,
//! `rename_file`, `run_code`, `submit_solution`). This crate defines the
//! JSON bodies both ways, the [`HandlerClient`] seam with its reqwest-backed
//! implementation, and a scripted in-memory double for tests.
pub mod client;
mod error;
pub mod requests;
pub mod responses;
pub mod testing;
pub mod types;

pub use client::{HandlerClient, HttpClient};
pub use error::CallError;
