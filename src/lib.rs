//! A personal-assistant automation shell.
//!
//! Steward keeps notes, tasks and a learning log in a local SQLite file,
//! runs a small set of scheduled maintenance jobs against them, and forwards
//! free-text prompts to several hosted language-model APIs at once.
//!
//! # Architecture
//!
//! - **Storage**: SQLite with four tables (`memory`, `learning`, `tasks`,
//!   `integrations`) behind a single [`memory::Facade`] that also keeps an
//!   in-process mirror of the memory table
//! - **Integrations**: a closed set of vendors ([`integrations::Platform`])
//!   queried singly or concurrently, plus JSON handoff export
//! - **Scheduling**: a deadline-ordered queue drained by one coordinator task
//!   with bounded concurrency and per-job timeouts
//!
//! # Modules
//!
//! - [`config`]: TOML configuration with environment overrides
//! - [`db`]: schema, migrations, and health checks
//! - [`memory`]: the facade and the per-table store functions
//! - [`integrations`]: vendor payloads, fan-out, handoff
//! - [`scheduler`]: triggers, the job queue, default jobs, the coordinator
//! - [`questions`]: keyword-matched proactive questions
//! - [`app`]: wiring for the binary

pub mod app;
pub mod config;
pub mod db;
pub mod integrations;
pub mod memory;
pub mod questions;
pub mod scheduler;
