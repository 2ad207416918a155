#![doc = "outage-report: network outage report workflow, from news enrichment to PDF/DOCX export."]

//! This crate holds the report workflow state machine and everything it
//! orchestrates: the backend client, image encoding, article selection, the
//! edit session and the export pipeline. The `outage-report` binary is a thin
//! CLI host over [`workflow::Workflow`].
//!
//! # Usage
//! Build a [`config::ReporterConfig`] (see [`load_config::load_config`]), an
//! [`backend::HttpBackend`] from it, and drive a [`workflow::Workflow`].

pub mod backend;
pub mod cli;
pub mod config;
pub mod contract;
pub mod edit_session;
pub mod export;
pub mod image_encoder;
pub mod load_config;
pub mod selection;
pub mod workflow;

pub use cli::{run, Cli, Commands};
