//! # rust-deployer
//!
//! A transport-agnostic deployer that uploads locally-produced build
//! artifacts to a remote filesystem over SMB or SFTP.
//!
//! ## Overview
//!
//! The engine normalizes heterogeneous target-address syntaxes into one
//! canonical address, guarantees intermediate remote directories exist
//! before a file is written, streams file contents through bounded buffers
//! and runs under cooperative cancellation, so a user-initiated stop never
//! corrupts bookkeeping or hangs the caller.
//!
//! ## Features
//!
//! - **Address normalization**: UNC paths, bare `host/share` forms and
//!   protocol URLs all map to one canonical, idempotent form
//! - **Two transports, one contract**: SMB and SFTP behind a single
//!   session trait, selected per invocation
//! - **Ensure-dir semantics**: missing remote directories are created
//!   parent-first, tolerating concurrent creators
//! - **Cooperative cancellation**: a shared token polled before each file
//!   and each buffer read
//! - **Deploy manifests**: YAML description of artifact collections, with
//!   directory sources expanded while preserving layout
//!
//! Failed transfers are not retried, partial uploads are not resumed and
//! transfers never run in parallel; the first fatal condition aborts the
//! whole invocation.
//!
//! ## Usage
//!
//! ```no_run
//! use rust_deployer::deploy::{run_deploy, CancelToken, DeployRequest, LogSink};
//! use rust_deployer::models::ArtifactCollection;
//! use rust_deployer::transport::{Credentials, Protocol, TransportOptions};
//!
//! let mut collection = ArtifactCollection::new("target/*.war");
//! collection.add_file("/work/build/app.war", "webapps");
//!
//! let request = DeployRequest {
//!     protocol: Protocol::Sftp,
//!     target: "deploy.example.com/var/www".to_string(),
//!     credentials: Credentials {
//!         username: "deployer".to_string(),
//!         password: "secret".to_string(),
//!         domain: None,
//!     },
//!     options: TransportOptions::default(),
//!     collections: vec![collection],
//! };
//!
//! let succeeded = run_deploy(&request, &CancelToken::new(), &LogSink);
//! assert!(succeeded);
//! ```
//!
//! ## Module Organization
//!
//! - [`cli`]: Command-line interface definitions and argument parsing
//! - [`config`]: Deploy manifest loading and artifact resolution
//! - [`models`]: Core data models shared across the engine
//! - [`transport`]: Target addresses and the SMB/SFTP session realizations
//! - [`deploy`]: Upload orchestration, streaming and cancellation
//! - [`error`]: The shared error taxonomy
//! - [`constants`]: Application-wide constants

/// Command-line interface definitions and argument parsing
pub mod cli;

/// Deploy manifest loading and artifact resolution
pub mod config;

/// Application constants and configuration values
pub mod constants;

/// Upload orchestration, streaming and cancellation
pub mod deploy;

/// Shared error taxonomy
pub mod error;

/// Core data models shared across the engine
pub mod models;

/// Target addresses and transport session realizations
pub mod transport;
