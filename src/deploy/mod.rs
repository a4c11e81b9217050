//! Upload engine: orchestration, streaming and cancellation.
//!
//! Execution is single-threaded and strictly sequential: one collection
//! after another, one file after another, blocking I/O throughout. The
//! transports in use are not designed to be driven concurrently over one
//! session, and the artifact sets handled are small enough that sequential
//! transfer is acceptable. Cancellation is cooperative: a shared token is
//! polled before each file and before each buffer read, never by forcing
//! in-flight I/O to stop.
//!
//! ## Control flow
//!
//! ```text
//! run_deploy
//!   ├─ normalize target address
//!   ├─ connect (transport selected by protocol variant)
//!   └─ upload_collections
//!        └─ per file: poll token → ensure dir → open write → copy_stream
//! ```

mod cancel;
mod copier;
mod progress;
mod runner;
mod uploader;

pub use cancel::CancelToken;
pub use copier::copy_stream;
pub use progress::{LogSink, ProgressSink};
pub use runner::{run_deploy, DeployRequest};
pub use uploader::upload_collections;
