//! Request correlation over an opaque asynchronous execution engine.
//!
//! [`Client`] sits between arbitrary caller threads and an engine
//! reachable only through the [`Engine`] boundary trait. It labels each
//! outgoing request with a unique [`QueryId`], routes the engine's
//! asynchronous results back to the callback registered for that
//! identifier, feeds unsolicited engine events to a permanent update
//! handler, and coordinates a shutdown that is safe to run concurrently
//! with in-flight sends.
//!
//! Construction starts a dedicated receiver thread that polls the
//! boundary for result batches until the engine reports its terminal
//! state. [`Client::close`] asks the engine to shut down, waits for that
//! terminal report, resolves every still-outstanding request with the
//! fixed closed-client error, and releases the engine instance. The
//! receiver thread keeps the instance alive while it runs, so a client
//! that is never closed (and whose engine never terminates on its own)
//! leaks the engine handle; explicit `close` is the supported teardown.

mod client;
mod config;
pub mod fatal;
mod ids;
mod registry;

pub use client::Client;
pub use config::{set_log_file_path, set_log_max_file_size, set_log_verbosity_level};
pub use registry::{CallbackPanic, ExceptionCallback, ResultCallback};
/// Re-export of the boundary contract this crate drives.
pub use tether_engine::{Engine, EngineError, QueryId};

/// A convenient type alias for `Result` with `E` = [`enum@crate::Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Possible errors.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
	/// An argument failed validation before reaching the engine boundary.
	#[error("invalid argument: {0}")]
	InvalidArgument(&'static str),
}
