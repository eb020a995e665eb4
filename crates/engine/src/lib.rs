//! Boundary contract for an opaque asynchronous execution engine.
//!
//! The correlation layer in `tether-client` never talks to an engine
//! directly; it drives one through the [`Engine`] trait: create an
//! instance, submit labeled requests, poll for labeled result batches,
//! execute a restricted request subset synchronously, and destroy the
//! instance once it has reached its terminal state. What the engine does
//! behind those five operations is not this crate's concern.

use std::time::Duration;

/// Identifier correlating a submitted request with its eventual result.
///
/// Identifiers are unique and strictly increasing within one client
/// instance. [`QueryId::UPDATES`] (zero) is reserved for the engine's
/// unsolicited update stream and is never allocated for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryId(u64);

impl QueryId {
	/// Reserved identifier of the update stream.
	pub const UPDATES: QueryId = QueryId(0);

	/// Wraps a raw identifier value.
	#[must_use]
	pub const fn new(raw: u64) -> Self {
		Self(raw)
	}

	/// Returns the raw identifier value.
	#[must_use]
	pub const fn get(self) -> u64 {
		self.0
	}

	/// Returns true for the reserved update-stream identifier.
	#[must_use]
	pub const fn is_updates(self) -> bool {
		self.0 == 0
	}
}

impl std::fmt::Display for QueryId {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		self.0.fmt(f)
	}
}

/// Error-shaped result value, produced by the engine or synthesized by
/// the correlation layer.
///
/// Engines surface ordinary request failures as results carrying one of
/// these rather than through a separate error channel; the correlation
/// layer only guarantees delivery, not success.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("engine error {code}: {message}")]
pub struct EngineError {
	/// Numeric error code.
	pub code: i32,
	/// Human-readable description.
	pub message: String,
}

impl EngineError {
	/// Code carried by the synthesized closed-client error.
	pub const CLOSED_CODE: i32 = 500;

	/// Creates an error from a code and message.
	pub fn new(code: i32, message: impl Into<String>) -> Self {
		Self {
			code,
			message: message.into(),
		}
	}

	/// The fixed result delivered for sends against a closed client and
	/// for requests drained at shutdown.
	#[must_use]
	pub fn closed() -> Self {
		Self::new(Self::CLOSED_CODE, "Client is closed")
	}
}

/// Contract for one opaque execution engine.
///
/// All operations are associated functions: the engine is addressed
/// through its [`Engine::Handle`], never through an instance of the
/// implementing type. Implementations bind the correlation layer to a
/// concrete backend.
pub trait Engine: 'static {
	/// Opaque per-instance engine handle.
	type Handle: Send + Sync + 'static;
	/// Request value submitted to the engine.
	type Request: Send + 'static;
	/// Result value produced by the engine. The `From<EngineError>` bound
	/// lets the correlation layer synthesize closed-client results
	/// without knowing the engine's concrete result shape.
	type Response: From<EngineError> + Send + 'static;

	/// Allocates one engine instance.
	fn create() -> Self::Handle;

	/// Enqueues a labeled request. Must not block.
	fn submit(handle: &Self::Handle, id: QueryId, request: Self::Request);

	/// Receives up to `max_batch` labeled results, blocking up to
	/// `timeout`. A zero timeout returns whatever is already available.
	fn poll(handle: &Self::Handle, max_batch: usize, timeout: Duration) -> Vec<(QueryId, Self::Response)>;

	/// Synchronously evaluates a request from the engine's
	/// synchronous-eligible subset. No handle required; which request
	/// kinds are eligible is enforced by the engine itself.
	fn execute_sync(request: Self::Request) -> Self::Response;

	/// Releases all engine resources for the handle. Must be called
	/// exactly once, after the engine has reached its terminal state.
	fn destroy(handle: &Self::Handle);

	/// The terminal request asking the engine to begin shutting down.
	fn close_request() -> Self::Request;

	/// Returns true if an update-stream result is the terminal signal,
	/// i.e. the engine has fully shut down.
	fn is_close_signal(update: &Self::Response) -> bool;

	/// Changes the engine's log verbosity. Arguments are validated by
	/// the caller.
	fn set_log_verbosity_level(level: i32);

	/// Redirects the engine's internal log to a file; an empty path
	/// reverts to the engine's default sink. Returns whether the sink
	/// was accepted.
	fn set_log_file_path(path: &str) -> bool;

	/// Changes the size at which the engine's log file is rotated.
	/// Arguments are validated by the caller.
	fn set_log_max_file_size(max_file_size: i64);
}
