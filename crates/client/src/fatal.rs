//! Process-wide escalation for unrecoverable engine failures.

use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::Duration;

/// Live client instances, reported in fatal-error messages.
static LIVE_CLIENTS: AtomicU64 = AtomicU64::new(0);

pub(crate) fn client_created() {
	LIVE_CLIENTS.fetch_add(1, Ordering::Relaxed);
}

pub(crate) fn client_destroyed() {
	LIVE_CLIENTS.fetch_sub(1, Ordering::Relaxed);
}

/// Classification of an unrecoverable engine failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FatalKind {
	/// Caused by the environment: storage corruption, disk exhaustion,
	/// or low-level I/O failure.
	External,
	/// A defect inside the engine.
	Internal,
}

fn is_database_broken(message: &str) -> bool {
	message.contains("Wrong key or database is corrupted")
		|| message.contains("SQL logic error or missing database")
		|| message.contains("database disk image is malformed")
		|| message.contains("file is encrypted or is not a database")
		|| message.contains("unsupported file format")
		|| (message.contains("Database was deleted during execution and can't be recreated")
			&& message.contains("PosixError : No such file or directory"))
}

fn is_disk_full(message: &str) -> bool {
	message.contains("PosixError : No space left on device") || message.contains("database or disk is full")
}

fn is_disk_error(message: &str) -> bool {
	message.contains("I/O error") || message.contains("Structure needs cleaning")
}

/// Classifies an unrecoverable failure message.
#[must_use]
pub fn classify(message: &str) -> FatalKind {
	if is_database_broken(message) || is_disk_full(message) || is_disk_error(message) {
		FatalKind::External
	} else {
		FatalKind::Internal
	}
}

/// Escalates an unrecoverable engine failure. Never returns.
///
/// Invoked by the engine boundary, not by callers. The classified
/// failure is raised by panicking on a dedicated thread, out of reach of
/// any per-request exception callback; the invoking boundary thread is
/// then parked permanently.
pub fn escalate(message: &str) -> ! {
	let clients = LIVE_CLIENTS.load(Ordering::Relaxed);
	let kind = classify(message);
	tracing::error!(?kind, clients, error = message, "engine.fatal");

	let message = message.to_owned();
	thread::Builder::new()
		.name("tether-fatal".into())
		.spawn(move || {
			match kind {
				FatalKind::External => panic!("external engine fatal error ({clients}): {message}"),
				FatalKind::Internal => panic!("engine fatal error ({clients}): {message}"),
			};
		})
		.expect("failed to spawn tether-fatal thread");

	loop {
		thread::sleep(Duration::from_secs(1));
	}
}
