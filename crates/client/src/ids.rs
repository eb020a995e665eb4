use std::sync::atomic::{AtomicU64, Ordering};

use tether_engine::QueryId;

/// Allocator for unique, strictly increasing query identifiers.
///
/// The first allocated identifier is 1; [`QueryId::UPDATES`] is never
/// produced. Identifiers are never reused within a client's lifetime.
#[derive(Debug, Default)]
pub(crate) struct QueryIdGen {
	last: AtomicU64,
}

impl QueryIdGen {
	pub(crate) fn new() -> Self {
		Self::default()
	}

	/// Allocates the next identifier.
	pub(crate) fn next(&self) -> QueryId {
		QueryId::new(self.last.fetch_add(1, Ordering::Relaxed) + 1)
	}
}
