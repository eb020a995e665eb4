use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tether_engine::QueryId;

/// Callback invoked with the result of a query or an update event.
pub type ResultCallback<R> = Arc<dyn Fn(R) + Send + Sync>;

/// Callback invoked with the panic payload of a failed result callback.
pub type ExceptionCallback = Arc<dyn Fn(CallbackPanic) + Send + Sync>;

/// Panic payload recovered from a result callback.
pub struct CallbackPanic(Box<dyn Any + Send>);

impl CallbackPanic {
	pub(crate) fn new(payload: Box<dyn Any + Send>) -> Self {
		Self(payload)
	}

	/// Best-effort view of the panic message.
	#[must_use]
	pub fn message(&self) -> &str {
		if let Some(msg) = self.0.downcast_ref::<&'static str>() {
			msg
		} else if let Some(msg) = self.0.downcast_ref::<String>() {
			msg
		} else {
			"opaque panic payload"
		}
	}

	/// Consumes the wrapper, returning the raw payload.
	#[must_use]
	pub fn into_payload(self) -> Box<dyn Any + Send> {
		self.0
	}
}

impl std::fmt::Debug for CallbackPanic {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_tuple("CallbackPanic").field(&self.message()).finish()
	}
}

/// Registered delivery target for one query identifier.
pub(crate) struct Handler<R> {
	pub(crate) result: Option<ResultCallback<R>>,
	pub(crate) exception: Option<ExceptionCallback>,
}

impl<R> Handler<R> {
	pub(crate) fn new(result: Option<ResultCallback<R>>, exception: Option<ExceptionCallback>) -> Self {
		Self { result, exception }
	}

	/// Handler with no delivery targets; results addressed to it are
	/// discarded at delivery time.
	pub(crate) fn empty() -> Self {
		Self::new(None, None)
	}
}

impl<R> Clone for Handler<R> {
	fn clone(&self) -> Self {
		Self {
			result: self.result.clone(),
			exception: self.exception.clone(),
		}
	}
}

/// Thread-safe map from query identifier to registered handler.
///
/// The update-stream handler lives under [`QueryId::UPDATES`] for the
/// whole client lifetime and is cloned out on lookup instead of removed,
/// so it can be invoked without holding the map lock.
pub(crate) struct HandlerRegistry<R> {
	inner: Mutex<HashMap<QueryId, Handler<R>>>,
}

impl<R> HandlerRegistry<R> {
	pub(crate) fn new() -> Self {
		Self {
			inner: Mutex::new(HashMap::new()),
		}
	}

	pub(crate) fn insert(&self, id: QueryId, handler: Handler<R>) {
		self.inner.lock().insert(id, handler);
	}

	/// Atomically removes and returns the handler for `id`.
	pub(crate) fn remove(&self, id: QueryId) -> Option<Handler<R>> {
		self.inner.lock().remove(&id)
	}

	/// Clones out the handler for `id` without removing it.
	pub(crate) fn lookup(&self, id: QueryId) -> Option<Handler<R>> {
		self.inner.lock().get(&id).cloned()
	}

	pub(crate) fn len(&self) -> usize {
		self.inner.lock().len()
	}

	/// Snapshot of every registered identifier except the update stream.
	pub(crate) fn pending_ids(&self) -> Vec<QueryId> {
		self.inner
			.lock()
			.keys()
			.copied()
			.filter(|id| !id.is_updates())
			.collect()
	}
}
