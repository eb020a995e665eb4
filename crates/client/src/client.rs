//! The client: dispatcher, receiver loop, result delivery, and lifecycle.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use parking_lot::RwLock;
use tether_engine::{Engine, EngineError, QueryId};

use crate::fatal;
use crate::ids::QueryIdGen;
use crate::registry::{CallbackPanic, ExceptionCallback, Handler, HandlerRegistry, ResultCallback};

/// Upper bound on results drained from the boundary per poll call.
const RECEIVE_BATCH: usize = 1000;
/// Blocking timeout for one receiver-loop poll call.
const RECEIVE_TIMEOUT: Duration = Duration::from_secs(300);

/// Correlation client for one engine instance.
///
/// Any number of threads may call [`Client::send`] and [`Client::close`]
/// concurrently; results are delivered by a dedicated receiver thread
/// started at construction. See the crate docs for the lifecycle
/// contract.
pub struct Client<E: Engine> {
	handle: E::Handle,
	registry: HandlerRegistry<E::Response>,
	ids: QueryIdGen,
	/// Set by the receiver loop when the terminal update arrives.
	stopped: AtomicBool,
	/// Set once by the first `close` call.
	destroyed: AtomicBool,
	/// Shutdown exclusivity: senders share it, `close` takes it exclusively.
	shutdown: RwLock<()>,
	default_exception: Option<ExceptionCallback>,
}

impl<E: Engine> Client<E> {
	/// Creates a client and starts its receiver loop.
	///
	/// `update` receives every unsolicited engine event, including the
	/// terminal shutdown signal, for the whole instance lifetime.
	/// `default_exception` is the fallback for panics in result callbacks
	/// registered without their own exception callback.
	pub fn create(
		update: Option<ResultCallback<E::Response>>,
		update_exception: Option<ExceptionCallback>,
		default_exception: Option<ExceptionCallback>,
	) -> Arc<Self> {
		fatal::client_created();
		let client = Arc::new(Self {
			handle: E::create(),
			registry: HandlerRegistry::new(),
			ids: QueryIdGen::new(),
			stopped: AtomicBool::new(false),
			destroyed: AtomicBool::new(false),
			shutdown: RwLock::new(()),
			default_exception,
		});
		client
			.registry
			.insert(QueryId::UPDATES, Handler::new(update, update_exception));

		let worker = Arc::clone(&client);
		thread::Builder::new()
			.name("tether-receiver".into())
			.spawn(move || worker.run())
			.expect("failed to spawn tether-receiver thread");
		client
	}

	/// Sends a request to the engine.
	///
	/// Delivery is asynchronous through the receiver loop: `result` is
	/// invoked with the engine's result for this request, or with the
	/// fixed closed-client error if the client shuts down first. After
	/// [`Client::close`] has begun, the closed-client error is delivered
	/// synchronously on the calling thread instead and the engine is
	/// never contacted.
	///
	/// A panic in `result` is routed to `exception`, falling back to the
	/// client-wide default exception callback.
	pub fn send(
		&self,
		request: E::Request,
		result: Option<ResultCallback<E::Response>>,
		exception: Option<ExceptionCallback>,
	) {
		let _permit = self.shutdown.read();
		if self.destroyed.load(Ordering::SeqCst) {
			if result.is_some() {
				self.deliver(EngineError::closed().into(), result, exception);
			}
			return;
		}
		self.submit(request, Handler::new(result, exception));
	}

	/// Sends a request with a result closure and no exception callback.
	pub fn send_with(&self, request: E::Request, result: impl Fn(E::Response) + Send + Sync + 'static) {
		self.send(request, Some(Arc::new(result)), None);
	}

	/// Registers `handler` under a fresh identifier and submits the
	/// request. Callers must exclude `close`'s shutdown bookkeeping.
	fn submit(&self, request: E::Request, handler: Handler<E::Response>) {
		let id = self.ids.next();
		self.registry.insert(id, handler);
		tracing::trace!(%id, "client.send");
		E::submit(&self.handle, id, request);
	}

	/// Synchronously executes a request from the engine's
	/// synchronous-eligible subset. Touches no client state; no instance
	/// is required.
	pub fn execute(request: E::Request) -> E::Response {
		E::execute_sync(request)
	}

	fn run(&self) {
		while !self.stopped.load(Ordering::SeqCst) {
			self.receive_batch(RECEIVE_TIMEOUT);
		}
		tracing::debug!("receiver.stop");
	}

	/// One poll cycle: drain up to [`RECEIVE_BATCH`] results and route
	/// each in the order received.
	fn receive_batch(&self, timeout: Duration) {
		for (id, response) in E::poll(&self.handle, RECEIVE_BATCH, timeout) {
			self.process_result(id, response);
		}
	}

	/// Routes one labeled result to its registered handler.
	fn process_result(&self, id: QueryId, response: E::Response) {
		let handler = if id.is_updates() {
			// The terminal check runs before the update handler sees the
			// event; the update handler itself is never removed.
			if E::is_close_signal(&response) {
				self.stopped.store(true, Ordering::SeqCst);
				tracing::debug!("receiver.terminal");
			}
			self.registry.lookup(id)
		} else {
			self.registry.remove(id)
		};

		// Already delivered, drained, or never registered.
		let Some(handler) = handler else { return };
		self.deliver(response, handler.result, handler.exception);
	}

	/// Invokes a result callback with panic isolation.
	///
	/// A panic in the callback goes to `exception`, else to the client
	/// default; a panic in the exception callback is discarded. No
	/// registry or shutdown lock is held here.
	fn deliver(
		&self,
		response: E::Response,
		result: Option<ResultCallback<E::Response>>,
		exception: Option<ExceptionCallback>,
	) {
		let Some(result) = result else { return };
		if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| result(response))) {
			let exception = exception.or_else(|| self.default_exception.clone());
			if let Some(exception) = exception {
				let cause = CallbackPanic::new(payload);
				let _ = panic::catch_unwind(AssertUnwindSafe(|| exception(cause)));
			}
		}
	}

	/// Closes the client.
	///
	/// Asks the engine to shut down, waits until the receiver loop has
	/// observed the terminal update, resolves every outstanding request
	/// with the closed-client error, and releases the engine instance.
	/// Idempotent and safe to call from any thread; later calls return
	/// without effect.
	pub fn close(&self) {
		{
			let _permit = self.shutdown.write();
			if self.destroyed.load(Ordering::SeqCst) {
				return;
			}
			if !self.stopped.load(Ordering::SeqCst) {
				self.submit(E::close_request(), Handler::empty());
			}
			self.destroyed.store(true, Ordering::SeqCst);
		}
		tracing::debug!("client.close");

		// The engine may still be emitting final results; the receiver
		// loop must observe the terminal update before the handle can be
		// released.
		while !self.stopped.load(Ordering::SeqCst) {
			thread::yield_now();
		}

		if self.registry.len() != 1 {
			// Opportunistic: pick up results the engine produced between
			// the terminal update and now, then resolve the rest.
			self.receive_batch(Duration::ZERO);
			for id in self.registry.pending_ids() {
				self.process_result(id, EngineError::closed().into());
			}
		}

		E::destroy(&self.handle);
		fatal::client_destroyed();
	}
}

impl<E: Engine> Drop for Client<E> {
	fn drop(&mut self) {
		// Best-effort finalizer; the receiver thread holds the instance
		// alive while it runs, so this only fires after the loop stopped
		// or the client was closed explicitly.
		self.close();
	}
}
