//! Periodic task scheduling for liveness polling.
//!
//! [`Scheduler::every`] returns an [`IntervalHandle`]; the interval runs until
//! the handle is cancelled or dropped, so a poll can never outlive the tab
//! handle that owns it.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::warn;

/// Callback run on every tick.
pub type Tick = Box<dyn FnMut() + Send>;

/// Runs callbacks on a fixed period.
pub trait Scheduler: Send + Sync {
	/// Runs `tick` every `period`, first after one full period.
	fn every(&self, period: Duration, tick: Tick) -> IntervalHandle;
}

/// Cancels its interval when dropped.
pub struct IntervalHandle {
	canceller: Option<Box<dyn FnOnce() + Send>>,
}

impl IntervalHandle {
	pub fn new(canceller: impl FnOnce() + Send + 'static) -> Self {
		Self {
			canceller: Some(Box::new(canceller)),
		}
	}

	/// A handle with nothing to cancel.
	pub fn inert() -> Self {
		Self { canceller: None }
	}

	/// Stops the interval. Equivalent to dropping.
	pub fn cancel(mut self) {
		self.run_canceller();
	}

	fn run_canceller(&mut self) {
		if let Some(canceller) = self.canceller.take() {
			canceller();
		}
	}
}

impl Drop for IntervalHandle {
	fn drop(&mut self) {
		self.run_canceller();
	}
}

impl fmt::Debug for IntervalHandle {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("IntervalHandle")
			.field("active", &self.canceller.is_some())
			.finish()
	}
}

/// [`Scheduler`] backed by `tokio::time::interval` on the current runtime.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioScheduler;

impl Scheduler for TokioScheduler {
	fn every(&self, period: Duration, mut tick: Tick) -> IntervalHandle {
		let Ok(runtime) = Handle::try_current() else {
			warn!("no tokio runtime; interval not scheduled");
			return IntervalHandle::inert();
		};

		let (cancel_tx, mut cancel_rx) = oneshot::channel::<()>();
		runtime.spawn(async move {
			let mut interval = tokio::time::interval_at(Instant::now() + period, period);
			interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
			loop {
				tokio::select! {
					biased;
					_ = &mut cancel_rx => break,
					_ = interval.tick() => tick(),
				}
			}
		});

		IntervalHandle::new(move || {
			let _ = cancel_tx.send(());
		})
	}
}

struct ManualEntry {
	period: Duration,
	cancelled: Arc<AtomicBool>,
	tick: Arc<Mutex<Tick>>,
}

/// [`Scheduler`] that only ticks when told to.
///
/// Intended for tests and for embedders that drive polling from their own
/// event loop.
#[derive(Clone, Default)]
pub struct ManualScheduler {
	entries: Arc<Mutex<Vec<ManualEntry>>>,
}

impl ManualScheduler {
	pub fn new() -> Self {
		Self::default()
	}

	/// Runs every live interval once. Returns how many ticked.
	///
	/// Ticks run without the registry locked, so a tick may schedule or
	/// cancel intervals.
	pub fn tick_all(&self) -> usize {
		let due: Vec<_> = {
			let mut entries = self.entries.lock();
			entries.retain(|entry| !entry.cancelled.load(Ordering::SeqCst));
			entries
				.iter()
				.map(|entry| (Arc::clone(&entry.cancelled), Arc::clone(&entry.tick)))
				.collect()
		};

		let mut ticked = 0;
		for (cancelled, tick) in due {
			if cancelled.load(Ordering::SeqCst) {
				continue;
			}
			(tick.lock())();
			ticked += 1;
		}
		ticked
	}

	/// Number of intervals not yet cancelled.
	pub fn active_count(&self) -> usize {
		self.entries
			.lock()
			.iter()
			.filter(|entry| !entry.cancelled.load(Ordering::SeqCst))
			.count()
	}

	/// Periods of the intervals not yet cancelled, in registration order.
	pub fn periods(&self) -> Vec<Duration> {
		self.entries
			.lock()
			.iter()
			.filter(|entry| !entry.cancelled.load(Ordering::SeqCst))
			.map(|entry| entry.period)
			.collect()
	}
}

impl Scheduler for ManualScheduler {
	fn every(&self, period: Duration, tick: Tick) -> IntervalHandle {
		let cancelled = Arc::new(AtomicBool::new(false));
		self.entries.lock().push(ManualEntry {
			period,
			cancelled: Arc::clone(&cancelled),
			tick: Arc::new(Mutex::new(tick)),
		});
		IntervalHandle::new(move || cancelled.store(true, Ordering::SeqCst))
	}
}

impl fmt::Debug for ManualScheduler {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ManualScheduler")
			.field("active", &self.active_count())
			.finish()
	}
}
