//! Progress reporting and cooperative cancellation for long running work.
//!
//! Fetch and install loops poll [`TaskMonitor::is_cancel_requested()`] between work items,
//! an item that has already started always runs to completion.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

pub trait TaskMonitor {
	fn set_description(&self, description: &str);
	/// Informational line shown to the user.
	fn log(&self, message: &str);
	fn log_error(&self, message: &str);
	fn set_progress_max(&self, _max: usize) {}
	fn inc_progress(&self, _delta: usize) {}
	fn is_cancel_requested(&self) -> bool;
}

/// Discards everything and never cancels.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullTaskMonitor;

impl TaskMonitor for NullTaskMonitor {
	fn set_description(&self, _description: &str) {}
	fn log(&self, _message: &str) {}
	fn log_error(&self, _message: &str) {}
	fn is_cancel_requested(&self) -> bool { false }
}

/// Forwards monitor output to the `log` facade.
///
/// Cancellation is driven through the shared flag returned by [`LogTaskMonitor::cancel_flag()`],
/// which may be set from any thread.
#[derive(Debug, Default)]
pub struct LogTaskMonitor {
	cancel: Arc<AtomicBool>,
	progress: AtomicUsize,
	progress_max: AtomicUsize,
}

impl LogTaskMonitor {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_cancel_flag(cancel: Arc<AtomicBool>) -> Self {
		Self { cancel, ..Default::default() }
	}

	pub fn cancel_flag(&self) -> Arc<AtomicBool> {
		self.cancel.clone()
	}

	pub fn progress(&self) -> (usize, usize) {
		(self.progress.load(Ordering::Relaxed), self.progress_max.load(Ordering::Relaxed))
	}
}

impl TaskMonitor for LogTaskMonitor {
	fn set_description(&self, description: &str) {
		log::info!("{}", description);
	}
	fn log(&self, message: &str) {
		log::info!("{}", message);
	}
	fn log_error(&self, message: &str) {
		log::error!("{}", message);
	}
	fn set_progress_max(&self, max: usize) {
		self.progress_max.store(max, Ordering::Relaxed);
	}
	fn inc_progress(&self, delta: usize) {
		let now = self.progress.fetch_add(delta, Ordering::Relaxed) + delta;
		log::trace!("progress {}/{}", now, self.progress_max.load(Ordering::Relaxed));
	}
	fn is_cancel_requested(&self) -> bool {
		self.cancel.load(Ordering::Relaxed)
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn null_monitor_never_cancels() { assert!(!NullTaskMonitor.is_cancel_requested()); }

	#[test]
	fn cancel_flag_is_shared() {
		let monitor = LogTaskMonitor::new();
		let flag = monitor.cancel_flag();
		assert!(!monitor.is_cancel_requested());
		flag.store(true, Ordering::Relaxed);
		assert!(monitor.is_cancel_requested());
	}

	#[test]
	fn progress_accumulates() {
		let monitor = LogTaskMonitor::new();
		monitor.set_progress_max(4);
		monitor.inc_progress(1);
		monitor.inc_progress(2);
		assert_eq!(monitor.progress(), (3, 4));
	}
}
