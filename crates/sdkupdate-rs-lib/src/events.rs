//! Notifying interested parties about SDK changes.
//!
//! Nothing in the library knows about UI threads. Listeners are always called through an
//! [`EffectExecutor`], which a UI can replace to run them wherever it needs to.

use std::sync::Arc;

pub trait SdkChangeListener {
	/// The SDK content was parsed for the first time.
	fn on_sdk_loaded(&self) {}
	/// The SDK content changed and was parsed again.
	fn on_sdk_reload(&self) {}
	/// Called once before the first archive of a batch is installed.
	fn pre_install_hook(&self) {}
	/// Called once after a batch that started installing.
	fn post_install_hook(&self) {}
}

/// Runs a notification.
pub trait EffectExecutor {
	fn execute(&self, effect: &mut dyn FnMut());
}

/// Runs notifications right away on the calling thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct SyncExecutor;

impl EffectExecutor for SyncExecutor {
	fn execute(&self, effect: &mut dyn FnMut()) {
		effect()
	}
}

pub struct SdkEvents {
	listeners: Vec<Arc<dyn SdkChangeListener>>,
	executor: Box<dyn EffectExecutor>,
}

impl Default for SdkEvents {
	fn default() -> Self {
		Self { listeners: Vec::new(), executor: Box::new(SyncExecutor) }
	}
}

impl std::fmt::Debug for SdkEvents {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("SdkEvents").field("listeners", &self.listeners.len()).finish()
	}
}

impl SdkEvents {
	pub fn with_executor(executor: Box<dyn EffectExecutor>) -> Self {
		Self { listeners: Vec::new(), executor }
	}

	pub fn add_listener(&mut self, listener: Arc<dyn SdkChangeListener>) {
		self.listeners.push(listener);
	}

	pub fn remove_listener(&mut self, listener: &Arc<dyn SdkChangeListener>) {
		self.listeners.retain(|l| !Arc::ptr_eq(l, listener));
	}

	fn broadcast(&self, name: &str, call: fn(&dyn SdkChangeListener)) {
		if self.listeners.is_empty() {
			return;
		}
		log::trace!("Broadcasting {} to {} listeners", name, self.listeners.len());
		self.executor.execute(&mut || {
			for l in &self.listeners {
				call(l.as_ref());
			}
		});
	}

	pub fn broadcast_on_sdk_loaded(&self) {
		self.broadcast("sdk loaded", |l| l.on_sdk_loaded());
	}

	pub fn broadcast_on_sdk_reload(&self) {
		self.broadcast("sdk reload", |l| l.on_sdk_reload());
	}

	pub fn broadcast_pre_install_hook(&self) {
		self.broadcast("pre install", |l| l.pre_install_hook());
	}

	pub fn broadcast_post_install_hook(&self) {
		self.broadcast("post install", |l| l.post_install_hook());
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use std::sync::Mutex;
	use std::sync::atomic::{AtomicUsize, Ordering};

	#[derive(Default)]
	struct Counting {
		reloads: AtomicUsize,
	}
	impl SdkChangeListener for Counting {
		fn on_sdk_reload(&self) { self.reloads.fetch_add(1, Ordering::Relaxed); }
	}

	struct Recording(Mutex<usize>);
	impl EffectExecutor for Recording {
		fn execute(&self, effect: &mut dyn FnMut()) {
			*self.0.lock().unwrap() += 1;
			effect();
		}
	}

	#[test]
	fn listeners_run_through_executor() {
		let executor = Arc::new(Recording(Mutex::new(0)));
		struct Shared(Arc<Recording>);
		impl EffectExecutor for Shared {
			fn execute(&self, effect: &mut dyn FnMut()) { self.0.execute(effect) }
		}

		let mut events = SdkEvents::with_executor(Box::new(Shared(executor.clone())));
		let listener = Arc::new(Counting::default());
		events.add_listener(listener.clone());
		events.broadcast_on_sdk_reload();
		events.broadcast_on_sdk_reload();

		assert_eq!(listener.reloads.load(Ordering::Relaxed), 2);
		assert_eq!(*executor.0.lock().unwrap(), 2);
	}

	#[test]
	fn removed_listener_is_not_called() {
		let mut events = SdkEvents::default();
		let listener = Arc::new(Counting::default());
		let as_dyn: Arc<dyn SdkChangeListener> = listener.clone();
		events.add_listener(as_dyn.clone());
		events.remove_listener(&as_dyn);
		events.broadcast_on_sdk_reload();
		assert_eq!(listener.reloads.load(Ordering::Relaxed), 0);
	}
}
