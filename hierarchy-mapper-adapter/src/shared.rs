use std::sync::Arc;

use hierarchy_mapper::HierarchicalDataProvider;
use parking_lot::Mutex;

use crate::Controller;

/// A clonable handle to one [`Controller`] shared between threads.
///
/// Every operation runs under the lock, reads included, since reads may fetch.
pub struct SharedMapper<T, F, P: HierarchicalDataProvider<T, F>> {
    inner: Arc<Mutex<Controller<T, F, P>>>,
}

impl<T, F, P: HierarchicalDataProvider<T, F>> SharedMapper<T, F, P> {
    pub fn new(controller: Controller<T, F, P>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(controller)),
        }
    }

    /// Runs `f` with exclusive access to the controller.
    pub fn with<R>(&self, f: impl FnOnce(&mut Controller<T, F, P>) -> R) -> R {
        f(&mut self.inner.lock())
    }

    /// Like [`Self::with`], but returns `None` instead of waiting when another handle holds
    /// the lock.
    pub fn try_with<R>(&self, f: impl FnOnce(&mut Controller<T, F, P>) -> R) -> Option<R> {
        self.inner.try_lock().map(|mut guard| f(&mut guard))
    }

    /// Number of live handles.
    pub fn handle_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }
}

impl<T, F, P: HierarchicalDataProvider<T, F>> Clone for SharedMapper<T, F, P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}
