use std::sync::{Arc, PoisonError, RwLock};

/// Copy-on-write cell for state that is read far more often than it is written.
///
/// Readers take a `snapshot()`, an `Arc` of the current value, and never see a half-applied
/// update. Writers clone the value, modify the clone and swap it in while holding the write
/// lock, so writers are serialized against each other.
pub struct Shared<T> {
    inner: RwLock<Arc<T>>,
}

impl<T: Clone> Shared<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: RwLock::new(Arc::new(value)),
        }
    }

    pub fn snapshot(&self) -> Arc<T> {
        // A panic can't leave a torn value behind: the Arc is replaced in a single store.
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    pub fn with<R, F: FnOnce(&T) -> R>(&self, f: F) -> R {
        f(&self.snapshot())
    }

    /// Applies `f` to a private copy and publishes it.
    pub fn update<R, F: FnOnce(&mut T) -> R>(&self, f: F) -> R {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = T::clone(&guard);
        let result = f(&mut next);
        *guard = Arc::new(next);
        result
    }

    /// Like [`update`](Self::update), but if `f` returns `Err` nothing is
    /// published.
    pub fn try_update<R, E, F>(&self, f: F) -> Result<R, E>
    where
        F: FnOnce(&mut T) -> Result<R, E>,
    {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = T::clone(&guard);
        let result = f(&mut next)?;
        *guard = Arc::new(next);
        Ok(result)
    }
}

impl<T: Clone + Default> Default for Shared<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}
