//! Completion observers and their registration set.

use std::sync::Arc;

use crate::message::ServiceResponse;

/// Completion listener. Callbacks run on the dispatcher's delivery task,
/// one at a time; implementations check
/// [`ServiceResponse::responds_to`](crate::ServiceResponse::responds_to)
/// for ids they track and ignore the rest, since the dispatcher does not
/// filter per observer.
pub trait ServiceObserver: Send + Sync {
    fn on_completed(&self, response: &ServiceResponse);
}

/// Wrap a closure as a [`ServiceObserver`].
pub fn observer_fn<F>(f: F) -> Arc<dyn ServiceObserver>
where
    F: Fn(&ServiceResponse) + Send + Sync + 'static,
{
    struct FnObserver<F>(F);

    impl<F> ServiceObserver for FnObserver<F>
    where
        F: Fn(&ServiceResponse) + Send + Sync + 'static,
    {
        fn on_completed(&self, response: &ServiceResponse) {
            (self.0)(response)
        }
    }

    Arc::new(FnObserver(f))
}

/// Observer membership with set semantics keyed by `Arc` identity.
/// Mutated only under the dispatcher's state lock; notification iterates a
/// snapshot so callbacks can re-register or unregister freely.
#[derive(Default)]
pub(crate) struct ObserverSet {
    entries: Vec<Arc<dyn ServiceObserver>>,
}

impl ObserverSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `observer`; re-adding the same `Arc` is a no-op. Returns whether
    /// membership changed.
    pub fn add(&mut self, observer: Arc<dyn ServiceObserver>) -> bool {
        if self.entries.iter().any(|existing| Arc::ptr_eq(existing, &observer)) {
            return false;
        }
        self.entries.push(observer);
        true
    }

    /// Remove by identity; unknown observers are a no-op. Returns whether
    /// membership changed.
    pub fn remove(&mut self, observer: &Arc<dyn ServiceObserver>) -> bool {
        let before = self.entries.len();
        self.entries.retain(|existing| !Arc::ptr_eq(existing, observer));
        self.entries.len() != before
    }

    /// Clone of the current membership, iterated outside the lock.
    pub fn snapshot(&self) -> Vec<Arc<dyn ServiceObserver>> {
        self.entries.clone()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
