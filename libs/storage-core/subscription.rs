use std::fmt;

/// Payload-less change notification: the subscriber re-fetches whatever it
/// cares about when invoked.
pub type ChangeCallback = Box<dyn Fn() + Send + Sync + 'static>;

/// Backend-agnostic subscription handle. The wrapped canceller runs once,
/// either through an explicit `unsubscribe` or when the guard is dropped.
pub struct SubscriptionGuard {
    canceller: Option<Box<dyn FnOnce() + Send>>,
}

impl SubscriptionGuard {
    pub fn new<F: FnOnce() + Send + 'static>(canceller: F) -> Self {
        Self {
            canceller: Some(Box::new(canceller)),
        }
    }

    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.canceller.take() {
            cancel();
        }
    }
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        if let Some(cancel) = self.canceller.take() {
            cancel();
        }
    }
}

impl fmt::Debug for SubscriptionGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionGuard")
            .field("active", &self.canceller.is_some())
            .finish()
    }
}
