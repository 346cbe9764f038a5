use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative cancellation flag shared between a request handler and the
/// dispatch layer that may abandon it.
///
/// Cancellation is polled at loop boundaries (between modules, between
/// files), never preemptively; latency is bounded by one file's worst-case
/// analysis time. Once observed, the operation returns an *empty* result,
/// not a partial one.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag {
    inner: Arc<AtomicBool>,
}

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.inner.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.load(Ordering::Relaxed)
    }
}

/// Per-request context threaded through resolver and search paths.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub cancel: CancellationFlag,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_flag(cancel: CancellationFlag) -> Self {
        Self { cancel }
    }

    pub fn cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_is_shared_between_clones() {
        let flag = CancellationFlag::new();
        let observer = flag.clone();
        assert!(!observer.is_cancelled());
        flag.cancel();
        assert!(observer.is_cancelled());
    }
}
