// ID Provider Port (for deterministic testing)

/// ID provider interface for locally generated job ids
pub trait IdProvider: Send + Sync {
    /// Generate a new unique token (wrapped into a local `JobId` by the caller)
    fn generate_id(&self) -> String;
}

/// UUID v4 provider (production)
pub struct UuidProvider;

impl IdProvider for UuidProvider {
    fn generate_id(&self) -> String {
        uuid::Uuid::new_v4().simple().to_string()
    }
}

pub mod mocks {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    /// Deterministic ids: `1`, `2`, `3`, ...
    #[derive(Debug, Default)]
    pub struct SequentialIdProvider {
        next: AtomicU64,
    }

    impl IdProvider for SequentialIdProvider {
        fn generate_id(&self) -> String {
            (self.next.fetch_add(1, Ordering::SeqCst) + 1).to_string()
        }
    }
}
