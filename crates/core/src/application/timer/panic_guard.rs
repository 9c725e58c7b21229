// Panic isolation for timer callbacks
//
// A callback that panics must not take the registry slot with it: the
// timer is treated as stopped and the slot is released normally.
use futures::FutureExt;
use std::any::Any;
use std::future::Future;
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::error;

/// Result of a panic-guarded execution
#[derive(Debug)]
pub enum PanicGuardResult<T> {
    /// Execution completed successfully
    Success(T),
    /// Execution panicked
    Panicked(String),
}

fn panic_message(panic_info: Box<dyn Any + Send>) -> String {
    if let Some(s) = panic_info.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic_info.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

/// Execute a closure with panic isolation
pub fn execute_guarded<F, T>(timer: &str, f: F) -> PanicGuardResult<T>
where
    F: FnOnce() -> T,
{
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => PanicGuardResult::Success(result),
        Err(panic_info) => {
            let panic_msg = panic_message(panic_info);
            error!(timer = timer, panic_msg = %panic_msg, "Timer callback panicked");
            PanicGuardResult::Panicked(panic_msg)
        }
    }
}

/// Execute a future with panic isolation
pub async fn execute_guarded_async<F, T>(timer: &str, future: F) -> PanicGuardResult<T>
where
    F: Future<Output = T>,
{
    match AssertUnwindSafe(future).catch_unwind().await {
        Ok(result) => PanicGuardResult::Success(result),
        Err(panic_info) => {
            let panic_msg = panic_message(panic_info);
            error!(timer = timer, panic_msg = %panic_msg, "Async timer callback panicked");
            PanicGuardResult::Panicked(panic_msg)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guarded_success() {
        match execute_guarded("ticker", || 42) {
            PanicGuardResult::Success(v) => assert_eq!(v, 42),
            other => panic!("expected success, got {:?}", other),
        }
    }

    #[test]
    fn test_guarded_panic_is_caught() {
        let result = execute_guarded("ticker", || -> u32 { panic!("boom") });
        match result {
            PanicGuardResult::Panicked(msg) => assert_eq!(msg, "boom"),
            other => panic!("expected panic, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_guarded_async_panic_is_caught() {
        let result = execute_guarded_async("heartbeat", async {
            if true {
                panic!("{}", String::from("async boom"));
            }
            1
        })
        .await;
        match result {
            PanicGuardResult::Panicked(msg) => assert_eq!(msg, "async boom"),
            other => panic!("expected panic, got {:?}", other),
        }
    }
}
