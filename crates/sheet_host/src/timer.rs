//! Host timers used to bound waits on the platform surface.

use std::{future::Future, pin::Pin, time::Duration};

/// Object-safe boxed future used by [`HostTimer`].
pub type TimerFuture<'a> = Pin<Box<dyn Future<Output = ()> + 'a>>;

/// Host service resolving after a delay.
pub trait HostTimer {
    /// Resolves once `duration` has elapsed.
    fn sleep<'a>(&'a self, duration: Duration) -> TimerFuture<'a>;
}

#[derive(Debug, Clone, Copy, Default)]
/// Timer backed by the tokio clock.
///
/// Must be polled inside a tokio runtime with the time driver enabled.
pub struct TokioTimer;

impl HostTimer for TokioTimer {
    fn sleep<'a>(&'a self, duration: Duration) -> TimerFuture<'a> {
        Box::pin(tokio::time::sleep(duration))
    }
}

#[derive(Debug, Clone, Copy, Default)]
/// Timer whose every delay has already elapsed.
pub struct ElapsedTimer;

impl HostTimer for ElapsedTimer {
    fn sleep<'a>(&'a self, _duration: Duration) -> TimerFuture<'a> {
        Box::pin(async {})
    }
}

#[derive(Debug, Clone, Copy, Default)]
/// Timer that never fires; bounded waits then last as long as the awaited event.
pub struct PendingTimer;

impl HostTimer for PendingTimer {
    fn sleep<'a>(&'a self, _duration: Duration) -> TimerFuture<'a> {
        Box::pin(futures::future::pending())
    }
}

#[cfg(test)]
mod tests {
    use futures::FutureExt;

    use super::*;

    #[test]
    fn elapsed_and_pending_timers_resolve_as_named() {
        assert_eq!(
            ElapsedTimer.sleep(Duration::from_secs(60)).now_or_never(),
            Some(())
        );
        assert_eq!(PendingTimer.sleep(Duration::ZERO).now_or_never(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn tokio_timer_follows_the_paused_clock() {
        let started = tokio::time::Instant::now();

        TokioTimer.sleep(Duration::from_millis(250)).await;

        assert!(started.elapsed() >= Duration::from_millis(250));
    }
}
