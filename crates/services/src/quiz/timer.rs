use std::time::Duration;

use quiz_core::session::QuizIntent;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::debug;

/// Periodic `QuizIntent::Tick` source for one quiz session.
///
/// Each timer owns its channel, so ticks from a stopped timer never reach a
/// later session. The task is aborted on `stop` or drop.
#[derive(Debug)]
pub struct QuizTimer {
    handle: JoinHandle<()>,
    ticks: mpsc::Receiver<QuizIntent>,
}

impl QuizTimer {
    pub const PERIOD: Duration = Duration::from_secs(1);
    const BUFFER: usize = 4;

    /// Start producing one tick per second.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn start() -> Self {
        Self::with_period(Self::PERIOD)
    }

    #[must_use]
    pub fn with_period(period: Duration) -> Self {
        let (tx, ticks) = mpsc::channel(Self::BUFFER);
        let handle = tokio::spawn(async move {
            let mut interval = time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            interval.tick().await;
            loop {
                interval.tick().await;
                if tx.send(QuizIntent::Tick).await.is_err() {
                    debug!("tick receiver closed; timer exiting");
                    break;
                }
            }
        });
        Self { handle, ticks }
    }

    /// Wait for the next tick; `None` once the timer has stopped.
    pub async fn next_tick(&mut self) -> Option<QuizIntent> {
        self.ticks.recv().await
    }

    /// Stop ticking and discard ticks that were already queued.
    pub fn stop(&mut self) {
        self.handle.abort();
        self.ticks.close();
        while self.ticks.try_recv().is_ok() {}
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for QuizTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn ticks_once_per_period_until_stopped() {
        let mut timer = QuizTimer::start();

        for _ in 0..3 {
            assert_eq!(timer.next_tick().await, Some(QuizIntent::Tick));
        }

        timer.stop();
        assert_eq!(timer.next_tick().await, None);
        tokio::task::yield_now().await;
        assert!(!timer.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn stopping_discards_queued_ticks() {
        let mut timer = QuizTimer::start();
        // Let several ticks pile up without reading them.
        time::sleep(Duration::from_millis(3500)).await;
        timer.stop();
        assert_eq!(timer.next_tick().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn each_timer_has_its_own_ticks() {
        let mut first = QuizTimer::start();
        time::sleep(Duration::from_millis(2500)).await;
        first.stop();

        let mut second = QuizTimer::start();
        let started = time::Instant::now();
        assert_eq!(second.next_tick().await, Some(QuizIntent::Tick));
        assert!(started.elapsed() >= QuizTimer::PERIOD);
    }
}
