//! Cancellable scheduled tasks and the debouncer built on them.
//!
//! A `Debouncer` owns at most one pending timer. Scheduling again aborts the
//! pending one and starts over; when the delay elapses the payload is sent to
//! the owner's channel wrapped in a `Fired` ticket. The owner hands the
//! ticket back through `claim`, which rejects anything that is no longer the
//! pending schedule (a timer can fire just before it is cancelled).

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// A payload whose quiet period has elapsed.
#[derive(Debug)]
pub struct Fired<T> {
    ticket: u64,
    payload: T,
}

impl<T> Fired<T> {
    pub fn ticket(&self) -> u64 {
        self.ticket
    }
}

/// Handle to a spawned delayed task.
#[derive(Debug)]
pub struct ScheduledTask {
    handle: JoinHandle<()>,
}

impl ScheduledTask {
    /// Run `f` after `delay` on the current runtime.
    pub fn spawn<F>(delay: Duration, f: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            f();
        });
        Self { handle }
    }

    pub fn cancel(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

#[derive(Debug)]
pub struct Debouncer<T> {
    delay: Duration,
    tx: mpsc::UnboundedSender<Fired<T>>,
    pending: Option<(u64, ScheduledTask)>,
    next_ticket: u64,
}

impl<T: Send + 'static> Debouncer<T> {
    pub fn new(delay: Duration, tx: mpsc::UnboundedSender<Fired<T>>) -> Self {
        Self {
            delay,
            tx,
            pending: None,
            next_ticket: 0,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// (Re)start the quiet period with `payload`.
    pub fn schedule(&mut self, payload: T) {
        self.cancel();
        self.next_ticket += 1;
        let ticket = self.next_ticket;
        let tx = self.tx.clone();
        let task = ScheduledTask::spawn(self.delay, move || {
            // Receiver gone means the owner shut down.
            let _ = tx.send(Fired { ticket, payload });
        });
        self.pending = Some((ticket, task));
    }

    pub fn cancel(&mut self) {
        if let Some((_, task)) = self.pending.take() {
            task.cancel();
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Accept a fired payload if it belongs to the pending schedule.
    pub fn claim(&mut self, fired: Fired<T>) -> Option<T> {
        match self.pending {
            Some((ticket, _)) if ticket == fired.ticket => {
                self.pending = None;
                Some(fired.payload)
            }
            _ => None,
        }
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        if let Some((_, task)) = self.pending.take() {
            task.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{sleep, timeout};

    #[tokio::test(start_paused = true)]
    async fn rapid_schedules_collapse_to_the_last() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut d = Debouncer::new(Duration::from_millis(200), tx);

        for word in ["g", "gr", "gro", "groc"] {
            d.schedule(word.to_string());
            sleep(Duration::from_millis(50)).await;
        }
        assert!(d.is_pending());

        let fired = rx.recv().await.unwrap();
        assert_eq!(d.claim(fired).as_deref(), Some("groc"));
        assert!(!d.is_pending());

        // Nothing else was sent.
        assert!(timeout(Duration::from_secs(1), rx.recv()).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_stops_the_timer() {
        let (tx, mut rx) = mpsc::unbounded_channel::<Fired<u32>>();
        let mut d = Debouncer::new(Duration::from_millis(100), tx);
        d.schedule(1);
        sleep(Duration::from_millis(40)).await;
        d.cancel();
        assert!(timeout(Duration::from_secs(1), rx.recv()).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn stale_ticket_is_rejected() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut d = Debouncer::new(Duration::from_millis(10), tx);
        d.schedule(1u32);
        let first = rx.recv().await.unwrap();

        // Rescheduled before the owner got round to the first firing.
        d.schedule(2);
        assert_eq!(d.claim(first), None);
        let second = rx.recv().await.unwrap();
        assert_eq!(d.claim(second), Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn scheduled_task_runs_after_delay() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let task = ScheduledTask::spawn(Duration::from_millis(30), move || {
            let _ = tx.send(());
        });
        rx.recv().await.unwrap();
        sleep(Duration::from_millis(1)).await;
        assert!(task.is_finished());
    }
}
