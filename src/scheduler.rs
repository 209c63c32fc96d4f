//! One-shot wall-clock reminders. Each job is a spawned task keyed by the
//! reservation slot it belongs to, so cancelling the reservation can also
//! cancel the reminder. Nothing is persisted: a restart loses pending
//! reminders (documented limitation).

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveDateTime};
use dashmap::DashMap;
use tokio::task::JoinHandle;

/// Identifies a reminder by the unique slot of its reservation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReminderKey {
    pub date: String,
    pub time: String,
    pub barber: String,
}

#[derive(Clone, Default)]
pub struct ReminderScheduler {
    jobs: Arc<DashMap<ReminderKey, JoinHandle<()>>>,
}

impl ReminderScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a one-shot callback for `trigger_at` local wall-clock time.
    /// A trigger already in the past fires immediately. Scheduling an
    /// already-registered key replaces the pending job.
    pub fn schedule<F, Fut>(&self, key: ReminderKey, trigger_at: NaiveDateTime, callback: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let delay = (trigger_at - Local::now().naive_local())
            .to_std()
            .unwrap_or(Duration::ZERO);
        let jobs = Arc::clone(&self.jobs);
        let task_key = key.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            callback().await;
            jobs.remove(&task_key);
        });
        if let Some(replaced) = self.jobs.insert(key, handle) {
            replaced.abort();
        }
    }

    /// Aborts the pending job for `key`. Returns whether one was pending.
    pub fn cancel(&self, key: &ReminderKey) -> bool {
        match self.jobs.remove(key) {
            Some((_, handle)) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    pub fn pending(&self) -> usize {
        self.jobs.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;
    use tokio::sync::mpsc;
    use tokio::time::timeout;

    fn key(time: &str) -> ReminderKey {
        ReminderKey {
            date: "01/09/2025".to_string(),
            time: time.to_string(),
            barber: "joao".to_string(),
        }
    }

    #[tokio::test]
    async fn fires_once_at_the_trigger() {
        let scheduler = ReminderScheduler::new();
        let (tx, mut rx) = mpsc::channel::<&str>(1);
        let trigger = Local::now().naive_local() + ChronoDuration::milliseconds(50);
        scheduler.schedule(key("09:00"), trigger, move || async move {
            let _ = tx.send("fired").await;
        });
        assert_eq!(scheduler.pending(), 1);
        assert_eq!(
            timeout(std::time::Duration::from_secs(2), rx.recv()).await.unwrap(),
            Some("fired")
        );
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn past_trigger_fires_immediately() {
        let scheduler = ReminderScheduler::new();
        let (tx, mut rx) = mpsc::channel::<&str>(1);
        let trigger = Local::now().naive_local() - ChronoDuration::hours(1);
        scheduler.schedule(key("10:00"), trigger, move || async move {
            let _ = tx.send("fired").await;
        });
        assert_eq!(
            timeout(std::time::Duration::from_secs(2), rx.recv()).await.unwrap(),
            Some("fired")
        );
    }

    #[tokio::test]
    async fn cancel_prevents_firing() {
        let scheduler = ReminderScheduler::new();
        let (tx, mut rx) = mpsc::channel::<&str>(1);
        let trigger = Local::now().naive_local() + ChronoDuration::milliseconds(200);
        scheduler.schedule(key("11:00"), trigger, move || async move {
            let _ = tx.send("fired").await;
        });
        assert!(scheduler.cancel(&key("11:00")));
        assert_eq!(scheduler.pending(), 0);
        tokio::time::sleep(std::time::Duration::from_millis(400)).await;
        assert!(rx.try_recv().is_err());
        // A second cancel finds nothing.
        assert!(!scheduler.cancel(&key("11:00")));
    }
}
