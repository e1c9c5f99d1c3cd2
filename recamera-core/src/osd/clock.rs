//! Wall clock that drives the date/time overlay

use std::time::Duration;

use chrono::{Local, NaiveDateTime};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Publishes the local time on a fixed interval until dropped
#[derive(Debug)]
pub struct OsdClock {
    receiver: watch::Receiver<NaiveDateTime>,
    task: JoinHandle<()>,
}

impl OsdClock {
    /// Start ticking; must be called inside a tokio runtime
    pub fn start(interval: Duration) -> Self {
        let (sender, receiver) = watch::channel(Local::now().naive_local());
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                if sender.send(Local::now().naive_local()).is_err() {
                    break;
                }
            }
        });
        Self { receiver, task }
    }

    /// Most recent clock value
    pub fn now(&self) -> NaiveDateTime {
        *self.receiver.borrow()
    }

    /// Receiver that is notified on every tick
    pub fn subscribe(&self) -> watch::Receiver<NaiveDateTime> {
        self.receiver.clone()
    }
}

impl Drop for OsdClock {
    fn drop(&mut self) {
        self.task.abort();
    }
}
