//! Tick sources driving the poller
//!
//! Production uses a tokio interval; tests push ticks through a channel so
//! every poll happens exactly when the test says so.

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::time::{interval, Duration, Interval, MissedTickBehavior};

#[async_trait]
pub trait Ticker: Send + Sync {
    /// Wait for the next tick; false once the source is closed
    async fn tick(&mut self) -> bool;
}

/// Fixed interval, first tick fires immediately
pub struct IntervalTicker {
    interval: Interval,
}

impl IntervalTicker {
    pub fn new(period: Duration) -> Self {
        let mut interval = interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { interval }
    }
}

#[async_trait]
impl Ticker for IntervalTicker {
    async fn tick(&mut self) -> bool {
        self.interval.tick().await;
        true
    }
}

/// Ticks delivered by a [`TickSender`]
pub struct ChannelTicker {
    rx: mpsc::Receiver<()>,
}

#[derive(Clone)]
pub struct TickSender {
    tx: mpsc::Sender<()>,
}

impl TickSender {
    /// False when the ticker was dropped
    pub async fn tick(&self) -> bool {
        self.tx.send(()).await.is_ok()
    }
}

pub fn channel_ticker(buffer: usize) -> (TickSender, ChannelTicker) {
    let (tx, rx) = mpsc::channel(buffer.max(1));
    (TickSender { tx }, ChannelTicker { rx })
}

#[async_trait]
impl Ticker for ChannelTicker {
    async fn tick(&mut self) -> bool {
        self.rx.recv().await.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn channel_ticker_closes_with_sender() {
        let (sender, mut ticker) = channel_ticker(4);
        assert!(sender.tick().await);
        assert!(ticker.tick().await);

        drop(sender);
        assert!(!ticker.tick().await);
    }

    #[tokio::test]
    async fn interval_ticker_fires_immediately() {
        let mut ticker = IntervalTicker::new(Duration::from_secs(30));
        let first = tokio::time::timeout(Duration::from_secs(1), ticker.tick()).await;
        assert!(matches!(first, Ok(true)));
    }
}
