use crate::ingestion::{IntervalTicker, Poller, Ticker};
use crate::logger::{self, LogTag};
use crate::services::{Service, ServiceHealth};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::Duration;

/// Runs the poller on its tick source
pub struct IngestionService {
    poller: Arc<Poller>,
    ticker: Option<Box<dyn Ticker>>,
}

impl IngestionService {
    pub fn new(poller: Arc<Poller>, poll_interval: Duration) -> Self {
        Self::with_ticker(poller, Box::new(IntervalTicker::new(poll_interval)))
    }

    pub fn with_ticker(poller: Arc<Poller>, ticker: Box<dyn Ticker>) -> Self {
        Self {
            poller,
            ticker: Some(ticker),
        }
    }
}

#[async_trait]
impl Service for IngestionService {
    fn name(&self) -> &'static str {
        "ingestion"
    }

    fn priority(&self) -> i32 {
        50
    }

    async fn start(&mut self, shutdown: Arc<Notify>) -> Result<Vec<JoinHandle<()>>, String> {
        let ticker = self
            .ticker
            .take()
            .ok_or_else(|| "ingestion already started".to_string())?;
        let handle = tokio::spawn(self.poller.clone().run(ticker, shutdown));
        Ok(vec![handle])
    }

    async fn stop(&mut self) -> Result<(), String> {
        logger::info(
            LogTag::Ingestion,
            &format!(
                "Ingestion stopping ({} ticks, {} transfers)",
                self.poller.tick_count(),
                self.poller.transfer_count()
            ),
        );
        Ok(())
    }

    async fn health(&self) -> ServiceHealth {
        if self.ticker.is_some() {
            ServiceHealth::Starting
        } else {
            ServiceHealth::Healthy
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingestion::{channel_ticker, ChannelTicker};

    fn registrable<S: Service + 'static>() {}

    #[test]
    fn ingestion_service_is_registrable() {
        registrable::<IngestionService>();
        // any tick source can back the service
        fn boxed(ticker: ChannelTicker) -> Box<dyn Ticker> {
            Box::new(ticker)
        }
        let (_ticks, ticker) = channel_ticker(1);
        let _ = boxed(ticker);
    }
}
