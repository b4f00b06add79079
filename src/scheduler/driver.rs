use crate::config::TestbedConfig;
use async_trait::async_trait;
use std::time::Duration;

/// Where the scheduler hands control back to the host between steps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Suspension {
    /// Resume on the host's next tick
    NextTick,
    /// Resume once the duration has passed
    Delay(Duration),
}

/// The host's two suspension primitives
#[async_trait]
pub trait TickDriver: Send + Sync {
    /// Resume on the next host tick
    async fn next_tick(&self);

    /// Resume after `duration`
    async fn wait(&self, duration: Duration);

    async fn suspend(&self, suspension: Suspension) {
        match suspension {
            Suspension::NextTick => self.next_tick().await,
            Suspension::Delay(duration) => self.wait(duration).await,
        }
    }
}

/// Tick driver backed by `tokio::time`
#[derive(Debug, Clone, Copy)]
pub struct TokioTickDriver {
    tick: Duration,
}

impl TokioTickDriver {
    /// A zero tick yields to the runtime instead of sleeping
    pub fn new(tick: Duration) -> Self {
        Self { tick }
    }

    pub fn from_config(config: &TestbedConfig) -> Self {
        Self::new(config.tick_interval())
    }

    pub fn tick(&self) -> Duration {
        self.tick
    }
}

impl Default for TokioTickDriver {
    fn default() -> Self {
        Self::from_config(&TestbedConfig::default())
    }
}

#[async_trait]
impl TickDriver for TokioTickDriver {
    async fn next_tick(&self) {
        if self.tick.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(self.tick).await;
        }
    }

    async fn wait(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_tokio_driver_advances_virtual_time() {
        let driver = TokioTickDriver::new(Duration::from_millis(16));
        let start = tokio::time::Instant::now();

        driver.next_tick().await;
        assert!(start.elapsed() >= Duration::from_millis(16));

        driver.suspend(Suspension::Delay(Duration::from_secs(1))).await;
        assert!(start.elapsed() >= Duration::from_millis(1016));
    }

    #[test]
    fn test_driver_from_config() {
        let driver = TokioTickDriver::default();
        assert_eq!(driver.tick(), Duration::from_millis(16));
    }
}
