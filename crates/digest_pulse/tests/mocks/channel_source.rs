use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use digest_datastore::Channel;
use digest_pulse::yt::ChannelSource;

use super::Gauge;

#[derive(Clone)]
pub struct MockChannelSource {
    pub channels: Vec<Channel>,
    pub calls: Arc<Mutex<Vec<Vec<String>>>>,
    pub fail_with: Option<String>,
    pub delay: Duration,
    pub gauge: Gauge,
}

impl MockChannelSource {
    pub fn new(channels: Vec<Channel>) -> Self {
        Self {
            channels,
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_with: None,
            delay: Duration::ZERO,
            gauge: Gauge::default(),
        }
    }

    pub fn failing(msg: &str) -> Self {
        Self {
            fail_with: Some(msg.to_string()),
            ..Self::new(Vec::new())
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

impl ChannelSource for MockChannelSource {
    type Error = anyhow::Error;

    async fn discover(&self, queries: &[String]) -> anyhow::Result<Vec<Channel>> {
        let _guard = self.gauge.enter();
        self.calls.lock().unwrap().push(queries.to_vec());

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if let Some(ref msg) = self.fail_with {
            return Err(anyhow::anyhow!("{}", msg));
        }
        Ok(self.channels.clone())
    }
}
