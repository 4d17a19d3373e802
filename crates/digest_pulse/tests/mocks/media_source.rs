use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex},
    time::Duration,
};

use digest_datastore::{Channel, VideoTask};
use digest_pulse::{
    criteria::DurationBounds,
    yt::{MediaHandle, MediaSource},
};

use super::Gauge;

#[derive(Clone, Default)]
pub struct MockMediaSource {
    pub videos: HashMap<String, Vec<VideoTask>>,
    pub list_calls: Arc<Mutex<Vec<String>>>,
    pub fetch_calls: Arc<Mutex<Vec<String>>>,
    pub failing_channels: HashSet<String>,
    pub failing_videos: HashSet<String>,
    pub fetch_delays: HashMap<String, Duration>,
    pub gauge: Gauge,
}

impl MockMediaSource {
    pub fn with_videos(mut self, channel: &Channel, videos: Vec<VideoTask>) -> Self {
        self.videos.insert(channel.id.clone(), videos);
        self
    }

    pub fn failing_listing(mut self, channel_id: &str) -> Self {
        self.failing_channels.insert(channel_id.to_string());
        self
    }

    pub fn failing_fetch(mut self, video_id: &str) -> Self {
        self.failing_videos.insert(video_id.to_string());
        self
    }

    pub fn with_fetch_delay(mut self, video_id: &str, delay: Duration) -> Self {
        self.fetch_delays.insert(video_id.to_string(), delay);
        self
    }

    pub fn fetched(&self) -> Vec<String> {
        self.fetch_calls.lock().unwrap().clone()
    }
}

impl MediaSource for MockMediaSource {
    type Error = anyhow::Error;

    async fn list_recent(
        &self,
        channel: &Channel,
        cap: usize,
        _bounds: DurationBounds,
    ) -> anyhow::Result<Vec<VideoTask>> {
        self.list_calls.lock().unwrap().push(channel.id.clone());

        if self.failing_channels.contains(&channel.id) {
            return Err(anyhow::anyhow!("quota exceeded for {}", channel.id));
        }
        Ok(self
            .videos
            .get(&channel.id)
            .map(|videos| videos.iter().take(cap).cloned().collect())
            .unwrap_or_default())
    }

    async fn fetch(&self, task: &VideoTask) -> anyhow::Result<MediaHandle> {
        let _guard = self.gauge.enter();
        self.fetch_calls.lock().unwrap().push(task.video_id.clone());

        if let Some(delay) = self.fetch_delays.get(&task.video_id) {
            tokio::time::sleep(*delay).await;
        }
        if self.failing_videos.contains(&task.video_id) {
            return Err(anyhow::anyhow!("yt-dlp download failed"));
        }
        Ok(MediaHandle::fetched(format!("/tmp/mock/{}.m4a", task.video_id)))
    }
}
