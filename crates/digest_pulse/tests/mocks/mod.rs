#![allow(dead_code)]

pub mod channel_source;
pub mod datastore;
pub mod media_source;
pub mod notifier;
pub mod summarizer;
pub mod text_source;

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use digest_datastore::{Channel, VideoTask};

pub fn channel(id: &str, relevance: f64) -> Channel {
    Channel {
        id: id.to_string(),
        title: format!("Channel {id}"),
        description: format!("Crypto coverage by {id}"),
        relevance,
    }
}

pub fn video(channel: &Channel, video_id: &str) -> VideoTask {
    VideoTask {
        channel_id: channel.id.clone(),
        channel_title: channel.title.clone(),
        video_id: video_id.to_string(),
        title: format!("Video {video_id}"),
        published_at: None,
        duration_secs: 600,
    }
}

/// Counts concurrent entries into a mock call
#[derive(Clone, Default)]
pub struct Gauge {
    current: Arc<AtomicUsize>,
    max: Arc<AtomicUsize>,
}

impl Gauge {
    pub fn enter(&self) -> GaugeGuard {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.max.fetch_max(now, Ordering::SeqCst);
        GaugeGuard(self.current.clone())
    }

    pub fn max(&self) -> usize {
        self.max.load(Ordering::SeqCst)
    }
}

pub struct GaugeGuard(Arc<AtomicUsize>);

impl Drop for GaugeGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}
