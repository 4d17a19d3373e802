use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use digest_datastore::{Transcript, VideoTask};
use digest_pulse::yt::{MediaHandle, TextSource};

/// Records `(video_id, had_media_location)` for every call
#[derive(Clone)]
pub struct MockTextSource {
    pub default_text: Option<String>,
    pub overrides: HashMap<String, Option<String>>,
    pub calls: Arc<Mutex<Vec<(String, bool)>>>,
    pub fail_with: Option<String>,
}

impl MockTextSource {
    pub fn new(text: &str) -> Self {
        Self {
            default_text: Some(text.to_string()),
            overrides: HashMap::new(),
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_with: None,
        }
    }

    /// No video has a transcript
    pub fn absent() -> Self {
        Self {
            default_text: None,
            ..Self::new("")
        }
    }

    pub fn failing(msg: &str) -> Self {
        Self {
            fail_with: Some(msg.to_string()),
            ..Self::new("")
        }
    }

    pub fn with_transcript(mut self, video_id: &str, text: Option<&str>) -> Self {
        self.overrides
            .insert(video_id.to_string(), text.map(str::to_string));
        self
    }

    pub fn called_for(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(id, _)| id.clone())
            .collect()
    }
}

impl TextSource for MockTextSource {
    type Error = anyhow::Error;

    async fn extract(
        &self,
        task: &VideoTask,
        media: &MediaHandle,
    ) -> anyhow::Result<Option<Transcript>> {
        self.calls
            .lock()
            .unwrap()
            .push((task.video_id.clone(), media.location().is_some()));

        if let Some(ref msg) = self.fail_with {
            return Err(anyhow::anyhow!("{}", msg));
        }

        let text = self
            .overrides
            .get(&task.video_id)
            .cloned()
            .unwrap_or_else(|| self.default_text.clone());

        Ok(text.map(|text| Transcript::new(&task.video_id, text)))
    }
}
