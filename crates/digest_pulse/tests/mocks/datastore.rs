use std::{
    collections::HashMap,
    path::PathBuf,
    sync::{Arc, Mutex},
};

use digest_datastore::{DataStore, Transcript, VideoTask};

#[derive(Clone, Default)]
pub struct MockDataStore {
    pub transcripts: Arc<Mutex<HashMap<String, Transcript>>>,
    pub summaries: Arc<Mutex<Vec<(String, String)>>>,
    pub reports: Arc<Mutex<Vec<String>>>,
    pub fail_with: Option<String>,
}

impl MockDataStore {
    pub fn failing(msg: &str) -> Self {
        Self {
            fail_with: Some(msg.to_string()),
            ..Default::default()
        }
    }

    pub fn with_transcript(self, transcript: Transcript) -> Self {
        self.transcripts
            .lock()
            .unwrap()
            .insert(transcript.video_id.clone(), transcript);
        self
    }

    fn check(&self) -> anyhow::Result<()> {
        match self.fail_with {
            Some(ref msg) => Err(anyhow::anyhow!("{}", msg)),
            None => Ok(()),
        }
    }
}

impl DataStore for MockDataStore {
    async fn load_transcript(&self, task: &VideoTask) -> anyhow::Result<Option<Transcript>> {
        self.check()?;
        Ok(self.transcripts.lock().unwrap().get(&task.video_id).cloned())
    }

    async fn save_transcript(
        &self,
        task: &VideoTask,
        transcript: &Transcript,
    ) -> anyhow::Result<PathBuf> {
        self.check()?;
        self.transcripts
            .lock()
            .unwrap()
            .insert(task.video_id.clone(), transcript.clone());
        Ok(PathBuf::from(format!("/tmp/mock/{}_transcript.txt", task.video_id)))
    }

    async fn save_summary(&self, task: &VideoTask, summary: &str) -> anyhow::Result<PathBuf> {
        self.check()?;
        self.summaries
            .lock()
            .unwrap()
            .push((task.video_id.clone(), summary.to_string()));
        Ok(PathBuf::from(format!("/tmp/mock/{}_summary.txt", task.video_id)))
    }

    async fn save_report(&self, file_name: &str, _contents: &str) -> anyhow::Result<PathBuf> {
        self.check()?;
        self.reports.lock().unwrap().push(file_name.to_string());
        Ok(PathBuf::from(format!("/tmp/mock/{file_name}")))
    }
}
