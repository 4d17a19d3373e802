use std::sync::{Arc, Mutex};

use digest_pulse::{outcome::RunResult, Notifier};

#[derive(Clone, Default)]
pub struct MockNotifier {
    pub delivered: Arc<Mutex<Vec<RunResult>>>,
    pub fail_with: Option<String>,
}

impl MockNotifier {
    pub fn failing(msg: &str) -> Self {
        Self {
            fail_with: Some(msg.to_string()),
            ..Default::default()
        }
    }
}

impl Notifier for MockNotifier {
    type Error = anyhow::Error;

    async fn deliver(&self, result: &RunResult) -> anyhow::Result<()> {
        if let Some(ref msg) = self.fail_with {
            return Err(anyhow::anyhow!("{}", msg));
        }
        self.delivered.lock().unwrap().push(result.clone());
        Ok(())
    }
}
