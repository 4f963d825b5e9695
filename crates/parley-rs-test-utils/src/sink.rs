use async_trait::async_trait;
use parking_lot::Mutex;
use parley_rs_protocol::{ReplySink, SendError};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub channel_id: String,
    pub text: String,
}

/// Records every send attempt; optionally rejects all of them.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    sent: Arc<Mutex<Vec<SentMessage>>>,
    reject: bool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sink that records attempts but fails each one.
    pub fn rejecting() -> Self {
        Self {
            sent: Arc::default(),
            reject: true,
        }
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.sent.lock().iter().map(|sent| sent.text.clone()).collect()
    }
}

#[async_trait]
impl ReplySink for RecordingSink {
    async fn send(&self, channel_id: &str, text: &str) -> Result<(), SendError> {
        self.sent.lock().push(SentMessage {
            channel_id: channel_id.to_string(),
            text: text.to_string(),
        });
        if self.reject {
            return Err(SendError::Rejected("sink rejects all messages".to_string()));
        }
        Ok(())
    }
}
