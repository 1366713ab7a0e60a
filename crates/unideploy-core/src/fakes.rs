//! In-memory fakes for the network seams (testing only)
//!
//! `StaticMetadata` answers repository lookups without HTTP and counts
//! them; `RecordingTrigger` captures every pipeline it is asked to send.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::descriptor::Pipeline;
use crate::env::RepoSlug;
use crate::error::{DeployError, Result};
use crate::github::RepoMetadata;
use crate::trigger::{BuildTrigger, TriggerOutcome};

// ---------------------------------------------------------------------------
// StaticMetadata
// ---------------------------------------------------------------------------

/// Repository metadata with a fixed description.
#[derive(Debug)]
pub struct StaticMetadata {
    description: String,
    calls: AtomicUsize,
}

impl StaticMetadata {
    pub fn new(description: &str) -> Self {
        Self {
            description: description.to_string(),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of lookups served so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RepoMetadata for StaticMetadata {
    async fn description(&self, _slug: &RepoSlug) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.description.clone())
    }
}

// ---------------------------------------------------------------------------
// RecordingTrigger
// ---------------------------------------------------------------------------

/// Trigger that records requests and answers with a canned status.
#[derive(Debug)]
pub struct RecordingTrigger {
    status: u16,
    sent: Mutex<Vec<(String, Pipeline)>>,
}

impl RecordingTrigger {
    /// Answer every request with `status`, mapped like the real client.
    pub fn with_status(status: u16) -> Self {
        Self {
            status,
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn accepting() -> Self {
        Self::with_status(202)
    }

    /// `(token, pipeline)` pairs received so far.
    pub fn sent(&self) -> Vec<(String, Pipeline)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl BuildTrigger for RecordingTrigger {
    async fn trigger(&self, token: &str, pipeline: &Pipeline) -> Result<TriggerOutcome> {
        self.sent
            .lock()
            .unwrap()
            .push((token.to_string(), pipeline.clone()));

        match self.status {
            202 => Ok(TriggerOutcome::Accepted),
            status @ 200..=299 => Ok(TriggerOutcome::Unaccepted { status }),
            status => Err(DeployError::Http {
                status,
                url: "memory://trigger".to_string(),
                history: Vec::new(),
            }),
        }
    }
}
