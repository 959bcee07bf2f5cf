#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use action_flow::{FlowError, Platform, PlaybackReport, PlaybackState};
use agent_core::{ArgumentRecord, Step};
use async_trait::async_trait;
use sockpuppet_core_types::{AgentId, ContentItem};

fn items(ids: &[String]) -> Vec<ContentItem> {
    ids.iter().map(|id| ContentItem::from_id(id.as_str())).collect()
}

fn strings(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|id| id.to_string()).collect()
}

#[derive(Default)]
struct Calls {
    watched: Vec<String>,
    attempted: Vec<String>,
    channels: Vec<String>,
    last: Option<String>,
    closed: bool,
}

/// Scripted platform: fixed listings, recommendations keyed by the last
/// watched id, and a set of unavailable ids.
#[derive(Default)]
pub struct MockPlatform {
    homepage: Vec<String>,
    search: Vec<String>,
    recommendations: HashMap<String, Vec<String>>,
    channels: HashMap<String, Vec<String>>,
    unavailable: HashSet<String>,
    broken_channels: HashSet<String>,
    lose_session_on_search: bool,
    calls: Mutex<Calls>,
}

impl MockPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn homepage(mut self, ids: &[&str]) -> Self {
        self.homepage = strings(ids);
        self
    }

    pub fn search_results(mut self, ids: &[&str]) -> Self {
        self.search = strings(ids);
        self
    }

    pub fn recommends(mut self, after: &str, ids: &[&str]) -> Self {
        self.recommendations.insert(after.to_string(), strings(ids));
        self
    }

    pub fn channel(mut self, handle: &str, ids: &[&str]) -> Self {
        self.channels.insert(handle.to_string(), strings(ids));
        self
    }

    pub fn broken_channel(mut self, handle: &str) -> Self {
        self.broken_channels.insert(handle.to_string());
        self
    }

    pub fn unavailable(mut self, ids: &[&str]) -> Self {
        self.unavailable.extend(strings(ids));
        self
    }

    pub fn losing_session_on_search(mut self) -> Self {
        self.lose_session_on_search = true;
        self
    }

    pub fn watched(&self) -> Vec<String> {
        self.calls.lock().unwrap().watched.clone()
    }

    pub fn attempted(&self) -> Vec<String> {
        self.calls.lock().unwrap().attempted.clone()
    }

    pub fn visited_channels(&self) -> Vec<String> {
        self.calls.lock().unwrap().channels.clone()
    }

    pub fn closed(&self) -> bool {
        self.calls.lock().unwrap().closed
    }
}

#[async_trait]
impl Platform for MockPlatform {
    async fn homepage(&self) -> Result<Vec<ContentItem>, FlowError> {
        Ok(items(&self.homepage))
    }

    async fn up_next(&self, limit: usize) -> Result<Vec<ContentItem>, FlowError> {
        let last = self.calls.lock().unwrap().last.clone();
        let ids = last
            .and_then(|id| self.recommendations.get(&id).cloned())
            .unwrap_or_default();
        Ok(items(&ids).into_iter().take(limit).collect())
    }

    async fn search(&self, query: &str, _limit: usize) -> Result<Vec<ContentItem>, FlowError> {
        if self.lose_session_on_search {
            return Err(FlowError::SessionLost(format!("browser gone during '{query}'")));
        }
        // Unbounded, whatever the limit.
        Ok(items(&self.search))
    }

    async fn channel_popular(&self, handle: &str) -> Result<Vec<ContentItem>, FlowError> {
        self.calls.lock().unwrap().channels.push(handle.to_string());
        if self.broken_channels.contains(handle) {
            return Err(FlowError::Navigation(format!("{handle} did not load")));
        }
        Ok(items(self.channels.get(handle).map(Vec::as_slice).unwrap_or(&[])))
    }

    async fn watch(
        &self,
        item: &ContentItem,
        duration: Duration,
    ) -> Result<PlaybackReport, FlowError> {
        let mut calls = self.calls.lock().unwrap();
        calls.attempted.push(item.id.to_string());
        calls.last = Some(item.id.to_string());
        if self.unavailable.contains(item.id.as_str()) {
            return Err(FlowError::unavailable(&item.id, "video removed"));
        }
        calls.watched.push(item.id.to_string());

        let mut report = PlaybackReport::new(item.id.clone());
        report.visited = vec![PlaybackState::Holding, PlaybackState::Done];
        report.held = duration;
        Ok(report)
    }

    async fn close(&self) {
        self.calls.lock().unwrap().closed = true;
    }
}

pub fn args(steps: &[Step]) -> ArgumentRecord {
    ArgumentRecord::new(AgentId::new("Left,seed,0000abcd"), "/unused", steps)
}
