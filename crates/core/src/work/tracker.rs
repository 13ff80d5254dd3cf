//! Live view of in-flight work items.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;

use super::types::{Identifier, WorkState};

/// An item currently owned by a pipeline.
#[derive(Debug, Clone, Serialize)]
pub struct ActiveItem {
    pub identifier: Identifier,
    pub state: WorkState,
    /// Download progress, when downloading.
    pub progress_percent: Option<f32>,
    /// When the item entered its current state.
    pub since: DateTime<Utc>,
}

/// Shared map of active items, written by pipelines and read by the
/// status endpoint.
#[derive(Debug, Clone, Default)]
pub struct StateTracker {
    active: Arc<RwLock<HashMap<Identifier, ActiveItem>>>,
}

impl StateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_state(&self, identifier: Identifier, state: WorkState) {
        let mut active = self.active.write().await;
        let entry = active.entry(identifier).or_insert_with(|| ActiveItem {
            identifier,
            state,
            progress_percent: None,
            since: Utc::now(),
        });
        if entry.state != state {
            entry.state = state;
            entry.since = Utc::now();
        }
    }

    pub async fn set_progress(&self, identifier: Identifier, percent: f32) {
        if let Some(item) = self.active.write().await.get_mut(&identifier) {
            item.progress_percent = Some(percent);
        }
    }

    pub async fn remove(&self, identifier: Identifier) {
        self.active.write().await.remove(&identifier);
    }

    pub async fn get(&self, identifier: Identifier) -> Option<ActiveItem> {
        self.active.read().await.get(&identifier).cloned()
    }

    /// Active items in ascending identifier order.
    pub async fn snapshot(&self) -> Vec<ActiveItem> {
        let mut items: Vec<_> = self.active.read().await.values().cloned().collect();
        items.sort_by_key(|i| i.identifier);
        items
    }

    pub async fn len(&self) -> usize {
        self.active.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.active.read().await.is_empty()
    }
}
