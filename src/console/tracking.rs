use std::sync::{Arc, Mutex};
use tokio::task::JoinSet;

use super::model::AnalyticsEvent;
use crate::sdk::AnalyticsSdk;

/// Background delivery of exposure/assignment events. Callers never wait on
/// or hear about a tracking failure.
#[derive(Default)]
pub struct Tracker {
    tasks: Mutex<JoinSet<()>>,
}

impl Tracker {
    pub fn spawn(&self, analytics: Arc<dyn AnalyticsSdk>, event: AnalyticsEvent) {
        let task = async move {
            let event_type = event.event_type.clone();
            if let Err(e) = analytics.track(event).await {
                tracing::warn!(event_type = %event_type, "tracking event dropped: {}", e);
            }
        };

        if let Ok(mut tasks) = self.tasks.lock() {
            // reap finished tasks so the set does not grow without bound
            while tasks.try_join_next().is_some() {}
            tasks.spawn(task);
        }
    }

    /// Wait for every tracking task spawned so far.
    pub async fn flush(&self) {
        let mut pending = match self.tasks.lock() {
            Ok(mut tasks) => std::mem::take(&mut *tasks),
            Err(_) => return,
        };

        while let Some(joined) = pending.join_next().await {
            if let Err(e) = joined {
                tracing::warn!("tracking task panicked: {}", e);
            }
        }
    }
}
