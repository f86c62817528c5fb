use serde::Serialize;
use std::sync::Arc;

use super::model::{ConnectionConfig, ExperimentConfig, ExperimentFlag, UserContext};
use super::results::TestResultLog;
use super::theme::is_dark_theme;
use crate::sdk::ExperimentClient;

/// In-memory console state. Only ever touched while holding the console lock.
#[derive(Default)]
pub struct Session {
    pub connection: ConnectionConfig,
    pub is_initialized: bool,
    pub user_context: UserContext,
    pub draft_experiment: ExperimentConfig,
    pub experiment_config: Option<ExperimentConfig>,
    pub experiment: Option<Arc<dyn ExperimentClient>>,
    pub active_flags: Vec<ExperimentFlag>,
    pub results: TestResultLog,
    sends_in_flight: usize,
    fetches_in_flight: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub is_initialized: bool,
    pub connection: ConnectionConfig,
    pub user_context: UserContext,
    pub experiment_config: Option<ExperimentConfig>,
    pub active_flags: Vec<ExperimentFlag>,
    pub is_loading: bool,
    pub is_fetching_flags: bool,
    pub is_dark_theme: bool,
}

impl Session {
    pub fn restored(connection: ConnectionConfig, draft_experiment: ExperimentConfig) -> Self {
        Self {
            connection,
            draft_experiment,
            ..Self::default()
        }
    }

    pub fn is_loading(&self) -> bool {
        self.sends_in_flight > 0
    }

    pub fn is_fetching_flags(&self) -> bool {
        self.fetches_in_flight > 0
    }

    pub fn is_dark_theme(&self) -> bool {
        is_dark_theme(&self.user_context, &self.active_flags)
    }

    pub fn begin_send(&mut self) {
        self.sends_in_flight += 1;
    }

    pub fn end_send(&mut self) {
        self.sends_in_flight = self.sends_in_flight.saturating_sub(1);
    }

    pub fn begin_fetch(&mut self) {
        self.fetches_in_flight += 1;
    }

    pub fn end_fetch(&mut self) {
        self.fetches_in_flight = self.fetches_in_flight.saturating_sub(1);
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            is_initialized: self.is_initialized,
            connection: self.connection.clone(),
            user_context: self.user_context.clone(),
            experiment_config: self.experiment_config.clone(),
            active_flags: self.active_flags.clone(),
            is_loading: self.is_loading(),
            is_fetching_flags: self.is_fetching_flags(),
            is_dark_theme: self.is_dark_theme(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_in_flight_counters() {
        let mut session = Session::default();
        session.begin_send();
        session.begin_send();
        session.end_send();
        assert!(session.is_loading());
        session.end_send();
        session.end_send();
        assert!(!session.is_loading());

        session.begin_fetch();
        assert!(session.view().is_fetching_flags);
        session.end_fetch();
        assert!(!session.view().is_fetching_flags);
    }

    #[test]
    fn test_view_tracks_theme_inputs() {
        let mut session = Session::default();
        assert!(!session.view().is_dark_theme);

        session.user_context.user_properties.insert("theme_preference".to_string(), json!("dark"));
        assert!(session.view().is_dark_theme);

        session.user_context.user_properties.clear();
        session.active_flags.push(ExperimentFlag {
            key: "theme-test".to_string(),
            variant: "treatment".to_string(),
            payload: Some(json!({"theme": "dark"})),
            metadata: None,
        });
        assert!(session.view().is_dark_theme);
    }
}
