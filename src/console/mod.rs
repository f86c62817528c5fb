//! The console's session state and the actions a tester can take on it.

pub mod error;
pub mod model;
pub mod pipeline;
pub mod resolution;
pub mod results;
pub mod session;
pub mod theme;
pub mod tracking;

use rand::Rng;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::sdk::{AnalyticsSdk, ExperimentOptions, ExperimentProvider};
use crate::store::ConfigStore;
pub use error::{ConsoleError, ConsoleResult};
use model::{
    AnalyticsEvent, ConnectionConfig, Environment, ExperimentConfig, ExperimentFlag, ManualVariant,
    TestResult, UserContext,
};
use pipeline::SendSnapshot;
use results::ResultSummary;
use session::{Session, SessionView};
use tracking::Tracker;

pub struct Console {
    session: Mutex<Session>,
    analytics: Arc<dyn AnalyticsSdk>,
    experiments: Arc<dyn ExperimentProvider>,
    store: ConfigStore,
    tracker: Tracker,
}

impl Console {
    /// Build a console pre-filled with whatever settings were saved last time.
    pub async fn restore(
        analytics: Arc<dyn AnalyticsSdk>,
        experiments: Arc<dyn ExperimentProvider>,
        store: ConfigStore,
    ) -> Self {
        let connection = store.load_connection().await;
        let draft = store.load_experiment().await;

        Self {
            session: Mutex::new(Session::restored(connection, draft)),
            analytics,
            experiments,
            store,
            tracker: Tracker::default(),
        }
    }

    pub fn store_backend(&self) -> &'static str {
        self.store.backend()
    }

    pub async fn view(&self) -> SessionView {
        self.session.lock().await.view()
    }

    pub async fn is_dark_theme(&self) -> bool {
        self.session.lock().await.is_dark_theme()
    }

    // CONNECTION

    pub async fn connection(&self) -> ConnectionConfig {
        self.session.lock().await.connection.clone()
    }

    /// Apply and persist connection settings, then bind the analytics SDK.
    pub async fn update_connection(&self, config: ConnectionConfig) -> ConsoleResult<()> {
        {
            let mut session = self.session.lock().await;
            session.connection = config.clone();
            session.user_context.user_id = config.user_id.clone();
            session.user_context.device_id = config.device_id.clone();
        }
        self.store.save_connection(&config).await;

        match self.analytics.init(&config.api_key, &config.user_id).await {
            Ok(()) => {
                self.session.lock().await.is_initialized = true;
                tracing::info!(user_id = %config.user_id, "analytics SDK initialized");
                Ok(())
            }
            Err(e) => {
                tracing::warn!("failed to initialize analytics SDK: {}", e);
                Err(ConsoleError::SdkInit(e))
            }
        }
    }

    /// Forget the connection settings and unbind the analytics SDK.
    pub async fn clear_connection(&self) -> ConnectionConfig {
        let cleared = self.store.clear_connection().await;
        self.analytics.reset().await;
        {
            let mut session = self.session.lock().await;
            session.connection = cleared.clone();
            session.is_initialized = false;
        }
        tracing::info!("connection cleared");
        cleared
    }

    // EXPERIMENT DRAFT

    pub async fn experiment_draft(&self) -> ExperimentConfig {
        self.session.lock().await.draft_experiment.clone()
    }

    pub async fn edit_experiment_draft(
        &self,
        deployment_key: Option<String>,
        server_url: Option<String>,
        environment: Option<Environment>,
    ) -> ExperimentConfig {
        let mut session = self.session.lock().await;
        let draft = &mut session.draft_experiment;
        if let Some(key) = deployment_key {
            draft.deployment_key = key;
        }
        if let Some(url) = server_url {
            draft.server_url = url;
        }
        if let Some(env) = environment {
            draft.environment = env;
        }
        draft.clone()
    }

    pub async fn add_flag_key(&self, key: &str) -> bool {
        self.session.lock().await.draft_experiment.flag_keys.insert(key)
    }

    pub async fn remove_flag_key(&self, key: &str) -> bool {
        self.session.lock().await.draft_experiment.flag_keys.remove(key)
    }

    pub async fn reset_experiment_draft(&self) -> ExperimentConfig {
        let cleared = self.store.clear_experiment().await;
        self.session.lock().await.draft_experiment = cleared.clone();
        cleared
    }

    /// Start an experiment client for the draft and resolve its flags.
    pub async fn configure_experiment(&self) -> ConsoleResult<Vec<ExperimentFlag>> {
        let (config, context) = {
            let session = self.session.lock().await;
            if !session.is_initialized {
                return Err(ConsoleError::NotInitialized);
            }
            let config = session.draft_experiment.clone();
            config.validate().map_err(ConsoleError::InvalidInput)?;
            (config, session.user_context.clone())
        };

        let client = self
            .experiments
            .initialize(&config.deployment_key, ExperimentOptions::new(&config.server_url))
            .map_err(ConsoleError::ExperimentInit)?;
        client.set_user(&context);
        if let Err(e) = client.start().await {
            tracing::warn!("failed to start experiment client: {}", e);
            return Err(ConsoleError::ExperimentInit(e));
        }

        {
            let mut session = self.session.lock().await;
            session.experiment = Some(client);
            session.experiment_config = Some(config.clone());
        }
        self.store.save_experiment(&config).await;
        tracing::info!(
            flags = config.flag_keys.len(),
            environment = ?config.environment,
            "experiment configured"
        );

        self.refresh_flags().await
    }

    // USER CONTEXT

    /// Replace the user context wholesale and re-resolve flags for it. A failed
    /// re-resolution keeps the new context and the previous `activeFlags`.
    pub async fn update_user_context(&self, context: UserContext) -> ConsoleResult<UserContext> {
        let client = {
            let mut session = self.session.lock().await;
            session.user_context = context.clone();
            session.experiment.clone()
        };

        if let Some(client) = client {
            client.set_user(&context);
            if let Err(e) = self.refresh_flags().await {
                tracing::warn!(user_id = %context.user_id, "flags kept after context update: {}", e);
            }
        }
        Ok(context)
    }

    /// Swap in a fresh test identity, keeping properties and groups.
    pub async fn randomize_user(&self) -> ConsoleResult<UserContext> {
        let (user_id, device_id) = random_identity();
        let mut context = self.session.lock().await.user_context.clone();
        context.user_id = user_id;
        context.device_id = device_id;
        self.update_user_context(context).await
    }

    // FLAGS

    /// Re-resolve every configured flag key. `activeFlags` is replaced in one
    /// step or left alone when the server cannot be reached.
    pub async fn refresh_flags(&self) -> ConsoleResult<Vec<ExperimentFlag>> {
        let (client, flag_keys) = {
            let mut session = self.session.lock().await;
            let (Some(client), Some(config)) = (session.experiment.clone(), &session.experiment_config)
            else {
                return Err(ConsoleError::NoExperiment);
            };
            let flag_keys = config.flag_keys.clone();
            session.begin_fetch();
            (client, flag_keys)
        };

        let fetched = client.all().await;

        let mut session = self.session.lock().await;
        session.end_fetch();
        let variants = fetched.map_err(|e| {
            tracing::warn!("failed to fetch variants: {}", e);
            ConsoleError::Resolution(e)
        })?;

        let flags = resolution::resolve(flag_keys.iter(), &variants);
        session.active_flags = flags.clone();
        tracing::debug!(count = flags.len(), "flags resolved");

        if session.is_initialized {
            for flag in &flags {
                let event = resolution::exposure_event(flag, &session.user_context);
                self.tracker.spawn(self.analytics.clone(), event);
            }
        }
        Ok(flags)
    }

    /// Pin a flag to a variant without asking the experimentation server.
    pub async fn assign_variant(
        &self,
        key: &str,
        variant: ManualVariant,
    ) -> ConsoleResult<ExperimentFlag> {
        let mut session = self.session.lock().await;
        if session.experiment_config.is_none() {
            return Err(ConsoleError::NoExperiment);
        }

        let (outcome, flag) = resolution::manual_assign(&mut session.active_flags, key, variant);
        tracing::info!(flag = key, variant = variant.as_str(), ?outcome, "manual assignment");

        if session.is_initialized {
            let event = resolution::assignment_event(key, variant, &session.user_context);
            self.tracker.spawn(self.analytics.clone(), event);
        }

        Ok(flag)
    }

    // EVENTS

    /// Send one event and record the outcome. Transmission failures come back
    /// as a failed `TestResult`, not as an error.
    pub async fn send_event(&self, draft: AnalyticsEvent) -> ConsoleResult<TestResult> {
        let (payload, snapshot) = {
            let mut session = self.session.lock().await;
            if session.connection.api_key.trim().is_empty() {
                return Err(ConsoleError::MissingApiKey);
            }

            let event = pipeline::assemble(draft, &session.user_context, &session.active_flags);
            let snapshot = SendSnapshot {
                event: event.clone(),
                flags: session.active_flags.clone(),
                context: session.user_context.clone(),
            };
            let payload = pipeline::wrap(&session.connection.api_key, event);
            session.begin_send();
            (payload, snapshot)
        };

        let outcome = self.analytics.dispatch(&payload).await;
        let result = snapshot.into_result(chrono::Utc::now().timestamp_millis(), outcome);

        let mut session = self.session.lock().await;
        session.end_send();
        session.results.record(result.clone());

        if result.success {
            tracing::info!(event_type = %result.event.event_type, "event sent");
        } else {
            tracing::warn!(
                event_type = %result.event.event_type,
                error = result.error.as_deref().unwrap_or_default(),
                "event send failed"
            );
        }
        Ok(result)
    }

    pub async fn results(&self) -> (Vec<TestResult>, ResultSummary) {
        let session = self.session.lock().await;
        (session.results.snapshot(), session.results.summary())
    }

    pub async fn clear_results(&self) {
        let mut session = self.session.lock().await;
        if !session.results.is_empty() {
            tracing::info!(count = session.results.len(), "test results cleared");
        }
        session.results.clear();
    }

    /// Wait for outstanding exposure/assignment deliveries.
    pub async fn flush_tracking(&self) {
        self.tracker.flush().await;
    }
}

fn random_identity() -> (String, String) {
    let mut rng = rand::thread_rng();
    (
        format!("test-user-{}", rng.gen_range(0..10000)),
        format!("device-{}", rng.gen_range(0..10000)),
    )
}
