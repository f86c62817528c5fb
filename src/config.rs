use serde::Deserialize;
use dotenvy::dotenv;
use std::env;

pub const DEFAULT_ANALYTICS_ENDPOINT: &str = "https://api2.amplitude.com/2/httpapi";
pub const DEFAULT_EXPERIMENT_SERVER_URL: &str = "https://api.lab.amplitude.com";

/// Where flag variants come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlagSource {
    /// Ask the experimentation server for every resolution
    Remote,
    /// Never query anything; every flag resolves to "control"
    Stub,
}

impl FlagSource {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "remote" => Some(FlagSource::Remote),
            "stub" => Some(FlagSource::Stub),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    pub database_url: Option<String>,
    pub analytics_endpoint: String,
    pub experiment_server_url: String,
    pub flag_source: FlagSource,
}

impl Config {
    pub fn from_env() -> Self {
        let _ = dotenv().is_ok();

        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .expect("PORT must be a valid u16 number");

        let database_url = env::var("DATABASE_URL").ok().filter(|url| !url.trim().is_empty());

        let analytics_endpoint = env::var("ANALYTICS_ENDPOINT")
            .unwrap_or_else(|_| DEFAULT_ANALYTICS_ENDPOINT.to_string());

        let experiment_server_url = env::var("EXPERIMENT_SERVER_URL")
            .unwrap_or_else(|_| DEFAULT_EXPERIMENT_SERVER_URL.to_string());

        let flag_source = match env::var("FLAG_SOURCE") {
            Ok(raw) => FlagSource::parse(&raw).unwrap_or_else(|| {
                tracing::warn!("FLAG_SOURCE '{}' is not one of remote|stub, using remote", raw);
                FlagSource::Remote
            }),
            Err(_) => FlagSource::Remote,
        };

        Self {
            port,
            database_url,
            analytics_endpoint,
            experiment_server_url,
            flag_source,
        }
    }

    pub fn addr(&self) -> String {
        format!("127.0.0.1:{}", self.port)
    }
}
