use std::path::PathBuf;
use std::time::Duration;

use editor::PlaytestConfig;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const TEMPLATE_ENV_VAR: &str = "EPICENDERS_TEMPLATE";
const PLAYTEST_SECONDS_ENV_VAR: &str = "EPICENDERS_PLAYTEST_SECONDS";
const SCRIPT_ENV_VAR: &str = "EPICENDERS_SCRIPT";
const DEFAULT_PLAYTEST_SECONDS: u64 = 5;

#[derive(Debug, Clone)]
pub(crate) struct SessionConfig {
    pub(crate) template_id: Option<String>,
    pub(crate) script_path: Option<PathBuf>,
    pub(crate) playtest_duration: Duration,
    pub(crate) playtest: PlaytestConfig,
    pub(crate) metrics_log_interval: Duration,
}

pub(crate) struct AppWiring {
    pub(crate) config: SessionConfig,
}

pub(crate) fn build_app() -> AppWiring {
    init_tracing();
    info!("=== Epicenders Studio Startup ===");

    let config = SessionConfig {
        template_id: std::env::var(TEMPLATE_ENV_VAR).ok().filter(|v| !v.is_empty()),
        script_path: std::env::var(SCRIPT_ENV_VAR)
            .ok()
            .filter(|v| !v.is_empty())
            .map(PathBuf::from),
        playtest_duration: Duration::from_secs(parse_playtest_seconds_from_env()),
        playtest: PlaytestConfig::default(),
        metrics_log_interval: Duration::from_secs(1),
    };

    AppWiring { config }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

fn parse_playtest_seconds_from_env() -> u64 {
    match std::env::var(PLAYTEST_SECONDS_ENV_VAR) {
        Ok(value) => match value.parse::<u64>() {
            Ok(seconds) => seconds,
            Err(_) => {
                warn!(
                    env_var = PLAYTEST_SECONDS_ENV_VAR,
                    value = value.as_str(),
                    fallback_seconds = DEFAULT_PLAYTEST_SECONDS,
                    "invalid playtest duration env var; falling back to default"
                );
                DEFAULT_PLAYTEST_SECONDS
            }
        },
        Err(_) => DEFAULT_PLAYTEST_SECONDS,
    }
}
