//! Application-level configuration sourced from the environment.

use std::{env, time::Duration};

use tracing::warn;

/// Hard ceiling on a session critical section (load, burn, reduce, persist).
const DEFAULT_ACTION_DEADLINE_SECS: u64 = 10;
/// Default activity window for the live-session listing.
const DEFAULT_LIVE_WINDOW_MINUTES: u64 = 120;
const DEFAULT_PUBLIC_BASE_URL: &str = "http://localhost:8080";

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Base URL used when handing links (e.g. stream URLs) back to owners.
    pub public_base_url: String,
    /// Deadline on a session's serialized critical section.
    pub action_deadline: Duration,
    /// Default `minutes` window for the live listing.
    pub live_window_minutes: u64,
}

impl AppConfig {
    /// Load the configuration from the environment, falling back to
    /// defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        let public_base_url = env::var("PUBLIC_BASE_URL")
            .ok()
            .map(|url| url.trim_end_matches('/').to_owned())
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| DEFAULT_PUBLIC_BASE_URL.to_owned());

        let action_deadline = Duration::from_secs(parse_env_u64(
            "ACTION_DEADLINE_SECS",
            DEFAULT_ACTION_DEADLINE_SECS,
        ));
        let live_window_minutes =
            parse_env_u64("LIVE_WINDOW_MINUTES", DEFAULT_LIVE_WINDOW_MINUTES);

        Self {
            public_base_url,
            action_deadline,
            live_window_minutes,
        }
    }

    /// Spectator stream URL for a session, rooted at the public base.
    pub fn stream_url(&self, session_key: &str) -> String {
        format!("{}/sessions/{}/stream", self.public_base_url, session_key)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            public_base_url: DEFAULT_PUBLIC_BASE_URL.to_owned(),
            action_deadline: Duration::from_secs(DEFAULT_ACTION_DEADLINE_SECS),
            live_window_minutes: DEFAULT_LIVE_WINDOW_MINUTES,
        }
    }
}

fn parse_env_u64(var: &str, default: u64) -> u64 {
    match env::var(var) {
        Ok(raw) => match raw.parse::<u64>() {
            Ok(value) if value > 0 => value,
            _ => {
                warn!(var, raw = %raw, "ignoring unparsable configuration value");
                default
            }
        },
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_url_joins_without_double_slash() {
        let config = AppConfig {
            public_base_url: "https://drafts.example".into(),
            ..AppConfig::default()
        };
        assert_eq!(
            config.stream_url("abc"),
            "https://drafts.example/sessions/abc/stream"
        );
    }
}
