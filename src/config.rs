use anyhow::{bail, Context, Result};
use std::env;
use std::net::SocketAddr;
use std::time::Duration;

const DEFAULT_BIND: &str = "0.0.0.0:3146";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmitMode {
    /// Queue the mutation and close immediately.
    #[default]
    FireAndForget,
    /// Wait for the backend and close only on success.
    Confirmed,
}

impl SubmitMode {
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "" | "fire_and_forget" => Ok(SubmitMode::FireAndForget),
            "confirmed" => Ok(SubmitMode::Confirmed),
            other => bail!(
                "Invalid SUBMIT_MODE '{}': expected fire_and_forget or confirmed",
                other
            ),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub graphql_url: String,
    pub bind: SocketAddr,
    pub submit_mode: SubmitMode,
    pub http_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let graphql_url = lookup("MOVIES_GRAPHQL_URL")
            .filter(|s| !s.trim().is_empty())
            .context("Missing required environment variable: MOVIES_GRAPHQL_URL")?;

        let bind_raw = lookup("MOVIEFORM_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind = bind_raw
            .parse()
            .with_context(|| format!("Invalid MOVIEFORM_BIND '{}'", bind_raw))?;

        let submit_mode = match lookup("SUBMIT_MODE") {
            Some(raw) => SubmitMode::parse(&raw)?,
            None => SubmitMode::default(),
        };

        let http_timeout = match lookup("MOVIES_HTTP_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw
                    .trim()
                    .parse()
                    .with_context(|| format!("Invalid MOVIES_HTTP_TIMEOUT_SECS '{}'", raw))?;
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        Ok(Self {
            graphql_url,
            bind,
            submit_mode,
            http_timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply() {
        let config = config_from(&[("MOVIES_GRAPHQL_URL", "http://localhost:4000/graphql")])
            .expect("config");
        assert_eq!(config.bind, DEFAULT_BIND.parse::<SocketAddr>().unwrap());
        assert_eq!(config.submit_mode, SubmitMode::FireAndForget);
        assert_eq!(config.http_timeout, Duration::from_secs(30));
    }

    #[test]
    fn endpoint_is_required() {
        let err = config_from(&[]).unwrap_err();
        assert!(err.to_string().contains("MOVIES_GRAPHQL_URL"));
    }

    #[test]
    fn reads_overrides() {
        let config = config_from(&[
            ("MOVIES_GRAPHQL_URL", "http://backend/graphql"),
            ("MOVIEFORM_BIND", "127.0.0.1:8080"),
            ("SUBMIT_MODE", "Confirmed"),
            ("MOVIES_HTTP_TIMEOUT_SECS", "5"),
        ])
        .expect("config");
        assert_eq!(config.bind.port(), 8080);
        assert_eq!(config.submit_mode, SubmitMode::Confirmed);
        assert_eq!(config.http_timeout, Duration::from_secs(5));
    }

    #[test]
    fn rejects_unknown_submit_mode() {
        let err = config_from(&[
            ("MOVIES_GRAPHQL_URL", "http://backend/graphql"),
            ("SUBMIT_MODE", "eventually"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("SUBMIT_MODE"));
    }
}
