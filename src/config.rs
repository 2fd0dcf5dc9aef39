use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{ensure, Context, Result};

use crate::upload::{
    UploadSettings, DEFAULT_MAX_FILE_BYTES, DEFAULT_PROGRESS_STEP, DEFAULT_TICK_INTERVAL,
};

pub const DEFAULT_LIST_DELAY: Duration = Duration::from_millis(800);
pub const DEFAULT_LOOKUP_DELAY: Duration = Duration::from_millis(500);
pub const DEFAULT_AUTH_DELAY: Duration = Duration::from_millis(1500);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    pub list_delay: Duration,
    pub lookup_delay: Duration,
    pub auth_delay: Duration,
    pub upload: UploadSettings,
    pub register_uploads: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            list_delay: DEFAULT_LIST_DELAY,
            lookup_delay: DEFAULT_LOOKUP_DELAY,
            auth_delay: DEFAULT_AUTH_DELAY,
            upload: UploadSettings::default(),
            register_uploads: false,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let millis = |key: &str, default: Duration| -> Result<Duration> {
            parse_or(&lookup, key, default.as_millis() as u64).map(Duration::from_millis)
        };

        let list_delay = millis("BUILDSMART_LIST_DELAY_MS", DEFAULT_LIST_DELAY)?;
        let lookup_delay = millis("BUILDSMART_LOOKUP_DELAY_MS", DEFAULT_LOOKUP_DELAY)?;
        let auth_delay = millis("BUILDSMART_AUTH_DELAY_MS", DEFAULT_AUTH_DELAY)?;
        let tick_interval = millis("BUILDSMART_UPLOAD_TICK_MS", DEFAULT_TICK_INTERVAL)?;
        let progress_step: u8 = parse_or(&lookup, "BUILDSMART_UPLOAD_STEP", DEFAULT_PROGRESS_STEP)?;
        ensure!(
            (1..=100).contains(&progress_step),
            "BUILDSMART_UPLOAD_STEP must be between 1 and 100"
        );
        let max_file_bytes = parse_or(&lookup, "BUILDSMART_UPLOAD_MAX_BYTES", DEFAULT_MAX_FILE_BYTES)?;
        let register_uploads = lookup("BUILDSMART_REGISTER_UPLOADS")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        Ok(Self {
            list_delay,
            lookup_delay,
            auth_delay,
            upload: UploadSettings {
                tick_interval,
                progress_step,
                max_file_bytes,
            },
            register_uploads,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} must be a non-negative integer")),
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_match_the_simulated_timings() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.list_delay, Duration::from_millis(800));
        assert_eq!(config.upload.max_file_bytes, 10 * 1024 * 1024);
        assert!(!config.register_uploads);
    }

    #[test]
    fn overrides_are_parsed() {
        let config = config_from(&[
            ("BUILDSMART_LIST_DELAY_MS", "0"),
            ("BUILDSMART_UPLOAD_STEP", "25"),
            ("BUILDSMART_REGISTER_UPLOADS", "TRUE"),
        ])
        .unwrap();
        assert_eq!(config.list_delay, Duration::ZERO);
        assert_eq!(config.upload.progress_step, 25);
        assert!(config.register_uploads);
    }

    #[test]
    fn invalid_values_name_the_variable() {
        let err = config_from(&[("BUILDSMART_UPLOAD_TICK_MS", "fast")]).unwrap_err();
        assert!(err.to_string().contains("BUILDSMART_UPLOAD_TICK_MS"));

        let err = config_from(&[("BUILDSMART_UPLOAD_STEP", "0")]).unwrap_err();
        assert!(err.to_string().contains("between 1 and 100"));
    }
}
