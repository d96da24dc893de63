use crate::{fantasy, liveness, session, tg, watchdog};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use session_capture::Credentials;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

const DEFAULT_LOGIN_URL: &str = "https://account.formula1.com/#/en/login?lead_source=web_fantasy&redirect=https%3A%2F%2Ffantasy.formula1.com%2Fapp%2F%23%2F";
const DEFAULT_API_URL: &str = "https://fantasy-api.formula1.com";
const DEFAULT_SEASON: u16 = 2022;
const DEFAULT_SESSION_TIMEOUT_SECS: u64 = 120;
const DEFAULT_REBOOT_INTERVAL_HOURS: u64 = 24;
const MAX_REBOOT_INTERVAL_HOURS: u64 = 24 * 365;
const DEFAULT_HTTP_SERVER_HOSTNAME: &str = "0.0.0.0";
const DEFAULT_HTTP_SERVER_PORT: u16 = 8080;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Couldn't read the config from the environment")]
    Env { source: envy::Error },

    #[error("Invalid configuration:\n{}", messages.join("\n"))]
    Invalid { messages: Vec<String> },
}

pub struct Config {
    pub(crate) tg: tg::Config,
    pub(crate) fantasy: fantasy::Config,
    pub(crate) session: session::Config,
    pub(crate) watchdog: watchdog::Config,
    pub(crate) liveness: liveness::Config,
}

/// Environment as it is, before validation. Every value is optional here
/// so that all problems can be reported at once.
#[derive(Deserialize, Default)]
struct RawConfig {
    username: Option<String>,
    password: Option<String>,
    telegram_bot_api_key: Option<String>,
    f1_fantasy_league_id: Option<String>,
    f1_fantasy_login_url: Option<String>,
    f1_fantasy_api_url: Option<Url>,
    f1_fantasy_season: Option<u16>,
    session_timeout_secs: Option<u64>,
    reboot_interval_hours: Option<u64>,
    chrome_executable: Option<PathBuf>,
    browser_headless: Option<bool>,
    http_server_hostname: Option<String>,
    port: Option<u16>,
}

impl Config {
    pub fn from_env() -> Result<Config, ConfigError> {
        from_env().and_then(RawConfig::validate)
    }

    #[cfg(test)]
    fn from_vars(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars = vars.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned()));
        envy::from_iter::<_, RawConfig>(vars)
            .map_err(|source| ConfigError::Env { source })
            .and_then(RawConfig::validate)
    }
}

impl RawConfig {
    fn validate(self) -> Result<Config, ConfigError> {
        let mut messages = vec![];

        let mut required = |value: Option<String>, message: &str| {
            let value = value.filter(|value| !value.trim().is_empty());
            if value.is_none() {
                messages.push(message.to_owned());
            }
            value.unwrap_or_default()
        };

        let username = required(self.username, "Missing username");
        let password = required(self.password, "Missing password");
        let token = required(self.telegram_bot_api_key, "Missing Telegram bot API key");
        let league_id = required(self.f1_fantasy_league_id, "Missing F1 Fantasy league id");

        let session_timeout_secs = self
            .session_timeout_secs
            .unwrap_or(DEFAULT_SESSION_TIMEOUT_SECS);

        if session_timeout_secs == 0 {
            messages.push("SESSION_TIMEOUT_SECS must be greater than zero".to_owned());
        }

        let reboot_interval_hours = self
            .reboot_interval_hours
            .unwrap_or(DEFAULT_REBOOT_INTERVAL_HOURS);

        if reboot_interval_hours == 0 {
            messages.push("REBOOT_INTERVAL_HOURS must be greater than zero".to_owned());
        } else if reboot_interval_hours > MAX_REBOOT_INTERVAL_HOURS {
            messages.push(format!(
                "REBOOT_INTERVAL_HOURS must not exceed {MAX_REBOOT_INTERVAL_HOURS}"
            ));
        }

        let credentials = Credentials::new(username, password);

        let credentials = match credentials {
            Some(credentials) if messages.is_empty() => credentials,
            _ => return Err(ConfigError::Invalid { messages }),
        };

        let season = self.f1_fantasy_season.unwrap_or(DEFAULT_SEASON);

        let api_url = match self.f1_fantasy_api_url {
            Some(url) => url,
            None => DEFAULT_API_URL
                .parse()
                .unwrap_or_else(|err| panic!("BUG: invalid default API URL: {err}")),
        };

        let login_url = self
            .f1_fantasy_login_url
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| DEFAULT_LOGIN_URL.to_owned());

        Ok(Config {
            tg: tg::Config { token },
            fantasy: fantasy::Config {
                api_url,
                league_id,
                season,
            },
            session: session::Config {
                credentials,
                login_url,
                session_url_pattern: format!("/f1/{season}/sessions"),
                timeout: Duration::from_secs(session_timeout_secs),
                chrome_executable: self.chrome_executable,
                headless: self.browser_headless.unwrap_or(true),
            },
            watchdog: watchdog::Config {
                // Bounded by `MAX_REBOOT_INTERVAL_HOURS` above
                interval: Duration::from_secs(reboot_interval_hours * 60 * 60),
            },
            liveness: liveness::Config {
                hostname: self
                    .http_server_hostname
                    .unwrap_or_else(|| DEFAULT_HTTP_SERVER_HOSTNAME.to_owned()),
                port: self.port.unwrap_or(DEFAULT_HTTP_SERVER_PORT),
            },
        })
    }
}

fn from_env<T: DeserializeOwned>() -> Result<T, ConfigError> {
    envy::from_env().map_err(|source| ConfigError::Env { source })
}

/// Same as [`from_env`], but for the values that must be known before the
/// logging is initialized, so there is nowhere to report the error to except
/// for stderr.
pub(crate) fn from_env_or_default<T: DeserializeOwned + Default>() -> T {
    envy::from_env().unwrap_or_else(|err| {
        eprintln!(
            "Couldn't load {} from the environment, using defaults: {err}",
            std::any::type_name::<T>(),
        );
        T::default()
    })
}
