use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use rand::Rng;
use tracing::warn;

/// Shortest accepted session secret, in bytes.
const MIN_SECRET_LEN: usize = 32;

pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub session_secret: Vec<u8>,
    pub session_ttl: chrono::Duration,
    pub countdown_target: Option<NaiveDate>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from `lookup`, which maps a variable name to its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let host = lookup("BOARD_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = lookup("BOARD_PORT")
            .unwrap_or_else(|| "3000".into())
            .parse()
            .context("BOARD_PORT must be a port number")?;
        let db_path = PathBuf::from(lookup("BOARD_DB_PATH").unwrap_or_else(|| "corkboard.db".into()));

        let session_secret = match lookup("BOARD_SESSION_SECRET") {
            Some(secret) if secret.len() >= MIN_SECRET_LEN => secret.into_bytes(),
            Some(_) => bail!("BOARD_SESSION_SECRET must be at least {MIN_SECRET_LEN} bytes"),
            None => {
                warn!("BOARD_SESSION_SECRET not set; sessions will not survive a restart");
                let mut secret = vec![0u8; MIN_SECRET_LEN * 2];
                rand::rng().fill(&mut secret[..]);
                secret
            }
        };

        let ttl_hours: i64 = lookup("BOARD_SESSION_TTL_HOURS")
            .unwrap_or_else(|| "720".into())
            .parse()
            .context("BOARD_SESSION_TTL_HOURS must be a whole number of hours")?;
        if ttl_hours <= 0 {
            bail!("BOARD_SESSION_TTL_HOURS must be positive");
        }

        let countdown_target = lookup("BOARD_COUNTDOWN_TARGET")
            .map(|raw| {
                NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
                    .with_context(|| format!("BOARD_COUNTDOWN_TARGET '{raw}' is not YYYY-MM-DD"))
            })
            .transpose()?;

        Ok(Self {
            host,
            port,
            db_path,
            session_secret,
            session_ttl: chrono::Duration::hours(ttl_hours),
            countdown_target,
        })
    }
}
