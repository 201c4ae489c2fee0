use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

use tracing::{info, warn};

use crate::error::AppError;

pub struct Config {
    pub port: u16,
    pub db_path: PathBuf,
    pub assets_dir: PathBuf,
}

impl Config {
    pub fn load() -> Result<Self, AppError> {
        Ok(Self {
            port: try_load("PORT", "3000")?,
            db_path: try_load("DB_PATH", "data/route.redb")?,
            assets_dir: try_load("ASSETS_DIR", "assets")?,
        })
    }
}

fn try_load<T: FromStr>(key: &str, default: &str) -> Result<T, AppError>
where
    T::Err: Display,
{
    let raw = env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });
    raw.parse().map_err(|e: T::Err| {
        warn!("Invalid {key} value: {e}");
        AppError::Config(format!("{key}={raw}: {e}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_variable_uses_default() {
        let port: u16 = try_load("FOODTOUR_TEST_UNSET_PORT", "3000").unwrap();
        assert_eq!(port, 3000);
    }

    #[test]
    fn test_unparsable_default_is_a_config_error() {
        let err = try_load::<u16>("FOODTOUR_TEST_UNSET_PORT", "not-a-port").unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }
}
