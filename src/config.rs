use std::env;
use std::path::PathBuf;

use crate::catalog::DEFAULT_RECENT_DAYS;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub recent_days: i64,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let data_dir = env::var("STOREFRONT_DATA_DIR")
            .unwrap_or_else(|_| "./data".to_string())
            .into();
        let recent_days = env::var("STOREFRONT_RECENT_DAYS")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(DEFAULT_RECENT_DAYS);
        Ok(Self {
            data_dir,
            recent_days,
        })
    }
}
