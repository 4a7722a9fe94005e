use config::{Config, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub general: General,
    pub assets: Vec<Asset>,
}

#[derive(Debug, Deserialize)]
pub struct General {
    pub output_dir: String,
    pub minimum_date: String,
}

/// A tracked Status Invest asset. `kind` stays a raw string here; it is
/// validated when the request resource is resolved, not at load time.
#[derive(Debug, Clone, Deserialize)]
pub struct Asset {
    pub name: String,
    pub ticker: String,
    pub kind: String,
}

impl Settings {
    pub fn new() -> Result<Self, config::ConfigError> {
        dotenv::dotenv().ok();
        let s = Config::builder()
            .add_source(File::with_name("config"))
            // Allow overrides such as APP_GENERAL__OUTPUT_DIR
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;
        s.try_deserialize()
    }
}
