use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub num_workers: usize,
    pub probe_timeout_secs: u64,
    pub ffprobe_path: String,
    pub recursive: bool,
    pub export_prefix: String,
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            num_workers: 4,
            probe_timeout_secs: 30,
            ffprobe_path: "ffprobe".to_string(),
            recursive: true,
            export_prefix: "exif_export".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Built-in defaults, then `config/default`, `config/{RUN_MODE}` and
    /// `config/local` when present, then `EXIF_VIEWER_*` variables.
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());
        let defaults = AppConfig::default();

        let s = Config::builder()
            .set_default("num_workers", defaults.num_workers as u64)?
            .set_default("probe_timeout_secs", defaults.probe_timeout_secs)?
            .set_default("ffprobe_path", defaults.ffprobe_path)?
            .set_default("recursive", defaults.recursive)?
            .set_default("export_prefix", defaults.export_prefix)?
            .set_default("log_level", defaults.log_level)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(Environment::with_prefix("EXIF_VIEWER"))
            .build()?;

        s.try_deserialize()
    }
}
