use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::cli::GlobalArgs;
use crate::error::ConfigError;
use crate::history::{self, Coordinates};
use crate::recorder::RecorderSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    File,
    Sqlite,
}

/// Contents of `config.toml`. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub storage: StorageSection,
    pub history: HistorySection,
    pub location: LocationSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageSection {
    pub backend: Backend,
    pub data_dir: Option<PathBuf>,
    pub history_key: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HistorySection {
    pub timestamp_format: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LocationSection {
    pub enabled: bool,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub timeout: String,
}

impl Default for LocationSection {
    fn default() -> Self {
        LocationSection {
            enabled: true,
            latitude: None,
            longitude: None,
            timeout: "10s".to_string(),
        }
    }
}

pub struct Config {
    pub backend: Backend,
    pub data_dir: Option<PathBuf>,
    pub location_enabled: bool,
    pub position: Option<Coordinates>,
    pub recorder: RecorderSettings,
}

/// Default config path (~/.config/scanlog/config.toml or platform equivalent)
pub fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "scanlog").map(|dirs| dirs.config_dir().join("config.toml"))
}

impl FileConfig {
    pub fn parse(path: &Path, contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load from `path`. A missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(contents) => Self::parse(path, &contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}

impl Config {
    /// Read the config file named by the flags (or the default one) and
    /// apply the flag overrides.
    pub fn from_args(args: &GlobalArgs) -> Result<Self, ConfigError> {
        let file = match args.config.clone().or_else(default_config_path) {
            Some(path) => FileConfig::load(&path)?,
            None => FileConfig::default(),
        };
        Self::resolve(file, args)
    }

    pub fn resolve(file: FileConfig, args: &GlobalArgs) -> Result<Self, ConfigError> {
        let timeout = humantime::parse_duration(&file.location.timeout).map_err(|source| ConfigError::Timeout {
            value: file.location.timeout.clone(),
            source,
        })?;

        let timestamp_format = file
            .history
            .timestamp_format
            .unwrap_or_else(|| history::DEFAULT_TIMESTAMP_FORMAT.to_string());
        validate_timestamp_format(&timestamp_format)?;

        let position = match (file.location.latitude, file.location.longitude) {
            (Some(latitude), Some(longitude)) => Some(Coordinates::new(latitude, longitude)),
            _ => None,
        };

        Ok(Config {
            backend: args.store.unwrap_or(file.storage.backend),
            data_dir: args.data_dir.clone().or(file.storage.data_dir),
            location_enabled: file.location.enabled && !args.no_location,
            position,
            recorder: RecorderSettings {
                history_key: file
                    .storage
                    .history_key
                    .unwrap_or_else(|| history::DEFAULT_HISTORY_KEY.to_string()),
                timestamp_format,
                location_timeout: timeout,
            },
        })
    }
}

pub fn validate_timestamp_format(format: &str) -> Result<(), ConfigError> {
    if !history::is_valid_timestamp_format(format) {
        return Err(ConfigError::TimestampFormat(format.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn args() -> GlobalArgs {
        GlobalArgs {
            config: None,
            store: None,
            data_dir: None,
            no_location: false,
            verbose: false,
        }
    }

    fn parse(contents: &str) -> Result<FileConfig, ConfigError> {
        FileConfig::parse(Path::new("config.toml"), contents)
    }

    #[test]
    fn empty_file_uses_defaults() {
        let config = Config::resolve(parse("").unwrap(), &args()).unwrap();

        assert_eq!(config.backend, Backend::File);
        assert!(config.location_enabled);
        assert_eq!(config.position, None);
        assert_eq!(config.recorder.history_key, "qrHistory");
        assert_eq!(config.recorder.location_timeout, Duration::from_secs(10));
    }

    #[test]
    fn full_file_is_applied() {
        let file = parse(
            r#"
            [storage]
            backend = "sqlite"
            data_dir = "/tmp/scanlog"
            history_key = "scans"

            [history]
            timestamp_format = "%Y-%m-%d %H:%M:%S"

            [location]
            enabled = true
            latitude = 59.3293
            longitude = 18.0686
            timeout = "750ms"
            "#,
        )
        .unwrap();

        let config = Config::resolve(file, &args()).unwrap();

        assert_eq!(config.backend, Backend::Sqlite);
        assert_eq!(config.data_dir, Some(PathBuf::from("/tmp/scanlog")));
        assert_eq!(config.recorder.history_key, "scans");
        assert_eq!(config.recorder.timestamp_format, "%Y-%m-%d %H:%M:%S");
        assert_eq!(config.position, Some(Coordinates::new(59.3293, 18.0686)));
        assert_eq!(config.recorder.location_timeout, Duration::from_millis(750));
    }

    #[test]
    fn flags_override_file() {
        let file = parse("[storage]\nbackend = \"sqlite\"\ndata_dir = \"/a\"\n").unwrap();
        let mut args = args();
        args.store = Some(Backend::File);
        args.data_dir = Some(PathBuf::from("/b"));
        args.no_location = true;

        let config = Config::resolve(file, &args).unwrap();

        assert_eq!(config.backend, Backend::File);
        assert_eq!(config.data_dir, Some(PathBuf::from("/b")));
        assert!(!config.location_enabled);
    }

    #[test]
    fn half_a_position_is_no_position() {
        let file = parse("[location]\nlatitude = 1.5\n").unwrap();
        let config = Config::resolve(file, &args()).unwrap();
        assert_eq!(config.position, None);
    }

    #[test]
    fn bad_timeout_is_rejected() {
        let file = parse("[location]\ntimeout = \"soon\"\n").unwrap();
        assert!(matches!(
            Config::resolve(file, &args()),
            Err(ConfigError::Timeout { .. })
        ));
    }

    #[test]
    fn bad_timestamp_format_is_rejected() {
        let file = parse("[history]\ntimestamp_format = \"%!\"\n").unwrap();
        assert!(matches!(
            Config::resolve(file, &args()),
            Err(ConfigError::TimestampFormat(_))
        ));
    }

    #[test]
    fn unknown_backend_is_a_parse_error() {
        assert!(matches!(
            parse("[storage]\nbackend = \"redis\"\n"),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let file = FileConfig::load(&dir.path().join("nope.toml")).unwrap();
        assert!(file.location.enabled);
    }
}
