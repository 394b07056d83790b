use std::path::{Path, PathBuf};

use clap::Parser;
use serde::Deserialize;

use crate::error::Result;

pub const API_KEY_ENV: &str = "TMDB_API_KEY";

#[derive(Parser, Debug, Clone)]
#[command(name = "movie-search", about = "Search TMDB for movies")]
pub struct CliConfig {
    /// Path to a TOML config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Don't play the background track
    #[arg(long)]
    pub no_music: bool,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub api_key: String,
    pub search_url: String,
    pub poster_base_url: String,
    pub movie_page_base_url: String,
    pub background_image: PathBuf,
    pub background_audio: PathBuf,
    pub play_music: bool,
    pub window_width: i32,
    pub window_height: i32,
    pub request_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            api_key: String::new(),
            search_url: "https://api.themoviedb.org/3/search/movie".to_string(),
            poster_base_url: "https://image.tmdb.org/t/p/w200".to_string(),
            movie_page_base_url: "https://www.themoviedb.org/movie/".to_string(),
            background_image: PathBuf::from("background.jpeg"),
            background_audio: PathBuf::from("background.mp3"),
            play_music: true,
            window_width: 1000,
            window_height: 700,
            request_timeout_secs: 20,
        }
    }
}

impl AppConfig {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("movie-search").join("config.toml"))
    }

    /// Reads a config file. A missing file is not an error and yields the defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No config file at {}, using defaults", path.display());
            return Ok(AppConfig::default());
        }
        let text = std::fs::read_to_string(path)?;
        let mut config: AppConfig = toml::from_str(&text)?;
        config.api_key = config.api_key.trim().to_string();
        tracing::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Resolves the effective config: file (explicit or default location),
    /// then the API key from the environment, then CLI switches.
    pub fn load(cli: &CliConfig) -> Result<Self> {
        let mut config = match cli.config.clone().or_else(AppConfig::default_path) {
            Some(path) => AppConfig::from_file(&path)?,
            None => AppConfig::default(),
        };
        config.apply_env_key(std::env::var(API_KEY_ENV).ok());
        if cli.no_music {
            config.play_music = false;
        }
        Ok(config)
    }

    fn apply_env_key(&mut self, key: Option<String>) {
        if let Some(key) = key.filter(|k| !k.trim().is_empty()) {
            self.api_key = key.trim().to_string();
        }
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::from_file(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config, AppConfig::default());
        assert!(!config.has_api_key());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "api_key = \"abc123\"\nplay_music = false\nwindow_width = 1280").unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.api_key, "abc123");
        assert!(!config.play_music);
        assert_eq!(config.window_width, 1280);
        assert_eq!(config.window_height, 700);
        assert_eq!(config.search_url, AppConfig::default().search_url);
    }

    #[test]
    fn file_key_is_trimmed() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "api_key = \"  abc123 \"").unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.api_key, "abc123");
    }

    #[test]
    fn malformed_file_is_an_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "window_width = \"wide\"").unwrap();
        assert!(AppConfig::from_file(file.path()).is_err());
    }

    #[test]
    fn env_key_overrides_file_key() {
        let mut config = AppConfig {
            api_key: "from-file".into(),
            ..AppConfig::default()
        };
        config.apply_env_key(Some(" from-env ".into()));
        assert_eq!(config.api_key, "from-env");

        config.apply_env_key(Some("   ".into()));
        assert_eq!(config.api_key, "from-env");

        config.apply_env_key(None);
        assert_eq!(config.api_key, "from-env");
    }

    #[test]
    fn cli_flags_parse() {
        let cli = CliConfig::parse_from(["movie-search", "--verbose", "--no-music", "-c", "x.toml"]);
        assert!(cli.verbose);
        assert!(cli.no_music);
        assert_eq!(cli.config, Some(PathBuf::from("x.toml")));
    }
}
