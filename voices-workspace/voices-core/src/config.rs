use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing;

use crate::services::gamification::{default_badges, BadgeDefinition};

#[derive(Debug, Clone, Deserialize, Default)]
pub struct CoreConfig {
    #[serde(default)]
    pub system: SystemConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub logbook: LogbookConfig,
    #[serde(default)]
    pub services: ServicesConfig,
    #[serde(default)]
    pub remote: RemoteConfig,
    #[serde(default)]
    pub taxonomy: TaxonomyConfig,
    #[serde(default)]
    pub content: ContentConfig,
    #[serde(default)]
    pub gamification: GamificationConfig,
}

impl CoreConfig {
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join("config.toml");
        let mut cfg = if path.exists() {
            let text = fs::read_to_string(&path)
                .with_context(|| format!("reading config file {}", path.display()))?;
            toml::from_str::<CoreConfig>(&text)
                .with_context(|| format!("parsing config file {}", path.display()))?
        } else {
            tracing::info!(
                "No config file found at {}. Using CoreConfig::default().",
                path.display()
            );
            CoreConfig::default()
        };
        cfg.resolve_paths(root);
        cfg.apply_env();
        Ok(cfg)
    }

    fn resolve_paths(&mut self, root: &Path) {
        self.store.db_path = absolutize(root, &self.store.db_path);
        self.logbook.dir = absolutize(root, &self.logbook.dir);
        self.taxonomy.keywords_path = absolutize(root, &self.taxonomy.keywords_path);
    }

    /// Secrets and deployment-specific endpoints may come from the environment.
    fn apply_env(&mut self) {
        if let Ok(key) = std::env::var("HUGGINGFACE_API_KEY") {
            if !key.trim().is_empty() {
                self.remote.huggingface_api_key = Some(key);
            }
        }
        if let Ok(url) = std::env::var("VOICES_LOCAL_ENDPOINT") {
            if !url.trim().is_empty() {
                self.remote.local_endpoint = Some(url);
            }
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SystemConfig {
    #[serde(default = "SystemConfig::default_name")]
    pub name: String,
    #[serde(default = "SystemConfig::default_version")]
    pub version: String,
}

impl SystemConfig {
    fn default_name() -> String {
        "Bharat Voices".to_string()
    }

    fn default_version() -> String {
        "1.0.0".to_string()
    }
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            name: Self::default_name(),
            version: Self::default_version(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "StoreConfig::default_db_path")]
    pub db_path: PathBuf,
}

impl StoreConfig {
    fn default_db_path() -> PathBuf {
        PathBuf::from("data/voices.db")
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: Self::default_db_path(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogbookConfig {
    #[serde(default = "LogbookConfig::default_dir")]
    pub dir: PathBuf,
    #[serde(default = "LogbookConfig::default_actions")]
    pub actions: String,
    #[serde(default = "LogbookConfig::default_resolutions")]
    pub resolutions: String,
    #[serde(default = "LogbookConfig::default_preview_len")]
    pub preview_len: usize,
}

impl LogbookConfig {
    fn default_dir() -> PathBuf {
        PathBuf::from("logbook")
    }

    fn default_actions() -> String {
        "actions.jsonl".to_string()
    }

    fn default_resolutions() -> String {
        "resolutions.jsonl".to_string()
    }

    fn default_preview_len() -> usize {
        120
    }

    pub fn actions_path(&self) -> PathBuf {
        self.dir.join(&self.actions)
    }

    pub fn resolutions_path(&self) -> PathBuf {
        self.dir.join(&self.resolutions)
    }
}

impl Default for LogbookConfig {
    fn default() -> Self {
        Self {
            dir: Self::default_dir(),
            actions: Self::default_actions(),
            resolutions: Self::default_resolutions(),
            preview_len: Self::default_preview_len(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServicesConfig {
    #[serde(default = "ServicesConfig::default_true")]
    pub translation_enabled: bool,
    #[serde(default = "ServicesConfig::default_true")]
    pub categorization_enabled: bool,
    #[serde(default = "ServicesConfig::default_true")]
    pub audit_enabled: bool,
}

impl ServicesConfig {
    fn default_true() -> bool {
        true
    }
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            translation_enabled: true,
            categorization_enabled: true,
            audit_enabled: true,
        }
    }
}

// -------------------------------------------------------------------------
// Remote services (used by services::translation / services::categorization)
// -------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteConfig {
    #[serde(default)]
    pub huggingface_api_key: Option<String>,
    #[serde(default = "RemoteConfig::default_huggingface_url")]
    pub huggingface_url: String,
    #[serde(default = "RemoteConfig::default_translation_model")]
    pub translation_model: String,
    #[serde(default = "RemoteConfig::default_categorization_model")]
    pub categorization_model: String,
    /// Self-hosted inference server (same request shapes as the HuggingFace API).
    #[serde(default)]
    pub local_endpoint: Option<String>,
    #[serde(default = "RemoteConfig::default_true")]
    pub google_enabled: bool,
    #[serde(default = "RemoteConfig::default_google_url")]
    pub google_url: String,
    #[serde(default = "RemoteConfig::default_true")]
    pub mymemory_enabled: bool,
    #[serde(default = "RemoteConfig::default_mymemory_url")]
    pub mymemory_url: String,
    #[serde(default = "RemoteConfig::default_timeout_secs")]
    pub timeout_secs: u64,
}

impl RemoteConfig {
    fn default_huggingface_url() -> String {
        "https://api-inference.huggingface.co/models/".to_string()
    }
    fn default_translation_model() -> String {
        "Helsinki-NLP/opus-mt-mul-en".to_string()
    }
    fn default_categorization_model() -> String {
        "facebook/bart-large-mnli".to_string()
    }
    fn default_true() -> bool {
        true
    }
    fn default_google_url() -> String {
        "https://translate.googleapis.com/translate_a/single".to_string()
    }
    fn default_mymemory_url() -> String {
        "https://api.mymemory.translated.net/get".to_string()
    }
    fn default_timeout_secs() -> u64 {
        30
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            huggingface_api_key: None,
            huggingface_url: Self::default_huggingface_url(),
            translation_model: Self::default_translation_model(),
            categorization_model: Self::default_categorization_model(),
            local_endpoint: None,
            google_enabled: true,
            google_url: Self::default_google_url(),
            mymemory_enabled: true,
            mymemory_url: Self::default_mymemory_url(),
            timeout_secs: Self::default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TaxonomyConfig {
    /// Local override for the keyword tables; the embedded copy is used when missing.
    #[serde(default = "TaxonomyConfig::default_keywords_path")]
    pub keywords_path: PathBuf,
}

impl TaxonomyConfig {
    fn default_keywords_path() -> PathBuf {
        PathBuf::from("taxonomy/keywords.toml")
    }
}

impl Default for TaxonomyConfig {
    fn default() -> Self {
        Self {
            keywords_path: Self::default_keywords_path(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContentConfig {
    #[serde(default = "ContentConfig::default_max_title_len")]
    pub max_title_len: usize,
    #[serde(default = "ContentConfig::default_max_text_len")]
    pub max_text_len: usize,
    #[serde(default = "ContentConfig::default_max_audio_secs")]
    pub max_audio_secs: f64,
}

impl ContentConfig {
    fn default_max_title_len() -> usize {
        100
    }
    fn default_max_text_len() -> usize {
        5000
    }
    fn default_max_audio_secs() -> f64 {
        300.0
    }
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            max_title_len: Self::default_max_title_len(),
            max_text_len: Self::default_max_text_len(),
            max_audio_secs: Self::default_max_audio_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GamificationConfig {
    #[serde(default = "default_badges")]
    pub badges: Vec<BadgeDefinition>,
    #[serde(default = "GamificationConfig::default_collection_target")]
    pub collection_target: u64,
    #[serde(default = "GamificationConfig::default_daily_target")]
    pub daily_target: u64,
    #[serde(default = "GamificationConfig::default_leaderboard_size")]
    pub leaderboard_size: usize,
}

impl GamificationConfig {
    fn default_collection_target() -> u64 {
        1000
    }
    fn default_daily_target() -> u64 {
        10
    }
    fn default_leaderboard_size() -> usize {
        100
    }
}

impl Default for GamificationConfig {
    fn default() -> Self {
        Self {
            badges: default_badges(),
            collection_target: Self::default_collection_target(),
            daily_target: Self::default_daily_target(),
            leaderboard_size: Self::default_leaderboard_size(),
        }
    }
}

fn absolutize(root: &Path, value: &Path) -> PathBuf {
    if value.is_absolute() {
        value.to_path_buf()
    } else {
        root.join(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults_for_missing_sections() {
        let cfg: CoreConfig = toml::from_str(
            r#"
            [remote]
            timeout_secs = 5
            google_enabled = false
            "#,
        )
        .unwrap();
        assert_eq!(cfg.remote.timeout_secs, 5);
        assert!(!cfg.remote.google_enabled);
        assert!(cfg.remote.mymemory_enabled);
        assert_eq!(cfg.gamification.badges.len(), 7);
        assert_eq!(cfg.system.name, "Bharat Voices");
    }

    #[test]
    fn relative_paths_are_rooted() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = CoreConfig::load(dir.path()).unwrap();
        assert!(cfg.store.db_path.starts_with(dir.path()));
        assert!(cfg.logbook.dir.starts_with(dir.path()));
    }
}
