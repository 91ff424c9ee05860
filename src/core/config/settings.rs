use std::env;
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::paths::AppPaths;

/// Typed server settings, loaded from `config.yml`.
///
/// Every field has a default, so a missing or partial file always yields a
/// usable configuration. Lookup order: `PAPERQA_CONFIG_PATH`, then
/// `config.yml` in the data directory, then the project root.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub ollama: OllamaSettings,
    pub indexing: IndexingSettings,
    pub qa: QaSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaSettings {
    pub base_url: String,
    pub chat_model: String,
    pub embedding_model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexingSettings {
    /// Maximum chunk size in characters.
    pub chunk_size: usize,
    /// Overlap between consecutive chunks.
    pub chunk_overlap: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QaSettings {
    /// Number of chunks retrieved per question.
    pub top_k: usize,
    pub temperature: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ollama: OllamaSettings::default(),
            indexing: IndexingSettings::default(),
            qa: QaSettings::default(),
        }
    }
}

impl Default for OllamaSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            chat_model: "llama3.2:3b".to_string(),
            embedding_model: "nomic-embed-text".to_string(),
        }
    }
}

impl Default for IndexingSettings {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

impl Default for QaSettings {
    fn default() -> Self {
        Self {
            top_k: 4,
            temperature: 0.1,
        }
    }
}

impl Settings {
    pub fn load(paths: &AppPaths) -> Self {
        let path = config_path(paths);
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(&path) {
            Ok(contents) => match serde_yaml::from_str::<Settings>(&contents) {
                Ok(settings) => settings,
                Err(err) => {
                    tracing::warn!("Invalid config at {}: {}; using defaults", path.display(), err);
                    Self::default()
                }
            },
            Err(err) => {
                tracing::warn!("Failed to read {}: {}; using defaults", path.display(), err);
                Self::default()
            }
        }
    }
}

fn config_path(paths: &AppPaths) -> PathBuf {
    if let Ok(path) = env::var("PAPERQA_CONFIG_PATH") {
        return PathBuf::from(path);
    }

    let user_config = paths.user_data_dir.join("config.yml");
    if user_config.exists() {
        return user_config;
    }

    paths.project_root.join("config.yml")
}
