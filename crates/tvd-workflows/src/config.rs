//! Workflow configuration: defaults, optional TOML file, then `TVD__*` environment.
//!
//! | Key | Env | Default |
//! |-----|-----|---------|
//! | workdir | TVD__WORKDIR | /work |
//! | tvddir | TVD__TVDDIR | /tvd |
//! | series | TVD__SERIES | GameOfThrones |
//! | season | TVD__SEASON | 1 |
//! | episode | TVD__EPISODE | 1 |
//! | language | TVD__LANGUAGE | en |
//! | talking_face.exp | TVD__TALKING_FACE__EXP | Segmentation_0.6Pfa |
//! | talking_face.modality | TVD__TALKING_FACE__MODALITY | AV |
//! | talking_face.label | TVD__TALKING_FACE__LABEL | talking |

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Talking-face detection settings (which experiment's logs to read).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TalkingFaceConfig {
    /// Experiment directory name under `external/gregory/`.
    pub exp: String,
    /// Modality suffix of the log files (e.g. "AV").
    pub modality: String,
    /// Label written on every detected talking face.
    pub label: String,
}

impl Default for TalkingFaceConfig {
    fn default() -> Self {
        Self {
            exp: "Segmentation_0.6Pfa".to_string(),
            modality: "AV".to_string(),
            label: "talking".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Root of external inputs and stage outputs.
    pub workdir: PathBuf,
    /// TVD dataset root (audio and references, consumed by external stages).
    pub tvddir: PathBuf,
    pub series: String,
    pub season: u32,
    pub episode: u32,
    pub language: String,
    #[serde(default)]
    pub talking_face: TalkingFaceConfig,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            workdir: PathBuf::from("/work"),
            tvddir: PathBuf::from("/tvd"),
            series: "GameOfThrones".to_string(),
            season: 1,
            episode: 1,
            language: "en".to_string(),
            talking_face: TalkingFaceConfig::default(),
        }
    }
}

impl WorkflowConfig {
    /// Load config. Precedence: env `TVD_CONFIG` path > `config/tvd.toml` > defaults,
    /// with `TVD__`-prefixed environment variables on top.
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_path = std::env::var("TVD_CONFIG").unwrap_or_else(|_| "config/tvd".to_string());
        Self::load_from(Some(Path::new(&config_path)), true)
    }

    /// Load from an optional file (extension may be omitted), optionally layering the environment.
    pub fn load_from(file: Option<&Path>, with_env: bool) -> Result<Self, config::ConfigError> {
        let defaults = Self::default();
        let mut builder = config::Config::builder()
            .set_default("workdir", defaults.workdir.to_string_lossy().into_owned())?
            .set_default("tvddir", defaults.tvddir.to_string_lossy().into_owned())?
            .set_default("series", defaults.series.as_str())?
            .set_default("season", i64::from(defaults.season))?
            .set_default("episode", i64::from(defaults.episode))?
            .set_default("language", defaults.language.as_str())?
            .set_default("talking_face.exp", defaults.talking_face.exp.as_str())?
            .set_default("talking_face.modality", defaults.talking_face.modality.as_str())?
            .set_default("talking_face.label", defaults.talking_face.label.as_str())?;

        if let Some(path) = file {
            if let Some(name) = path.to_str() {
                builder = builder.add_source(config::File::with_name(name).required(false));
            }
        }
        if with_env {
            builder = builder.add_source(config::Environment::with_prefix("TVD").separator("__"));
        }

        builder.build()?.try_deserialize()
    }

    /// TVD episode identifier, e.g. `GameOfThrones.Season01.Episode01`.
    pub fn episode_id(&self) -> String {
        format!(
            "{}.Season{:02}.Episode{:02}",
            self.series, self.season, self.episode
        )
    }

    /// Same configuration pointed at another episode of the series.
    pub fn for_episode(&self, episode: u32) -> Self {
        Self {
            episode,
            ..self.clone()
        }
    }
}
