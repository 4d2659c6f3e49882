//! File locations for one episode, derived from the workflow configuration.

use std::path::PathBuf;

use crate::config::WorkflowConfig;

/// Path templates resolved for a single episode.
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodePaths {
    workdir: PathBuf,
    episode: String,
    exp: String,
    modality: String,
}

impl EpisodePaths {
    pub fn new(config: &WorkflowConfig) -> Self {
        Self {
            workdir: config.workdir.clone(),
            episode: config.episode_id(),
            exp: config.talking_face.exp.clone(),
            modality: config.talking_face.modality.clone(),
        }
    }

    pub fn episode(&self) -> &str {
        &self.episode
    }

    /// `{workdir}/external/gregory/lists/{episode}.txt`
    pub fn sequence_list(&self) -> PathBuf {
        self.workdir
            .join("external")
            .join("gregory")
            .join("lists")
            .join(format!("{}.txt", self.episode))
    }

    /// `{workdir}/external/gregory/{exp}/{episode}.{identifier:05}.{index:02}.{modality}.xml`
    pub fn sequence_log(&self, identifier: i64, index: u32) -> PathBuf {
        self.workdir
            .join("external")
            .join("gregory")
            .join(&self.exp)
            .join(format!(
                "{}.{:05}.{:02}.{}.xml",
                self.episode, identifier, index, self.modality
            ))
    }

    /// `{workdir}/external/face_clustering/{episode}.json`, produced outside this crate.
    pub fn face_clusters(&self) -> PathBuf {
        self.workdir
            .join("external")
            .join("face_clustering")
            .join(format!("{}.json", self.episode))
    }

    /// `{workdir}/external/speech_reference/{episode}.json`: reference speech turns,
    /// produced outside this crate.
    pub fn speech_reference(&self) -> PathBuf {
        self.workdir
            .join("external")
            .join("speech_reference")
            .join(format!("{}.json", self.episode))
    }

    /// `{workdir}/{workflow}/{stage}/{episode}.json`
    pub fn stage_output(&self, workflow: &str, stage: &str) -> PathBuf {
        self.workdir
            .join(workflow)
            .join(stage)
            .join(format!("{}.json", self.episode))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths() -> EpisodePaths {
        EpisodePaths::new(&WorkflowConfig::default())
    }

    #[test]
    fn sequence_log_template() {
        assert_eq!(
            paths().sequence_log(42, 3),
            PathBuf::from(
                "/work/external/gregory/Segmentation_0.6Pfa/GameOfThrones.Season01.Episode01.00042.03.AV.xml"
            )
        );
    }

    #[test]
    fn sequence_list_template() {
        assert_eq!(
            paths().sequence_list(),
            PathBuf::from("/work/external/gregory/lists/GameOfThrones.Season01.Episode01.txt")
        );
    }

    #[test]
    fn external_annotation_templates() {
        assert_eq!(
            paths().face_clusters(),
            PathBuf::from("/work/external/face_clustering/GameOfThrones.Season01.Episode01.json")
        );
        assert_eq!(
            paths().speech_reference(),
            PathBuf::from("/work/external/speech_reference/GameOfThrones.Season01.Episode01.json")
        );
    }

    #[test]
    fn stage_output_template() {
        assert_eq!(
            paths().stage_output("talking_face", "clustering"),
            PathBuf::from("/work/talking_face/clustering/GameOfThrones.Season01.Episode01.json")
        );
    }
}
