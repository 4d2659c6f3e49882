//! Talking-face and one-face workflows against a temporary workdir laid out like the
//! real one.
//!
//! Verifies that:
//! 1. Face-cluster labels reach talking faces, then overlapping speech turns
//! 2. The one-face workflow tags speech turns straight from face clusters
//! 3. Missing or corrupt external inputs stop the run at the right stage
//!
//! Run with: `cargo test --test talking_face_workflow_test`

use std::path::Path;

use tvd_annotation::{json, Annotation, Label, Segment, TrackId};
use tvd_workflows::{
    one_face_workflow, talking_face_workflow, EpisodePaths, WorkflowConfig, WorkflowError,
    ONE_FACE_WORKFLOW, SPEECH_TAGGING_STAGE, TALKING_FACE_WORKFLOW,
};

fn seg(start: f64, end: f64) -> Segment {
    Segment::new(start, end).expect("valid segment")
}

fn config_for(workdir: &Path) -> WorkflowConfig {
    WorkflowConfig {
        workdir: workdir.to_path_buf(),
        ..WorkflowConfig::default()
    }
}

fn write(path: &Path, content: &str) {
    std::fs::create_dir_all(path.parent().expect("parent")).expect("create dirs");
    std::fs::write(path, content).expect("write file");
}

/// Two sequences; the log of the second one is missing.
fn seed_detections(paths: &EpisodePaths) {
    write(
        &paths.sequence_list(),
        "GoT 1 shot 12 7 0 100.0\nGoT 1 shot 40 9 2 300.0\n",
    );
    write(
        &paths.sequence_log(7, 0),
        r#"<SpeechSegment ch="1" sconf="1.00" stime="1.0" etime="2.0" lang="eng"/>
<SpeechSegment ch="1" sconf="1.00" stime="8.0" etime="9.0" lang="eng"/>
"#,
    );
}

fn seed_clusters(paths: &EpisodePaths) {
    let clusters: Annotation = vec![
        (seg(95.0, 105.0), 7, "Jon"),
        (seg(95.0, 105.0), 8, "Arya"),
        (seg(295.0, 310.0), 9, "Sansa"),
    ]
    .into_iter()
    .collect();
    json::dump_to_path(&clusters, paths.face_clusters()).expect("write clusters");
}

/// Speech turns keyed by the face track of whoever speaks.
fn seed_speech(paths: &EpisodePaths) {
    let speech: Annotation = vec![
        (seg(100.5, 103.0), 7, "turn_1"),
        (seg(100.0, 101.5), 8, "turn_2"),
        (seg(200.0, 210.0), 7, "turn_3"),
        (seg(296.0, 299.0), 9, "turn_4"),
    ]
    .into_iter()
    .collect();
    json::dump_to_path(&speech.with_uri("GameOfThrones.Season01.Episode01"), paths.speech_reference())
        .expect("write speech reference");
}

#[test]
fn talking_faces_receive_face_cluster_labels() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let config = config_for(dir.path());
    let paths = EpisodePaths::new(&config);
    seed_detections(&paths);
    seed_clusters(&paths);
    seed_speech(&paths);

    let graph = talking_face_workflow(&config).expect("build workflow");
    let summary = graph.run().expect("run workflow");
    assert_eq!(summary.stages.len(), 6);

    let clustering = json::load_from_path(
        paths.stage_output(TALKING_FACE_WORKFLOW, "talking_face_clustering"),
    )
    .expect("load talking-face clusters");
    let expected: Annotation = vec![(seg(101.0, 102.0), 7, "Jon")].into_iter().collect();
    assert_eq!(clustering, expected);
    assert_eq!(clustering.uri(), Some("GameOfThrones.Season01.Episode01"));

    // intermediate talking-face annotation keeps both detections of track 7
    let talking = json::load_from_path(paths.stage_output(TALKING_FACE_WORKFLOW, "talking_face"))
        .expect("load talking faces");
    assert_eq!(talking.len(), 2);
    assert_eq!(
        talking.get(seg(108.0, 109.0), &TrackId::from(7)).expect("second detection"),
        &Label::from("talking")
    );

    // only the turn overlapping a clustered talking face of the same track is kept
    let output = paths.stage_output(TALKING_FACE_WORKFLOW, SPEECH_TAGGING_STAGE);
    assert_eq!(summary.final_output(), Some(output.as_path()));
    let tagged = json::load_from_path(&output).expect("load tagged speech");
    let expected: Annotation = vec![(seg(100.5, 103.0), 7, "Jon")].into_iter().collect();
    assert_eq!(tagged, expected);
}

#[test]
fn one_face_tags_speech_turns_from_clusters() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let config = config_for(dir.path());
    let paths = EpisodePaths::new(&config);
    seed_clusters(&paths);
    seed_speech(&paths);

    let summary = one_face_workflow(&config)
        .expect("build workflow")
        .run()
        .expect("run workflow");
    let output = paths.stage_output(ONE_FACE_WORKFLOW, SPEECH_TAGGING_STAGE);
    assert_eq!(summary.final_output(), Some(output.as_path()));

    let tagged = json::load_from_path(&output).expect("load tagged speech");
    let expected: Annotation = vec![
        (seg(100.5, 103.0), 7, "Jon"),
        (seg(100.0, 101.5), 8, "Arya"),
        (seg(296.0, 299.0), 9, "Sansa"),
    ]
    .into_iter()
    .collect();
    assert_eq!(tagged, expected);
    assert_eq!(tagged.uri(), Some("GameOfThrones.Season01.Episode01"));
}

#[test]
fn missing_face_clusters_stop_the_workflow() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let config = config_for(dir.path());
    let paths = EpisodePaths::new(&config);
    seed_detections(&paths);

    let err = talking_face_workflow(&config)
        .expect("build workflow")
        .run()
        .expect_err("clusters are missing");
    match err {
        WorkflowError::Stage { stage, source } => {
            assert_eq!(stage, "face_clusters");
            assert!(matches!(*source, WorkflowError::MissingExternal { .. }));
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn corrupt_intermediate_file_is_reported_with_its_path() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let config = config_for(dir.path());
    let paths = EpisodePaths::new(&config);
    seed_detections(&paths);
    seed_speech(&paths);
    write(&paths.face_clusters(), "{\"pyannote\": \"Annotation\", \"content\": [");

    let err = talking_face_workflow(&config)
        .expect("build workflow")
        .run()
        .expect_err("clusters are corrupt");
    let message = format!("{}", err);
    assert!(message.contains("talking_face_clustering"));
    let source = std::error::Error::source(&err).expect("source").to_string();
    assert!(source.contains("face_clustering"));
}

#[test]
fn episodes_write_to_distinct_outputs() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let base = config_for(dir.path());
    let one = EpisodePaths::new(&base.for_episode(1));
    let two = EpisodePaths::new(&base.for_episode(2));
    assert_ne!(
        one.stage_output(TALKING_FACE_WORKFLOW, "talking_face_clustering"),
        two.stage_output(TALKING_FACE_WORKFLOW, "talking_face_clustering")
    );
}
