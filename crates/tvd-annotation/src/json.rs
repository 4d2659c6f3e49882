//! JSON encoding of annotations, compatible in shape with pyannote.core's format:
//!
//! ```json
//! {
//!   "pyannote": "Annotation",
//!   "uri": "GameOfThrones.Season01.Episode01",
//!   "modality": "AV",
//!   "content": [
//!     {"segment": {"start": 2.0, "end": 3.0}, "track": 1, "label": "talking"}
//!   ]
//! }
//! ```
//!
//! Tracks and labels keep their JSON type, so `1` and `"1"` never collide.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::annotation::{Annotation, Label, TrackId};
use crate::error::{AnnotationError, AnnotationResult};
use crate::segment::Segment;

#[derive(Serialize, Deserialize)]
enum Kind {
    Annotation,
}

#[derive(Serialize, Deserialize)]
struct Document<T> {
    pyannote: Kind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    modality: Option<String>,
    content: Vec<T>,
}

#[derive(Serialize)]
struct EntryRef<'a> {
    segment: Segment,
    track: &'a TrackId,
    label: &'a Label,
}

#[derive(Deserialize)]
struct OwnedEntry {
    segment: Segment,
    track: TrackId,
    label: Label,
}

/// Write `annotation` as pretty-printed JSON.
pub fn dump<W: Write>(annotation: &Annotation, writer: W) -> AnnotationResult<()> {
    let document = Document {
        pyannote: Kind::Annotation,
        uri: annotation.uri().map(String::from),
        modality: annotation.modality().map(String::from),
        content: annotation
            .iter()
            .map(|e| EntryRef {
                segment: e.segment,
                track: e.track,
                label: e.label,
            })
            .collect(),
    };
    serde_json::to_writer_pretty(writer, &document)?;
    Ok(())
}

pub fn dumps(annotation: &Annotation) -> AnnotationResult<String> {
    let mut buf = Vec::new();
    dump(annotation, &mut buf)?;
    // serde_json only ever emits UTF-8
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Read an annotation previously written by [`dump`].
pub fn load<R: Read>(reader: R) -> AnnotationResult<Annotation> {
    let document: Document<OwnedEntry> = serde_json::from_reader(reader)?;
    Ok(from_document(document))
}

pub fn loads(s: &str) -> AnnotationResult<Annotation> {
    let document: Document<OwnedEntry> = serde_json::from_str(s)?;
    Ok(from_document(document))
}

fn from_document(document: Document<OwnedEntry>) -> Annotation {
    let mut annotation = Annotation::new();
    annotation.set_metadata(document.uri, document.modality);
    for entry in document.content {
        annotation.add(entry.segment, entry.track, entry.label);
    }
    annotation
}

/// Write `annotation` to `path`, creating parent directories as needed.
///
/// Content goes to `<path>.tmp` first and is renamed into place once flushed, so a
/// failed write never leaves a truncated file at `path`.
pub fn dump_to_path(annotation: &Annotation, path: impl AsRef<Path>) -> AnnotationResult<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| AnnotationError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let tmp = temp_path(path);
    let written = write_file(annotation, &tmp).and_then(|()| {
        std::fs::rename(&tmp, path).map_err(|source| AnnotationError::Io {
            path: path.to_path_buf(),
            source,
        })
    });
    if written.is_err() {
        let _ = std::fs::remove_file(&tmp);
    }
    written?;

    debug!(path = %path.display(), entries = annotation.len(), "annotation written");
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".tmp");
    PathBuf::from(name)
}

fn write_file(annotation: &Annotation, path: &Path) -> AnnotationResult<()> {
    let io_err = |source| AnnotationError::Io {
        path: path.to_path_buf(),
        source,
    };
    let file = File::create(path).map_err(io_err)?;
    let mut writer = BufWriter::new(file);
    dump(annotation, &mut writer).map_err(|e| write_error(e, path))?;
    writer.flush().map_err(io_err)?;
    writer.get_ref().sync_all().map_err(io_err)
}

/// Failures of the underlying writer are I/O errors, not malformed content.
fn write_error(err: AnnotationError, path: &Path) -> AnnotationError {
    match err {
        AnnotationError::Json(source) if source.is_io() => AnnotationError::Io {
            path: path.to_path_buf(),
            source: source.into(),
        },
        other => other.with_path(path),
    }
}

/// Read an annotation from `path`. Malformed content is reported with the file path.
pub fn load_from_path(path: impl AsRef<Path>) -> AnnotationResult<Annotation> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| AnnotationError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let annotation = load(BufReader::new(file)).map_err(|e| e.with_path(path))?;
    debug!(path = %path.display(), entries = annotation.len(), "annotation loaded");
    Ok(annotation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::number::Number;

    fn seg(start: f64, end: f64) -> Segment {
        Segment::new(start, end).unwrap()
    }

    #[test]
    fn empty_annotation_round_trips() {
        let empty = Annotation::new();
        let text = dumps(&empty).unwrap();
        assert_eq!(loads(&text).unwrap(), empty);
    }

    #[test]
    fn mixed_scalar_types_stay_distinct() {
        let mut a = Annotation::new().with_uri("ep").with_modality("AV");
        a.add(seg(0.1, 0.30000000000000004), 1, "1");
        a.add(seg(0.1, 0.30000000000000004), "1", 1);
        a.add(seg(1.0 / 3.0, 2.0 / 3.0), -4, "quote \" and \\ slash");
        let back = loads(&dumps(&a).unwrap()).unwrap();
        assert_eq!(back, a);
        assert_eq!(back.len(), 3);
        assert_eq!(back.uri(), Some("ep"));
        assert_eq!(back.modality(), Some("AV"));
    }

    #[test]
    fn output_has_pyannote_shape() {
        let mut a = Annotation::new();
        a.add(seg(2.0, 3.0), 1, "talking");
        let value: serde_json::Value = serde_json::from_str(&dumps(&a).unwrap()).unwrap();
        assert_eq!(value["pyannote"], "Annotation");
        assert_eq!(value["content"][0]["segment"]["start"], 2.0);
        assert_eq!(value["content"][0]["track"], 1);
        assert_eq!(value["content"][0]["label"], "talking");
        assert!(value.get("uri").is_none());
    }

    #[test]
    fn rejects_malformed_documents() {
        assert!(loads("").is_err());
        assert!(loads(r#"{"pyannote": "Timeline", "content": []}"#).is_err());
        assert!(loads(r#"{"pyannote": "Annotation"}"#).is_err());
        assert!(loads(
            r#"{"pyannote": "Annotation", "content": [{"segment": {"start": 3, "end": 1}, "track": 1, "label": "a"}]}"#
        )
        .is_err());
        assert!(loads(
            r#"{"pyannote": "Annotation", "content": [{"segment": {"start": 0, "end": 1}, "track": 1.5, "label": "a"}]}"#
        )
        .is_err());
    }

    #[test]
    fn float_labels_and_large_tracks_round_trip() {
        let text = r#"{"pyannote": "Annotation", "content": [
            {"segment": {"start": 0.0, "end": 1.0}, "track": 1, "label": 0.5},
            {"segment": {"start": 0.0, "end": 1.0}, "track": 18446744073709551615, "label": "far"},
            {"segment": {"start": 2.0, "end": 3.0}, "track": 2.0, "label": 2}
        ]}"#;
        let a = loads(text).unwrap();
        assert_eq!(a.len(), 3);

        let half = Label::from(Number::from_f64(0.5).unwrap());
        assert_eq!(a.get(seg(0.0, 1.0), &TrackId::from(1)).unwrap(), &half);
        assert!(a.contains(seg(0.0, 1.0), &TrackId::from(u64::MAX)));
        let float_track = TrackId::from(Number::from_f64(2.0).unwrap());
        assert_eq!(a.get(seg(2.0, 3.0), &float_track).unwrap(), &Label::from(2));
        assert!(!a.contains(seg(2.0, 3.0), &TrackId::from(2)));

        let back = loads(&dumps(&a).unwrap()).unwrap();
        assert_eq!(back, a);
        let value: serde_json::Value = serde_json::from_str(&dumps(&a).unwrap()).unwrap();
        assert_eq!(value["content"][0]["label"], 0.5);
    }

    struct FullDisk;

    impl Write for FullDisk {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "no space left on device"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn writer_failure_is_an_io_error() {
        let mut a = Annotation::new();
        a.add(seg(0.0, 1.0), 1, "x");
        let err = dump(&a, FullDisk).unwrap_err();
        let err = write_error(err, Path::new("/out/a.json"));
        assert!(matches!(err, AnnotationError::Io { .. }));
        assert!(err.to_string().contains("no space left"));
    }

    #[test]
    fn dump_to_path_replaces_existing_file_without_leftovers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("a.json");
        let mut a = Annotation::new();
        a.add(seg(0.0, 1.0), 1, "first");
        dump_to_path(&a, &path).unwrap();
        a.add(seg(0.0, 1.0), 1, "second");
        dump_to_path(&a, &path).unwrap();

        assert_eq!(load_from_path(&path).unwrap(), a);
        assert!(!temp_path(&path).exists());
    }

    #[test]
    fn failed_dump_leaves_no_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        // the destination is a non-empty directory, so the final rename fails
        let path = dir.path().join("taken");
        std::fs::create_dir_all(path.join("inner")).unwrap();

        let mut a = Annotation::new();
        a.add(seg(0.0, 1.0), 1, "x");
        let err = dump_to_path(&a, &path).unwrap_err();
        assert!(matches!(err, AnnotationError::Io { .. }));
        assert!(path.is_dir());
        assert!(!temp_path(&path).exists());
    }

    #[test]
    fn load_from_path_reports_offending_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = load_from_path(&path).unwrap_err();
        assert!(matches!(err, AnnotationError::Format { .. }));
        assert!(err.to_string().contains("broken.json"));
    }
}
