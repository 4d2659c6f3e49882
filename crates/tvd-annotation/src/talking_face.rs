//! Talking-face detection logs → annotation.
//!
//! Input is a sequence list (one descriptor per line, whitespace separated:
//! token 4 = face track id, token 5 = sub-index, token 6 = sequence start time)
//! and, per descriptor, an XML-ish log whose detection lines look like
//!
//! ```text
//! <SpeechSegment ch="1" sconf="1.00" stime="2.35" etime="4.10" lang="eng">
//! ```
//!
//! Offsets in the log are relative to the sequence; the descriptor's start time is
//! added to make them absolute. A missing or unreadable log drops that sequence, a
//! malformed record drops that record; neither stops the parse.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::annotation::{Annotation, Label, TrackId};
use crate::error::{AnnotationError, AnnotationResult, ParseError};
use crate::segment::Segment;

/// Substring identifying a detection record in a sequence log.
pub const DEFAULT_RECORD_MARKER: &str = "SpeechSegment";

/// Label given to every detected talking face.
pub const DEFAULT_TALKING_LABEL: &str = "talking";

/// One line of the sequence list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SequenceDescriptor {
    /// Face track the sequence follows.
    pub identifier: i64,
    /// Sub-index of the sequence within that track.
    pub index: u32,
    /// Absolute start time of the sequence, in seconds.
    pub start_time: f64,
}

impl SequenceDescriptor {
    /// Parse tokens 4, 5 and 6 of a whitespace-separated list line.
    pub fn parse(line: &str, line_no: usize) -> Result<Self, ParseError> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let malformed = |reason: String| ParseError::MalformedDescriptor {
            line: line_no,
            reason,
        };
        if tokens.len() < 7 {
            return Err(malformed(format!("expected at least 7 tokens, got {}", tokens.len())));
        }
        let identifier = tokens[4]
            .parse::<i64>()
            .map_err(|e| malformed(format!("track identifier {:?}: {}", tokens[4], e)))?;
        let index = tokens[5]
            .parse::<u32>()
            .map_err(|e| malformed(format!("sub-index {:?}: {}", tokens[5], e)))?;
        let start_time = tokens[6]
            .parse::<f64>()
            .map_err(|e| malformed(format!("start time {:?}: {}", tokens[6], e)))?;
        if !start_time.is_finite() || start_time < 0.0 {
            return Err(malformed(format!("start time {} out of range", start_time)));
        }
        Ok(Self {
            identifier,
            index,
            start_time,
        })
    }
}

/// Detections read from one sequence log.
#[derive(Debug)]
pub struct ParsedSequence {
    pub descriptor: SequenceDescriptor,
    pub log_path: PathBuf,
    /// Absolute detection segments, in file order.
    pub detections: Vec<Segment>,
    /// Records that carried the marker but could not be read.
    pub malformed: Vec<ParseError>,
}

/// What one sequence-list line contributed.
#[derive(Debug)]
pub enum SequenceOutcome {
    Parsed(ParsedSequence),
    Skipped(ParseError),
}

/// Counters for one parse run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParseReport {
    pub sequences: usize,
    pub parsed: usize,
    pub skipped: usize,
    pub detections: usize,
    pub malformed_records: usize,
}

impl ParseReport {
    fn record(&mut self, outcome: &SequenceOutcome) {
        self.sequences += 1;
        match outcome {
            SequenceOutcome::Parsed(seq) => {
                self.parsed += 1;
                self.detections += seq.detections.len();
                self.malformed_records += seq.malformed.len();
            }
            SequenceOutcome::Skipped(_) => self.skipped += 1,
        }
    }
}

/// Extract the value between the first pair of double quotes (`stime="12.34"` → 12.34).
fn quoted_number(token: &str) -> Option<f64> {
    token.split('"').nth(1)?.trim().parse().ok()
}

/// Parse one detection record into offsets relative to its sequence.
pub fn parse_record(line: &str, line_no: usize) -> Result<(f64, f64), ParseError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let offset = |i: usize, name: &str| {
        tokens
            .get(i)
            .and_then(|t| quoted_number(t))
            .ok_or_else(|| ParseError::MalformedRecord {
                line: line_no,
                reason: format!("no quoted {} in token {}", name, i),
            })
    };
    Ok((offset(3, "start")?, offset(4, "end")?))
}

/// Builds a talking-face annotation from a sequence list and per-sequence logs.
///
/// `locate` maps a descriptor to its log path; path templates live with the caller.
pub struct TalkingFaceParser<P> {
    locate: P,
    label: Label,
    marker: String,
}

impl<P> TalkingFaceParser<P>
where
    P: Fn(&SequenceDescriptor) -> PathBuf,
{
    pub fn new(locate: P) -> Self {
        Self {
            locate,
            label: Label::from(DEFAULT_TALKING_LABEL),
            marker: DEFAULT_RECORD_MARKER.to_string(),
        }
    }

    pub fn with_label(mut self, label: impl Into<Label>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = marker.into();
        self
    }

    /// Read one sequence log. The file is opened and closed within this call.
    pub fn parse_sequence(&self, descriptor: SequenceDescriptor) -> SequenceOutcome {
        let path = (self.locate)(&descriptor);
        let missing = |source| ParseError::MissingSequenceLog {
            path: path.clone(),
            source,
        };
        let file = match File::open(&path) {
            Ok(f) => f,
            Err(e) => return SequenceOutcome::Skipped(missing(e)),
        };

        let mut detections = Vec::new();
        let mut malformed = Vec::new();
        for (i, line) in BufReader::new(file).lines().enumerate() {
            let line = match line {
                Ok(l) => l,
                Err(e) => return SequenceOutcome::Skipped(missing(e)),
            };
            if !line.contains(self.marker.as_str()) {
                continue;
            }
            let line_no = i + 1;
            let segment = parse_record(&line, line_no).and_then(|(start, end)| {
                let start = descriptor.start_time + start;
                let end = descriptor.start_time + end;
                Segment::new(start, end).map_err(|e| ParseError::MalformedRecord {
                    line: line_no,
                    reason: e.to_string(),
                })
            });
            match segment {
                Ok(s) => detections.push(s),
                Err(e) => {
                    debug!(path = %path.display(), error = %e, "skipping detection record");
                    malformed.push(e);
                }
            }
        }

        SequenceOutcome::Parsed(ParsedSequence {
            descriptor,
            log_path: path,
            detections,
            malformed,
        })
    }

    /// Lazily parse every non-blank line of a sequence list.
    pub fn sequences<'a>(&'a self, list: &'a str) -> impl Iterator<Item = SequenceOutcome> + 'a {
        list.lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(move |(i, line)| match SequenceDescriptor::parse(line, i + 1) {
                Ok(descriptor) => self.parse_sequence(descriptor),
                Err(e) => SequenceOutcome::Skipped(e),
            })
    }

    /// Aggregate all sequences of `list` into one annotation.
    pub fn parse_str(&self, list: &str) -> (Annotation, ParseReport) {
        let mut annotation = Annotation::new();
        let mut report = ParseReport::default();
        for outcome in self.sequences(list) {
            report.record(&outcome);
            match outcome {
                SequenceOutcome::Parsed(seq) => {
                    let track = TrackId::from(seq.descriptor.identifier);
                    for segment in seq.detections {
                        annotation.add(segment, track.clone(), self.label.clone());
                    }
                }
                SequenceOutcome::Skipped(e) => warn!(error = %e, "sequence skipped"),
            }
        }
        info!(
            sequences = report.sequences,
            skipped = report.skipped,
            detections = report.detections,
            malformed_records = report.malformed_records,
            "talking-face logs parsed"
        );
        (annotation, report)
    }

    /// Read the sequence list at `path` and aggregate its sequences.
    /// Only an unreadable list is an error; per-sequence problems are reported.
    pub fn parse_list(&self, path: impl AsRef<Path>) -> AnnotationResult<(Annotation, ParseReport)> {
        let path = path.as_ref();
        let list = std::fs::read_to_string(path).map_err(|source| AnnotationError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(self.parse_str(&list))
    }
}
