//! Conservative label propagation from a labeled `source` onto a `target` annotation.
//!
//! Every overlapping `(target, source)` pair whose tracks match hands the source
//! label to the target's `(segment, track)` key. Pairs that fail the track test are
//! skipped, and target entries that never match are left out of the result. Nothing
//! is scored, voted on, or guessed.
//!
//! When several matching source entries overlap one target key with different
//! labels, the last one in co-iteration order (source start time) wins. The
//! occurrences are counted in [`PropagationReport::conflicts`] so callers can see them.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::annotation::{Annotation, TrackId};

/// Decides whether a target track and a source track denote the same entity.
pub trait TrackMatch {
    fn matches(&self, target: &TrackId, source: &TrackId) -> bool;
}

/// Tracks match when their identifiers are equal. Both annotations must then share
/// one track numbering (e.g. the same face tracker output).
#[derive(Debug, Clone, Copy, Default)]
pub struct SameTrack;

impl TrackMatch for SameTrack {
    fn matches(&self, target: &TrackId, source: &TrackId) -> bool {
        target == source
    }
}

impl<F> TrackMatch for F
where
    F: Fn(&TrackId, &TrackId) -> bool,
{
    fn matches(&self, target: &TrackId, source: &TrackId) -> bool {
        self(target, source)
    }
}

/// Counters collected during one propagation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PropagationReport {
    /// Overlapping pairs produced by co-iteration.
    pub overlapping_pairs: usize,
    /// Overlapping pairs skipped because their tracks did not match.
    pub track_mismatches: usize,
    /// Labels written into the result (including overwrites).
    pub transferred: usize,
    /// Overwrites that replaced a different label on the same key.
    pub conflicts: usize,
    /// Target keys absent from the result.
    pub dropped: usize,
    /// Track identifiers present in both annotations.
    pub shared_tracks: usize,
}

#[derive(Debug, Clone)]
pub struct Propagation {
    pub annotation: Annotation,
    pub report: PropagationReport,
}

/// Propagation engine parameterized by its track predicate.
#[derive(Debug, Clone, Default)]
pub struct ConservativeTagger<M = SameTrack> {
    matcher: M,
}

impl ConservativeTagger<SameTrack> {
    pub fn new() -> Self {
        Self { matcher: SameTrack }
    }
}

impl<M: TrackMatch> ConservativeTagger<M> {
    pub fn with_matcher(matcher: M) -> Self {
        Self { matcher }
    }

    /// Label `target` entries from overlapping, track-matching `source` entries.
    /// The result carries the target's `uri` and `modality`.
    pub fn tag(&self, target: &Annotation, source: &Annotation) -> Propagation {
        let mut result = Annotation::new();
        result.set_metadata(
            target.uri().map(String::from),
            target.modality().map(String::from),
        );

        let source_tracks = source.tracks();
        let mut report = PropagationReport {
            shared_tracks: target
                .tracks()
                .iter()
                .filter(|t| source_tracks.contains(*t))
                .count(),
            ..Default::default()
        };

        for (t, s) in target.co_iter(source) {
            report.overlapping_pairs += 1;
            if !self.matcher.matches(t.track, s.track) {
                report.track_mismatches += 1;
                continue;
            }
            report.transferred += 1;
            if let Some(previous) = result.add(t.segment, t.track.clone(), s.label.clone()) {
                if &previous != s.label {
                    report.conflicts += 1;
                    debug!(
                        segment = %t.segment,
                        track = %t.track,
                        replaced = %previous,
                        by = %s.label,
                        "conflicting source labels, keeping the later one"
                    );
                }
            }
        }

        report.dropped = target.len() - result.len();

        if report.overlapping_pairs > 0 && report.transferred == 0 {
            warn!(
                pairs = report.overlapping_pairs,
                shared_tracks = report.shared_tracks,
                "overlaps found but no track ever matched; target and source may not share a track space"
            );
        }
        info!(
            target = target.len(),
            source = source.len(),
            labeled = result.len(),
            dropped = report.dropped,
            conflicts = report.conflicts,
            "conservative propagation done"
        );

        Propagation {
            annotation: result,
            report,
        }
    }
}

/// Propagate with the default [`SameTrack`] predicate.
pub fn propagate(target: &Annotation, source: &Annotation) -> Propagation {
    ConservativeTagger::new().tag(target, source)
}
