//! Temporal annotation: a set of `(segment, track, label)` triples.
//!
//! A `(segment, track)` key holds at most one label; adding to an existing key
//! overwrites it. Traversal is always sorted by segment start (then end, then track)
//! so every consumer sees the same order for the same content.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::co_iter::CoIter;
use crate::error::{AnnotationError, AnnotationResult};
use crate::number::Number;
use crate::segment::Segment;

/// Identifier of a tracked entity (face track, speaker) inside one annotation.
/// Numbers and names are distinct: `1` and `"1"` are different tracks.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TrackId {
    Number(Number),
    Name(String),
}

/// Value attached to a `(segment, track)` key: a cluster name, speaker identity, etc.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Label {
    Number(Number),
    Name(String),
}

macro_rules! scalar_conversions {
    ($ty:ident) => {
        impl From<Number> for $ty {
            fn from(n: Number) -> Self {
                $ty::Number(n)
            }
        }

        impl From<i64> for $ty {
            fn from(n: i64) -> Self {
                $ty::Number(Number::Int(n))
            }
        }

        impl From<i32> for $ty {
            fn from(n: i32) -> Self {
                $ty::Number(Number::Int(i64::from(n)))
            }
        }

        impl From<u32> for $ty {
            fn from(n: u32) -> Self {
                $ty::Number(Number::Int(i64::from(n)))
            }
        }

        impl From<u64> for $ty {
            fn from(n: u64) -> Self {
                $ty::Number(Number::from(n))
            }
        }

        impl From<&str> for $ty {
            fn from(s: &str) -> Self {
                $ty::Name(s.to_string())
            }
        }

        impl From<String> for $ty {
            fn from(s: String) -> Self {
                $ty::Name(s)
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self {
                    $ty::Number(n) => write!(f, "{}", n),
                    $ty::Name(s) => write!(f, "{:?}", s),
                }
            }
        }
    };
}

scalar_conversions!(TrackId);
scalar_conversions!(Label);

/// Borrowed view of one annotation triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entry<'a> {
    pub segment: Segment,
    pub track: &'a TrackId,
    pub label: &'a Label,
}

#[derive(Debug, Clone, Default)]
pub struct Annotation {
    uri: Option<String>,
    modality: Option<String>,
    entries: BTreeMap<(Segment, TrackId), Label>,
}

impl Annotation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resource the annotation describes (e.g. an episode identifier).
    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    pub fn with_modality(mut self, modality: impl Into<String>) -> Self {
        self.modality = Some(modality.into());
        self
    }

    pub fn uri(&self) -> Option<&str> {
        self.uri.as_deref()
    }

    pub fn modality(&self) -> Option<&str> {
        self.modality.as_deref()
    }

    pub(crate) fn set_metadata(&mut self, uri: Option<String>, modality: Option<String>) {
        self.uri = uri;
        self.modality = modality;
    }

    /// Insert or overwrite the label of `(segment, track)`. Returns the replaced label.
    pub fn add(
        &mut self,
        segment: Segment,
        track: impl Into<TrackId>,
        label: impl Into<Label>,
    ) -> Option<Label> {
        self.entries.insert((segment, track.into()), label.into())
    }

    pub fn get(&self, segment: Segment, track: &TrackId) -> AnnotationResult<&Label> {
        self.entries
            .get(&(segment, track.clone()))
            .ok_or_else(|| AnnotationError::NotFound {
                segment,
                track: track.clone(),
            })
    }

    pub fn contains(&self, segment: Segment, track: &TrackId) -> bool {
        self.entries.contains_key(&(segment, track.clone()))
    }

    pub fn remove(&mut self, segment: Segment, track: &TrackId) -> Option<Label> {
        self.entries.remove(&(segment, track.clone()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries sorted by segment start, then end, then track.
    pub fn iter(&self) -> impl Iterator<Item = Entry<'_>> + '_ {
        self.entries.iter().map(|((segment, track), label)| Entry {
            segment: *segment,
            track,
            label,
        })
    }

    /// `(segment, track)` keys in traversal order.
    pub fn keys(&self) -> impl Iterator<Item = (Segment, &TrackId)> + '_ {
        self.entries.keys().map(|(segment, track)| (*segment, track))
    }

    pub fn tracks(&self) -> BTreeSet<&TrackId> {
        self.entries.keys().map(|(_, track)| track).collect()
    }

    pub fn labels(&self) -> BTreeSet<&Label> {
        self.entries.values().collect()
    }

    /// Copy of the entries whose label is in `labels`. Metadata is kept.
    pub fn subset<'l>(&self, labels: impl IntoIterator<Item = &'l Label>) -> Annotation {
        let wanted: BTreeSet<&Label> = labels.into_iter().collect();
        let entries = self
            .entries
            .iter()
            .filter(|(_, label)| wanted.contains(label))
            .map(|(key, label)| (key.clone(), label.clone()))
            .collect();
        Annotation {
            uri: self.uri.clone(),
            modality: self.modality.clone(),
            entries,
        }
    }

    /// Lazily pair every entry of `self` with every entry of `other` whose segment
    /// overlaps it, ordered by `self` start then `other` start.
    pub fn co_iter<'a>(&'a self, other: &'a Annotation) -> CoIter<'a> {
        CoIter::new(self, other)
    }
}

/// Two annotations are equal when they hold the same triples. `uri` and `modality`
/// are descriptive and do not take part in the comparison.
impl PartialEq for Annotation {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl Eq for Annotation {}

impl<T: Into<TrackId>, L: Into<Label>> FromIterator<(Segment, T, L)> for Annotation {
    fn from_iter<I: IntoIterator<Item = (Segment, T, L)>>(iter: I) -> Self {
        let mut annotation = Annotation::new();
        annotation.extend(iter);
        annotation
    }
}

impl<T: Into<TrackId>, L: Into<Label>> Extend<(Segment, T, L)> for Annotation {
    fn extend<I: IntoIterator<Item = (Segment, T, L)>>(&mut self, iter: I) {
        for (segment, track, label) in iter {
            self.add(segment, track, label);
        }
    }
}
