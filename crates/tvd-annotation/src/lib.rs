//! # tvd-annotation: temporal annotations for TV-series workflows
//!
//! Time intervals tagged with a track and a label, the overlap co-iteration that
//! pairs entries of two annotations, and conservative label propagation built on it.
//!
//! ```text
//!  sequence list + logs ──► talking_face ──► Annotation (talking faces)
//!                                                   │
//!  face clustering (external) ──► Annotation ───────┤ co_iter
//!                                                   ▼
//!                                           propagation ──► json::dump
//! ```

pub mod annotation;
pub mod co_iter;
pub mod error;
pub mod json;
pub mod number;
pub mod propagation;
pub mod segment;
pub mod talking_face;

pub use annotation::{Annotation, Entry, Label, TrackId};
pub use co_iter::CoIter;
pub use error::{AnnotationError, AnnotationResult, ParseError};
pub use number::Number;
pub use propagation::{
    propagate, ConservativeTagger, Propagation, PropagationReport, SameTrack, TrackMatch,
};
pub use segment::Segment;
pub use talking_face::{
    ParseReport, ParsedSequence, SequenceDescriptor, SequenceOutcome, TalkingFaceParser,
};
