//! Overlap co-iteration between two annotations (sweep line over start times).
//!
//! Both sides are walked in start order. Right-hand entries that started at or
//! before the current left start are kept in an active list until they end; entries
//! starting strictly inside the current left segment are found by scanning ahead
//! without consuming them. On inputs where segments rarely overlap within one side,
//! the active list stays small and the walk is close to linear.

use std::iter::FusedIterator;

use crate::annotation::{Annotation, Entry};

/// Iterator over `(left, right)` entry pairs whose segments overlap.
///
/// Pairs come ordered by left start, then right start. Created by
/// [`Annotation::co_iter`]; every call starts a fresh traversal.
pub struct CoIter<'a> {
    left: Vec<Entry<'a>>,
    right: Vec<Entry<'a>>,
    left_pos: usize,
    current: Option<Entry<'a>>,
    /// First right entry not yet admitted into `active`.
    next_right: usize,
    /// Admitted right entries still alive at the current left start, in start order.
    active: Vec<usize>,
    pending: Vec<usize>,
    pending_pos: usize,
}

impl<'a> CoIter<'a> {
    pub(crate) fn new(left: &'a Annotation, right: &'a Annotation) -> Self {
        Self {
            left: left.iter().collect(),
            right: right.iter().collect(),
            left_pos: 0,
            current: None,
            next_right: 0,
            active: Vec::new(),
            pending: Vec::new(),
            pending_pos: 0,
        }
    }

    /// Move to the next left entry and collect its overlapping right entries.
    fn advance(&mut self) -> bool {
        let Some(entry) = self.left.get(self.left_pos).copied() else {
            return false;
        };
        self.left_pos += 1;
        self.current = Some(entry);

        let start = entry.segment.start();
        let end = entry.segment.end();
        let right = &self.right;

        while self.next_right < right.len() && right[self.next_right].segment.start() <= start {
            self.active.push(self.next_right);
            self.next_right += 1;
        }
        // left starts never decrease, so an entry ending here is done for good
        self.active.retain(|&r| right[r].segment.end() > start);

        self.pending.clear();
        self.pending_pos = 0;
        self.pending.extend_from_slice(&self.active);
        self.pending.extend(
            (self.next_right..right.len()).take_while(|&r| right[r].segment.start() < end),
        );
        true
    }
}

impl<'a> Iterator for CoIter<'a> {
    type Item = (Entry<'a>, Entry<'a>);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let (Some(current), Some(&r)) = (self.current, self.pending.get(self.pending_pos)) {
                self.pending_pos += 1;
                return Some((current, self.right[r]));
            }
            if !self.advance() {
                self.current = None;
                return None;
            }
        }
    }
}

impl FusedIterator for CoIter<'_> {}
