//! In-memory line history with a browsing position.

use crate::unicode::{index_all, index_all_bck, index_all_bck_fold, index_all_fold};
use std::collections::VecDeque;

/// Result of stepping toward newer entries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Newer {
    /// A newer entry.
    Entry(Vec<char>),
    /// Stepped past the newest entry, back to the line being edited.
    Current,
}

/// A search hit: the entry and where the pattern starts in it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchHit {
    pub entry: Vec<char>,
    pub offset: usize,
}

/// Bounded list of submitted lines, oldest first.
///
/// The browsing position runs from 0 (oldest) to `len()`, which stands for
/// the line currently being edited.
#[derive(Clone, Debug)]
pub struct History {
    entries: VecDeque<Vec<char>>,
    limit: usize,
    fold: bool,
    pos: usize,
}

impl History {
    /// `limit` of 0 disables history; `fold` makes search ignore ASCII case.
    #[must_use]
    pub fn new(limit: usize, fold: bool) -> Self {
        Self {
            entries: VecDeque::new(),
            limit,
            fold,
            pos: 0,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True when not browsing.
    #[must_use]
    pub fn at_current(&self) -> bool {
        self.pos == self.entries.len()
    }

    /// Append a line and stop browsing. Empty lines and repeats of the
    /// newest entry are skipped.
    pub fn push(&mut self, line: &[char]) {
        if self.limit > 0
            && !line.is_empty()
            && self.entries.back().is_none_or(|last| last.as_slice() != line)
        {
            self.entries.push_back(line.to_vec());
            while self.entries.len() > self.limit {
                self.entries.pop_front();
            }
        }
        self.reset_position();
    }

    /// Stop browsing.
    pub fn reset_position(&mut self) {
        self.pos = self.entries.len();
    }

    /// Step to the next older entry.
    pub fn older(&mut self) -> Option<Vec<char>> {
        if self.pos == 0 {
            return None;
        }
        self.pos -= 1;
        self.entries.get(self.pos).cloned()
    }

    /// Step to the next newer entry, or back to the edited line.
    pub fn newer(&mut self) -> Option<Newer> {
        if self.at_current() {
            return None;
        }
        self.pos += 1;
        Some(match self.entries.get(self.pos) {
            Some(entry) => Newer::Entry(entry.clone()),
            None => Newer::Current,
        })
    }

    /// Find the nearest entry containing `pattern`, older than the current
    /// position when `backward`, newer otherwise, and move there.
    pub fn search(&mut self, pattern: &[char], backward: bool) -> Option<SearchHit> {
        let candidates: Vec<usize> = if backward {
            (0..self.pos).rev().collect()
        } else {
            (self.pos + 1..self.entries.len()).collect()
        };
        for idx in candidates {
            let entry = &self.entries[idx];
            let found = match (backward, self.fold) {
                (true, false) => index_all_bck(entry, pattern),
                (true, true) => index_all_bck_fold(entry, pattern),
                (false, false) => index_all(entry, pattern),
                (false, true) => index_all_fold(entry, pattern),
            };
            if let Some(offset) = found {
                self.pos = idx;
                return Some(SearchHit {
                    entry: entry.clone(),
                    offset,
                });
            }
        }
        None
    }
}
