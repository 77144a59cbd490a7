//! Case-insensitive substring search with two-phase ranking.
//!
//! # Responsibility
//! - Score a category's notes against a plain query and order the hits.
//!
//! # Invariants
//! - Binary score = title contains query + text contains query, in `{0, 1, 2}`.
//! - Notes scoring `0` are never returned.
//! - If any two survivors share a binary score, all survivors are re-ranked
//!   by frequency (title + text occurrence count), descending.
//! - Otherwise survivors are ordered by binary score, descending.
//! - Both orderings are stable with respect to the input order.
//! - The empty query is a substring of everything, so it matches every note.
//!
//! # See also
//! - `NoteRepository::query_notes`

use crate::model::document::{NoteDocument, Suggestion};
use std::collections::HashSet;

/// One searchable note.
#[derive(Debug, Clone, Copy)]
pub struct SearchCandidate<'a> {
    pub title: &'a str,
    pub text: &'a str,
    pub idx: usize,
}

impl<'a> From<&'a NoteDocument> for SearchCandidate<'a> {
    fn from(document: &'a NoteDocument) -> Self {
        Self {
            title: &document.title,
            text: &document.raw_text,
            idx: document.idx,
        }
    }
}

#[derive(Debug)]
struct Scored<'a> {
    candidate: SearchCandidate<'a>,
    binary: u8,
    frequency: usize,
}

/// Ranks `candidates` against `query`.
///
/// Returns `None` when nothing matches.
pub fn rank<'a, I>(query: &str, candidates: I) -> Option<Vec<Suggestion>>
where
    I: IntoIterator<Item = SearchCandidate<'a>>,
{
    let needle = query.to_lowercase();

    let mut scored = candidates
        .into_iter()
        .filter_map(|candidate| {
            let title = candidate.title.to_lowercase();
            let text = candidate.text.to_lowercase();
            let binary = u8::from(title.contains(&needle)) + u8::from(text.contains(&needle));
            if binary == 0 {
                return None;
            }
            Some(Scored {
                candidate,
                binary,
                frequency: title.matches(&needle).count() + text.matches(&needle).count(),
            })
        })
        .collect::<Vec<_>>();

    if scored.is_empty() {
        return None;
    }

    if has_binary_tie(&scored) {
        scored.sort_by(|left, right| right.frequency.cmp(&left.frequency));
    } else {
        scored.sort_by(|left, right| right.binary.cmp(&left.binary));
    }

    Some(
        scored
            .into_iter()
            .map(|entry| Suggestion {
                title: entry.candidate.title.to_string(),
                idx: entry.candidate.idx,
            })
            .collect(),
    )
}

fn has_binary_tie(scored: &[Scored<'_>]) -> bool {
    let mut seen = HashSet::new();
    scored.iter().any(|entry| !seen.insert(entry.binary))
}
