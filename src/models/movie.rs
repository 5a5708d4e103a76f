use serde::Serialize;
use std::collections::BTreeSet;

/// A single catalog entry, immutable after catalog load
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MovieRecord {
    /// Title, unique within the catalog under case-insensitive comparison
    pub title: String,
    pub year: Option<i32>,
    /// Source-ordered genre list with duplicates removed
    pub genres: Vec<String>,
    /// Cast, top-billed first
    pub actors: Vec<String>,
    pub directors: Vec<String>,
    /// Free-form mood descriptors, may be empty
    pub mood_tags: BTreeSet<String>,
    /// Externally supplied rating on a 0-10 scale, 0 if unknown
    pub quality_score: f64,
    /// Text used for similarity vectorization only; synthesized from genres
    /// when the source has no real plot text
    pub plot_text: String,
    /// Position in the similarity index ordering. Dense 0..N-1, assigned once
    /// at load time; the join key between the catalog and the matrix rows.
    pub catalog_index: usize,
}

impl MovieRecord {
    /// The movie's decade (e.g. 1994 -> 1990), if the year is known
    pub fn decade(&self) -> Option<i32> {
        self.year.map(|y| y / 10 * 10)
    }

    /// Case-insensitive title comparison
    pub fn title_matches(&self, other: &str) -> bool {
        self.title.eq_ignore_ascii_case(other)
    }
}

/// A movie paired with its ranking score for one scoring pass.
///
/// `reasons` exists purely so responses can explain a pick; it carries no
/// ranking semantics.
#[derive(Debug, Clone)]
pub struct ScoredCandidate<'a> {
    pub movie: &'a MovieRecord,
    pub score: f64,
    pub reasons: Vec<String>,
}
