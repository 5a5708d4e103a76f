use crate::models::ScoredCandidate;
use rand::{rngs::StdRng, seq::SliceRandom};
use std::collections::BTreeSet;

// Diversity scoring: how much a candidate differs from what is already
// selected, plus a quality nudge.
const LOW_GENRE_OVERLAP_POINTS: u32 = 4; // at most one shared genre
const SOME_GENRE_OVERLAP_POINTS: u32 = 2; // at most two shared genres
const NEW_DECADE_POINTS: u32 = 3;
const NEW_DIRECTOR_POINTS: u32 = 2;
const HIGH_QUALITY_POINTS: u32 = 2; // quality >= 7.0
const GOOD_QUALITY_POINTS: u32 = 1; // quality >= 6.0

// The first two picks are accepted permissively so the result set is never
// empty; after that a candidate has to bring real variety.
const REQUIRED_DIVERSITY: u32 = 4;
const REQUIRED_DIVERSITY_EARLY: u32 = 2;

/// Quality floor for the relaxed second pass
const RELAXED_QUALITY_FLOOR: f64 = 5.0;

/// How same-score ties are ordered before the diversity pass.
///
/// Shuffling only ever permutes candidates with exactly equal scores: a
/// lower-scored movie can never outrank a higher-scored one. `Stable` keeps
/// the full ordering deterministic (quality, then catalog index).
pub enum TieBreaking {
    Stable,
    Shuffled(StdRng),
}

/// Selects the final top-N from score-ranked candidates, discouraging
/// near-duplicate results.
///
/// Candidates whose title is in `already_shown` (lowercased titles) are
/// excluded from consideration entirely. If the diversity pass cannot fill
/// `limit` slots, a relaxed second pass accepts any remaining candidate of
/// decent quality, ignoring diversity.
pub fn select_diverse<'a>(
    candidates: Vec<ScoredCandidate<'a>>,
    limit: usize,
    already_shown: &BTreeSet<String>,
    tie_breaking: &mut TieBreaking,
) -> Vec<ScoredCandidate<'a>> {
    let mut candidates: Vec<ScoredCandidate<'a>> = candidates
        .into_iter()
        .filter(|c| !already_shown.contains(&c.movie.title.to_lowercase()))
        .collect();

    candidates.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(
                b.movie
                    .quality_score
                    .partial_cmp(&a.movie.quality_score)
                    .unwrap_or(std::cmp::Ordering::Equal),
            )
            .then(a.movie.catalog_index.cmp(&b.movie.catalog_index))
    });

    if let TieBreaking::Shuffled(rng) = tie_breaking {
        shuffle_equal_score_runs(&mut candidates, rng);
    }

    let mut selected: Vec<ScoredCandidate<'a>> = Vec::new();
    let mut rejected: Vec<ScoredCandidate<'a>> = Vec::new();
    let mut used_genres: BTreeSet<String> = BTreeSet::new();
    let mut used_decades: BTreeSet<i32> = BTreeSet::new();
    let mut used_directors: BTreeSet<String> = BTreeSet::new();

    for candidate in candidates {
        if selected.len() >= limit {
            break;
        }

        let movie = candidate.movie;
        let genres: BTreeSet<String> = movie.genres.iter().map(|g| g.to_lowercase()).collect();
        let directors: BTreeSet<String> =
            movie.directors.iter().map(|d| d.to_lowercase()).collect();

        let mut diversity = 0u32;
        let overlap = genres.intersection(&used_genres).count();
        if overlap <= 1 {
            diversity += LOW_GENRE_OVERLAP_POINTS;
        } else if overlap <= 2 {
            diversity += SOME_GENRE_OVERLAP_POINTS;
        }
        if let Some(decade) = movie.decade() {
            if !used_decades.contains(&decade) {
                diversity += NEW_DECADE_POINTS;
            }
        }
        if used_directors.intersection(&directors).next().is_none() {
            diversity += NEW_DIRECTOR_POINTS;
        }
        if movie.quality_score >= 7.0 {
            diversity += HIGH_QUALITY_POINTS;
        } else if movie.quality_score >= 6.0 {
            diversity += GOOD_QUALITY_POINTS;
        }

        let required = if selected.len() >= 2 {
            REQUIRED_DIVERSITY
        } else {
            REQUIRED_DIVERSITY_EARLY
        };

        if diversity >= required {
            used_genres.extend(genres);
            if let Some(decade) = movie.decade() {
                used_decades.insert(decade);
            }
            used_directors.extend(directors);
            selected.push(candidate);
        } else {
            rejected.push(candidate);
        }
    }

    // Relaxed second pass: top up from what the diversity pass turned away,
    // still in score order, accepting anything of decent quality.
    if selected.len() < limit {
        for candidate in rejected {
            if selected.len() >= limit {
                break;
            }
            if candidate.movie.quality_score >= RELAXED_QUALITY_FLOOR {
                selected.push(candidate);
            }
        }
    }

    selected
}

/// Shuffles runs of exactly equal scores in place. Runs never span score
/// tiers, so the overall ranking is preserved.
fn shuffle_equal_score_runs(candidates: &mut [ScoredCandidate<'_>], rng: &mut StdRng) {
    let mut start = 0;
    while start < candidates.len() {
        let mut end = start + 1;
        while end < candidates.len() && candidates[end].score == candidates[start].score {
            end += 1;
        }
        candidates[start..end].shuffle(rng);
        start = end;
    }
}
