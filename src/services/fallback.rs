use crate::{
    models::{PreferencePacket, ScoredCandidate},
    services::{catalog::Catalog, scorer},
};
use serde::Serialize;
use std::collections::BTreeSet;

/// Stricter quality floor for the genre-only retry: when the primary pass
/// came up short, weak matches are not worth surfacing.
const GENRE_RETRY_QUALITY_FLOOR: f64 = 5.5;

/// Which stage of the pipeline produced a result set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchTier {
    /// Hybrid scoring plus diversity selection
    Primary,
    /// Genre-only retry from the mood/emotion fallback table
    GenreFallback,
    /// Quality-only sampling, all preference signals ignored
    QualityFallback,
}

/// Small fixed genre sets for the genre-only retry. Deliberately simpler
/// than the scorer's mood table: one signal, one set.
fn fallback_genres(preferences: &PreferencePacket) -> &'static [&'static str] {
    let signal = preferences
        .mood
        .as_deref()
        .or(preferences.emotion.as_deref())
        .map(|s| s.trim().to_lowercase());
    match signal.as_deref() {
        Some("sad") | Some("tired") => &["comedy", "family", "animation"],
        Some("excited") => &["action", "adventure", "thriller"],
        Some("angry") | Some("stressed") => &["comedy", "family", "romance"],
        _ => &["comedy", "drama", "romance"],
    }
}

/// Runs the ladder: genre-only retry first, then quality-only sampling.
///
/// Returns up to `limit` candidates not named in `exclude` (lowercased
/// titles), with the deepest tier used. As a last resort the quality tier
/// re-admits excluded titles, so on a non-empty catalog the ladder never
/// returns fewer than `min(limit, catalog size)` results. An empty catalog
/// is the only input that yields an empty, non-error result.
pub fn run<'a>(
    catalog: &'a Catalog,
    preferences: &PreferencePacket,
    limit: usize,
    exclude: &BTreeSet<String>,
) -> (Vec<ScoredCandidate<'a>>, MatchTier) {
    if catalog.is_empty() || limit == 0 {
        return (Vec::new(), MatchTier::GenreFallback);
    }

    let mut picks = genre_only(catalog, preferences, limit, exclude);
    let mut tier = MatchTier::GenreFallback;

    if picks.len() < limit {
        tier = MatchTier::QualityFallback;
        let mut taken: BTreeSet<String> = exclude.clone();
        taken.extend(picks.iter().map(|c| c.movie.title.to_lowercase()));
        picks.extend(quality_only(catalog, limit - picks.len(), &taken));
    }

    // Exclusions may have eaten the whole catalog; honor the result-count
    // guarantee by re-admitting shown titles rather than running short.
    if picks.len() < limit {
        let taken: BTreeSet<String> =
            picks.iter().map(|c| c.movie.title.to_lowercase()).collect();
        picks.extend(quality_only(catalog, limit - picks.len(), &taken));
    }

    tracing::debug!(requested = limit, returned = picks.len(), ?tier, "Fallback ladder used");

    (picks, tier)
}

/// Tier 1: genre match against the fallback table plus the quality baseline,
/// gated on a strict quality floor instead of any-positive-score.
fn genre_only<'a>(
    catalog: &'a Catalog,
    preferences: &PreferencePacket,
    limit: usize,
    exclude: &BTreeSet<String>,
) -> Vec<ScoredCandidate<'a>> {
    let wanted: Vec<String> = fallback_genres(preferences)
        .iter()
        .map(|g| g.to_string())
        .collect();

    let mut candidates: Vec<ScoredCandidate<'a>> = catalog
        .movies()
        .iter()
        .filter(|movie| !exclude.contains(&movie.title.to_lowercase()))
        .filter(|movie| movie.quality_score > GENRE_RETRY_QUALITY_FLOOR)
        .filter_map(|movie| {
            let (genre, mut reasons) = scorer::genre_bonus(movie, &wanted);
            if genre == 0.0 {
                return None;
            }
            let (quality, quality_reason) = scorer::quality_baseline(movie);
            reasons.extend(quality_reason);
            Some(ScoredCandidate {
                movie,
                score: genre + quality,
                reasons,
            })
        })
        .collect();

    sort_candidates(&mut candidates);
    candidates.truncate(limit);
    candidates
}

/// Tier 2: the highest-rated movies in the catalog, ties broken by catalog
/// index. All preference signals are ignored.
fn quality_only<'a>(
    catalog: &'a Catalog,
    limit: usize,
    exclude: &BTreeSet<String>,
) -> Vec<ScoredCandidate<'a>> {
    let mut candidates: Vec<ScoredCandidate<'a>> = catalog
        .movies()
        .iter()
        .filter(|movie| !exclude.contains(&movie.title.to_lowercase()))
        .map(|movie| ScoredCandidate {
            movie,
            score: movie.quality_score,
            reasons: vec![format!("a top-rated pick ({:.1}/10)", movie.quality_score)],
        })
        .collect();

    sort_candidates(&mut candidates);
    candidates.truncate(limit);
    candidates
}

fn sort_candidates(candidates: &mut [ScoredCandidate<'_>]) {
    candidates.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.movie.catalog_index.cmp(&b.movie.catalog_index))
    });
}
