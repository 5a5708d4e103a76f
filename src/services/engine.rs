use crate::{
    error::AppResult,
    models::{MovieRecord, PreferencePacket, ScoredCandidate},
    services::{
        catalog::Catalog,
        fallback::{self, MatchTier},
        scorer,
        selector::{self, TieBreaking},
        similarity::SimilarityIndex,
    },
};
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::path::Path;

/// The recommendation core: a catalog plus its similarity index.
///
/// Immutable once built, so concurrent requests share it behind an `Arc`
/// with no locking. A catalog refresh builds a whole new engine and swaps
/// the shared reference; requests already holding the old one finish
/// against a consistent snapshot.
pub struct RecommendEngine {
    catalog: Catalog,
    index: SimilarityIndex,
    loaded_at: DateTime<Utc>,
}

/// A finished recommendation pass
pub struct Recommendation<'a> {
    pub picks: Vec<ScoredCandidate<'a>>,
    pub tier: MatchTier,
}

impl RecommendEngine {
    /// Builds the engine from a CSV catalog feed. Blocking and synchronous;
    /// meant to run at startup or during an explicit reload, never on the
    /// request path.
    pub fn load(path: impl AsRef<Path>) -> AppResult<RecommendEngine> {
        let catalog = Catalog::from_csv_path(path)?;
        Ok(Self::from_catalog(catalog))
    }

    pub fn from_catalog(catalog: Catalog) -> RecommendEngine {
        let index = SimilarityIndex::build(catalog.movies());
        RecommendEngine {
            catalog,
            index,
            loaded_at: Utc::now(),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn index(&self) -> &SimilarityIndex {
        &self.index
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    /// Movies most similar to a catalog title, via the similarity index
    pub fn similar_to_title(&self, title: &str, k: usize) -> AppResult<Vec<&MovieRecord>> {
        let reference = self.catalog.find_by_title(title).ok_or_else(|| {
            crate::error::AppError::NotFound(format!("movie {:?} not in catalog", title))
        })?;
        let neighbours = self.index.similar_to(reference.catalog_index, k)?;
        Ok(neighbours
            .into_iter()
            .filter_map(|idx| self.catalog.get(idx))
            .collect())
    }

    /// Runs the full pipeline: hybrid scoring, diversity selection, and the
    /// fallback ladder when the primary pass comes up short.
    ///
    /// On a non-empty catalog this returns exactly `min(limit, catalog
    /// size)` picks; an empty catalog is the only input that produces an
    /// empty result.
    pub fn recommend<'a>(
        &'a self,
        preferences: &PreferencePacket,
        limit: usize,
        already_shown: &BTreeSet<String>,
        tie_breaking: &mut TieBreaking,
    ) -> Recommendation<'a> {
        let target = limit.min(self.catalog.len());
        if target == 0 {
            return Recommendation {
                picks: Vec::new(),
                tier: MatchTier::Primary,
            };
        }

        // Candidates carrying only the minimal participation bonus are not
        // real matches; they are left for the ladder rather than allowed to
        // pad out the primary result.
        let candidates: Vec<ScoredCandidate<'a>> =
            scorer::score_catalog(&self.catalog, &self.index, preferences)
                .into_iter()
                .filter(|c| c.score > scorer::QUALITY_FLOOR_BONUS)
                .collect();
        let scored = candidates.len();
        let mut picks = selector::select_diverse(candidates, target, already_shown, tie_breaking);
        let mut tier = MatchTier::Primary;

        if picks.len() < target {
            tracing::debug!(
                scored,
                selected = picks.len(),
                target,
                "Primary pass short, invoking fallback ladder"
            );
            let mut exclude: BTreeSet<String> = already_shown.clone();
            exclude.extend(picks.iter().map(|c| c.movie.title.to_lowercase()));

            let (extra, fallback_tier) =
                fallback::run(&self.catalog, preferences, target - picks.len(), &exclude);
            picks.extend(extra);
            tier = fallback_tier;
        }

        picks.truncate(target);
        Recommendation { picks, tier }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movie(title: &str, year: i32, genres: &[&str], quality: f64) -> MovieRecord {
        MovieRecord {
            title: title.to_string(),
            year: Some(year),
            genres: genres.iter().map(|g| g.to_string()).collect(),
            actors: vec![],
            directors: vec![],
            mood_tags: BTreeSet::new(),
            quality_score: quality,
            plot_text: genres.join(" "),
            catalog_index: 0,
        }
    }

    fn engine(movies: Vec<MovieRecord>) -> RecommendEngine {
        RecommendEngine::from_catalog(Catalog::from_records(movies))
    }

    fn titles<'a>(recommendation: &'a Recommendation<'a>) -> Vec<&'a str> {
        recommendation
            .picks
            .iter()
            .map(|c| c.movie.title.as_str())
            .collect()
    }

    #[test]
    fn test_primary_path_fills_request() {
        let engine = engine(vec![
            movie("Joyful Adventure", 1995, &["Comedy", "Adventure"], 8.2),
            movie("Dark Night", 1995, &["Horror"], 7.0),
            movie("Quiet Drama", 1984, &["Drama"], 6.0),
        ]);
        let mut preferences = PreferencePacket::default();
        preferences.mood = Some("sad".to_string());

        let result = engine.recommend(
            &preferences,
            3,
            &BTreeSet::new(),
            &mut TieBreaking::Stable,
        );

        assert_eq!(result.tier, MatchTier::Primary);
        assert_eq!(titles(&result)[0], "Joyful Adventure");
        assert_eq!(result.picks.len(), 3);
    }

    #[test]
    fn test_never_empty_for_any_packet() {
        let engine = engine(vec![
            movie("A", 1990, &["Comedy"], 4.0),
            movie("B", 1995, &["Drama"], 4.5),
            movie("C", 2000, &["Horror"], 4.2),
            movie("D", 2005, &["Romance"], 4.8),
        ]);

        // A packet matching nothing, with a low-quality catalog
        let mut hopeless = PreferencePacket::default();
        hopeless.genres.insert("western".to_string());

        for preferences in [PreferencePacket::default(), hopeless] {
            let result = engine.recommend(
                &preferences,
                3,
                &BTreeSet::new(),
                &mut TieBreaking::Stable,
            );
            assert_eq!(result.picks.len(), 3, "packet {:?}", preferences);
        }
    }

    #[test]
    fn test_fallback_scenario_quality_tier() {
        // Five movies, none Western, all between 4.0 and 5.0: tier 1's
        // quality floor rejects everything, tier 2 returns the top three.
        let engine = engine(vec![
            movie("A", 1990, &["Comedy"], 4.2),
            movie("B", 1991, &["Drama"], 5.0),
            movie("C", 1992, &["Romance"], 4.8),
            movie("D", 1993, &["Action"], 4.0),
            movie("E", 1994, &["Horror"], 4.5),
        ]);
        let mut preferences = PreferencePacket::default();
        preferences.genres.insert("western".to_string());

        let result = engine.recommend(
            &preferences,
            3,
            &BTreeSet::new(),
            &mut TieBreaking::Stable,
        );

        assert_eq!(result.tier, MatchTier::QualityFallback);
        assert_eq!(titles(&result), vec!["B", "C", "E"]);
    }

    #[test]
    fn test_session_memory_avoids_repeats() {
        let engine = engine(vec![
            movie("First Comedy", 1995, &["Comedy"], 8.0),
            movie("Second Comedy", 2005, &["Comedy"], 7.5),
            movie("Third Comedy", 2015, &["Comedy"], 7.0),
        ]);
        let mut preferences = PreferencePacket::default();
        preferences.genres.insert("comedy".to_string());

        let first = engine.recommend(
            &preferences,
            1,
            &BTreeSet::new(),
            &mut TieBreaking::Stable,
        );
        let shown: BTreeSet<String> = titles(&first)
            .into_iter()
            .map(|t| t.to_lowercase())
            .collect();
        let second = engine.recommend(&preferences, 1, &shown, &mut TieBreaking::Stable);

        assert_ne!(titles(&first), titles(&second));
    }

    #[test]
    fn test_requesting_more_than_catalog_returns_catalog() {
        let engine = engine(vec![
            movie("One", 1990, &["Drama"], 6.0),
            movie("Two", 2000, &["Comedy"], 7.0),
        ]);
        let result = engine.recommend(
            &PreferencePacket::default(),
            10,
            &BTreeSet::new(),
            &mut TieBreaking::Stable,
        );
        assert_eq!(result.picks.len(), 2);
    }

    #[test]
    fn test_empty_catalog_is_the_only_empty_result() {
        let engine = engine(vec![]);
        let result = engine.recommend(
            &PreferencePacket::default(),
            3,
            &BTreeSet::new(),
            &mut TieBreaking::Stable,
        );
        assert!(result.picks.is_empty());
        assert_eq!(result.tier, MatchTier::Primary);
    }

    #[test]
    fn test_similar_to_title() {
        let engine = engine(vec![
            movie("Space War", 1999, &["Sci-Fi", "Action"], 7.0),
            movie("Space Battle", 2001, &["Sci-Fi", "Action"], 7.5),
            movie("Tea Party", 1995, &["Romance"], 6.0),
        ]);

        let similar = engine.similar_to_title("space war", 1).unwrap();
        assert_eq!(similar[0].title, "Space Battle");

        assert!(engine.similar_to_title("unknown", 1).is_err());
    }
}
