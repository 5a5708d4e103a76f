use crate::{
    models::{Era, MovieRecord, PreferencePacket, ScoredCandidate},
    services::{catalog::Catalog, similarity::SimilarityIndex},
};

// Scoring weights. These are design constants: contributions are tuned
// against each other so that no single signal can dominate the ranking.
const QUALITY_EXCELLENT_BONUS: f64 = 5.0; // quality_score > 7.5
const QUALITY_GOOD_BONUS: f64 = 4.0; // > 6.5
const QUALITY_DECENT_BONUS: f64 = 3.0; // > 5.5
/// Minimal participation bonus: no movie scores exactly zero for quality
/// alone. Candidates carrying nothing beyond this floor are "weak" — the
/// engine treats a shortfall of stronger candidates as its cue to invoke
/// the fallback ladder.
pub(crate) const QUALITY_FLOOR_BONUS: f64 = 1.0;
const GENRE_MATCH_BONUS: f64 = 6.0;
const EXCLUDED_GENRE_PENALTY: f64 = 3.0;
const EMOTION_GENRE_BONUS: f64 = 4.0;
const DIRECTOR_MATCH_BONUS: f64 = 3.0;
const ACTOR_TOP_BILLING_BONUS: f64 = 3.0;
const ACTOR_BILLING_DECAY: f64 = 0.5;
const ACTOR_MATCH_FLOOR: f64 = 1.0;
const ERA_MATCH_BONUS: f64 = 2.0;
const ERA_EARLY_BONUS: f64 = 1.0;
const REFERENCE_SIMILARITY_SCALE: f64 = 5.0;

/// Genres derived from a stated mood when the packet carries no explicit
/// genre request. The table steers toward what tends to fit the mood, e.g.
/// feel-good genres for a sad user.
fn mood_genres(mood: &str) -> Option<&'static [&'static str]> {
    let genres: &[&str] = match mood.trim().to_lowercase().as_str() {
        "sad" | "down" | "melancholy" => &["comedy", "family", "animation"],
        "happy" | "cheerful" | "joyful" => &["comedy", "adventure", "romance"],
        "excited" | "energetic" => &["action", "adventure", "thriller"],
        "calm" | "relaxed" | "peaceful" => &["drama", "romance", "documentary"],
        "stressed" | "angry" => &["comedy", "family", "romance"],
        "tired" => &["comedy", "family", "animation"],
        "romantic" => &["romance", "drama", "comedy"],
        _ => return None,
    };
    Some(genres)
}

/// Therapeutic steering keyed by detected emotional state. Distinct from and
/// additive with the mood table: it applies even when genres were requested
/// explicitly, and regardless of detector confidence.
fn emotion_genres(emotion: &str) -> Option<&'static [&'static str]> {
    let genres: &[&str] = match emotion.trim().to_lowercase().as_str() {
        "excited" => &["action", "adventure", "thriller", "sci-fi"],
        "sad" => &["comedy", "family", "animation", "musical"],
        "angry" | "stressed" => &["comedy", "family", "romance", "animation"],
        "calm" => &["drama", "romance", "documentary"],
        "tired" => &["comedy", "family", "animation"],
        "happy" => &["comedy", "adventure", "musical"],
        _ => return None,
    };
    Some(genres)
}

/// Loose, case-insensitive genre test: the preference is a substring of the
/// movie genre, so "sci" matches "Sci-Fi". Tolerates vocabulary drift between
/// preference extraction and catalog tagging.
fn matches_genre(movie: &MovieRecord, wanted: &str) -> Option<usize> {
    movie
        .genres
        .iter()
        .position(|g| g.to_lowercase().contains(wanted))
}

/// Quality baseline: threshold bonuses so better-rated movies start ahead,
/// with a floor bonus so nothing is scored exactly zero for quality alone.
pub(crate) fn quality_baseline(movie: &MovieRecord) -> (f64, Option<String>) {
    let quality = movie.quality_score;
    if quality > 7.5 {
        (
            QUALITY_EXCELLENT_BONUS,
            Some(format!("highly rated ({:.1}/10)", quality)),
        )
    } else if quality > 6.5 {
        (
            QUALITY_GOOD_BONUS,
            Some(format!("well rated ({:.1}/10)", quality)),
        )
    } else if quality > 5.5 {
        (
            QUALITY_DECENT_BONUS,
            Some(format!("decently rated ({:.1}/10)", quality)),
        )
    } else {
        (QUALITY_FLOOR_BONUS, None)
    }
}

/// Per-genre match bonus used by both the primary pass and the fallback
/// ladder. `wanted` must already be lowercased.
pub(crate) fn genre_bonus(movie: &MovieRecord, wanted: &[String]) -> (f64, Vec<String>) {
    let mut bonus = 0.0;
    let mut reasons = Vec::new();
    for genre in wanted {
        if let Some(position) = matches_genre(movie, genre) {
            bonus += GENRE_MATCH_BONUS;
            reasons.push(format!("{} match", movie.genres[position]));
        }
    }
    (bonus, reasons)
}

/// Scores every catalog movie against the preferences.
///
/// Contributions are independent and summed; candidates scoring zero or
/// below are dropped here, before diversity selection. The pass is fully
/// deterministic: same catalog and packet, same scores and reasons.
pub fn score_catalog<'a>(
    catalog: &'a Catalog,
    index: &SimilarityIndex,
    preferences: &PreferencePacket,
) -> Vec<ScoredCandidate<'a>> {
    // Mood-derived genres are expanded once per pass, only when no genre was
    // requested explicitly.
    let wanted_genres: Vec<String> = if preferences.genres.is_empty() {
        preferences
            .mood
            .as_deref()
            .and_then(mood_genres)
            .map(|genres| genres.iter().map(|g| g.to_string()).collect())
            .unwrap_or_default()
    } else {
        preferences.genres.iter().map(|g| g.to_lowercase()).collect()
    };
    let excluded_genres: Vec<String> = preferences
        .excluded_genres
        .iter()
        .map(|g| g.to_lowercase())
        .collect();
    let steering = preferences.emotion.as_deref().and_then(emotion_genres);
    let era = preferences.era.as_deref().and_then(Era::parse);
    let wanted_actors: Vec<String> = preferences.actors.iter().map(|a| a.to_lowercase()).collect();
    let wanted_directors: Vec<String> = preferences
        .directors
        .iter()
        .map(|d| d.to_lowercase())
        .collect();

    // A reference title that does not resolve is absorbed: the similarity
    // contribution is simply omitted.
    let reference = preferences.reference_title.as_deref().and_then(|title| {
        let found = catalog.find_by_title(title);
        if found.is_none() {
            tracing::debug!(title, "Reference title not in catalog, skipping similarity bonus");
        }
        found
    });

    catalog
        .movies()
        .iter()
        .filter_map(|movie| {
            let candidate = score_movie(
                movie,
                index,
                &wanted_genres,
                &excluded_genres,
                steering,
                preferences.emotion.as_deref(),
                era,
                preferences.era.as_deref(),
                &wanted_actors,
                &wanted_directors,
                reference,
            );
            (candidate.score > 0.0).then_some(candidate)
        })
        .collect()
}

#[allow(clippy::too_many_arguments)]
fn score_movie<'a>(
    movie: &'a MovieRecord,
    index: &SimilarityIndex,
    wanted_genres: &[String],
    excluded_genres: &[String],
    steering: Option<&'static [&'static str]>,
    emotion: Option<&str>,
    era: Option<Era>,
    era_label: Option<&str>,
    wanted_actors: &[String],
    wanted_directors: &[String],
    reference: Option<&MovieRecord>,
) -> ScoredCandidate<'a> {
    let mut score = 0.0;
    let mut reasons = Vec::new();

    let (quality, quality_reason) = quality_baseline(movie);
    score += quality;
    reasons.extend(quality_reason);

    let (genre, genre_reasons) = genre_bonus(movie, wanted_genres);
    score += genre;
    reasons.extend(genre_reasons);

    for genre in excluded_genres {
        if let Some(position) = matches_genre(movie, genre) {
            score -= EXCLUDED_GENRE_PENALTY;
            reasons.push(format!("includes disliked {}", movie.genres[position]));
        }
    }

    if let (Some(steering), Some(emotion)) = (steering, emotion) {
        let steered = steering
            .iter()
            .any(|genre| matches_genre(movie, genre).is_some());
        if steered {
            score += EMOTION_GENRE_BONUS;
            reasons.push(format!("a good fit for feeling {}", emotion.trim()));
        }
    }

    // Earlier billing earns a larger bonus, decaying per position with a
    // floor so a late-billed favourite still counts.
    for (position, actor) in movie.actors.iter().enumerate() {
        let actor_lower = actor.to_lowercase();
        if wanted_actors.iter().any(|wanted| *wanted == actor_lower) {
            let bonus = (ACTOR_TOP_BILLING_BONUS - ACTOR_BILLING_DECAY * position as f64)
                .max(ACTOR_MATCH_FLOOR);
            score += bonus;
            reasons.push(format!("features {}", actor));
        }
    }

    for director in &movie.directors {
        let director_lower = director.to_lowercase();
        if wanted_directors.iter().any(|wanted| *wanted == director_lower) {
            score += DIRECTOR_MATCH_BONUS;
            reasons.push(format!("directed by {}", director));
        }
    }

    if let (Some(era), Some(year)) = (era, movie.year) {
        if era.contains(year) {
            score += ERA_MATCH_BONUS;
            // Years in the front half of the range are the era's more
            // prototypical examples.
            if era.in_first_half(year) {
                score += ERA_EARLY_BONUS;
            }
            reasons.push(format!("a {} pick", era_label.unwrap_or_default().trim()));
        }
    }

    if let Some(reference) = reference {
        if reference.catalog_index != movie.catalog_index {
            if let Ok(cosine) = index.similarity(movie.catalog_index, reference.catalog_index) {
                if cosine > 0.0 {
                    score += cosine * REFERENCE_SIMILARITY_SCALE;
                    reasons.push(format!("similar to {}", reference.title));
                }
            }
        }
    }

    ScoredCandidate {
        movie,
        score,
        reasons,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn movie(
        index: usize,
        title: &str,
        year: Option<i32>,
        genres: &[&str],
        quality: f64,
    ) -> MovieRecord {
        MovieRecord {
            title: title.to_string(),
            year,
            genres: genres.iter().map(|g| g.to_string()).collect(),
            actors: vec![],
            directors: vec![],
            mood_tags: BTreeSet::new(),
            quality_score: quality,
            plot_text: genres.join(" "),
            catalog_index: index,
        }
    }

    fn catalog_and_index(movies: Vec<MovieRecord>) -> (Catalog, SimilarityIndex) {
        let catalog = Catalog::from_records(movies);
        let index = SimilarityIndex::build(catalog.movies());
        (catalog, index)
    }

    fn score_of<'a>(candidates: &'a [ScoredCandidate<'a>], title: &str) -> &'a ScoredCandidate<'a> {
        candidates
            .iter()
            .find(|c| c.movie.title == title)
            .expect("candidate missing")
    }

    #[test]
    fn test_scoring_is_deterministic() {
        let (catalog, index) = catalog_and_index(vec![
            movie(0, "Joyful Adventure", Some(1995), &["Comedy", "Adventure"], 8.2),
            movie(1, "Dark Night", Some(1995), &["Horror"], 7.0),
        ]);
        let mut preferences = PreferencePacket::default();
        preferences.genres.insert("comedy".to_string());
        preferences.mood = Some("sad".to_string());
        preferences.emotion = Some("excited".to_string());

        let first = score_catalog(&catalog, &index, &preferences);
        let second = score_catalog(&catalog, &index, &preferences);

        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.movie.catalog_index, b.movie.catalog_index);
            assert_eq!(a.score, b.score);
            assert_eq!(a.reasons, b.reasons);
        }
    }

    #[test]
    fn test_sad_mood_derives_feel_good_genres() {
        // Scenario: sad mood, no explicit genres. The comedy ranks first on
        // derived genre match plus quality; the others ride quality alone.
        let (catalog, index) = catalog_and_index(vec![
            movie(0, "Joyful Adventure", Some(1995), &["Comedy", "Adventure"], 8.2),
            movie(1, "Dark Night", Some(1995), &["Horror"], 7.0),
            movie(2, "Quiet Drama", Some(1994), &["Drama"], 6.0),
        ]);
        let mut preferences = PreferencePacket::default();
        preferences.mood = Some("sad".to_string());

        let candidates = score_catalog(&catalog, &index, &preferences);

        let joyful = score_of(&candidates, "Joyful Adventure");
        let dark = score_of(&candidates, "Dark Night");
        let quiet = score_of(&candidates, "Quiet Drama");
        assert!(joyful.score > dark.score);
        assert!(joyful.score > quiet.score);
        assert!(joyful.reasons.iter().any(|r| r.contains("Comedy match")));
        // The others scored on the quality baseline only
        assert_eq!(dark.reasons.len(), 1);
        assert!(dark.reasons[0].contains("well rated"));
    }

    #[test]
    fn test_mood_ignored_when_genres_explicit() {
        let (catalog, index) = catalog_and_index(vec![
            movie(0, "Gags", Some(2000), &["Comedy"], 6.0),
            movie(1, "Boo", Some(2000), &["Horror"], 6.0),
        ]);
        let mut preferences = PreferencePacket::default();
        preferences.genres.insert("horror".to_string());
        preferences.mood = Some("sad".to_string());

        let candidates = score_catalog(&catalog, &index, &preferences);
        // Mood would have favoured the comedy; explicit genres win
        assert!(score_of(&candidates, "Boo").score > score_of(&candidates, "Gags").score);
    }

    #[test]
    fn test_excluded_genre_penalised() {
        let (catalog, index) = catalog_and_index(vec![
            movie(0, "A", Some(2000), &["Comedy"], 8.0),
            movie(1, "B", Some(2000), &["Horror"], 7.0),
            movie(2, "B Prime", Some(2000), &["Horror"], 7.0),
        ]);
        let mut with_exclusion = PreferencePacket::default();
        with_exclusion.genres.insert("comedy".to_string());
        with_exclusion.genres.insert("horror".to_string());
        with_exclusion.excluded_genres.insert("horror".to_string());

        let mut without_exclusion = with_exclusion.clone();
        without_exclusion.excluded_genres.clear();

        let penalised = score_catalog(&catalog, &index, &with_exclusion);
        let unpenalised = score_catalog(&catalog, &index, &without_exclusion);

        // The exclusion strictly lowers the horror movie's score and the
        // comedy outranks it.
        assert!(score_of(&penalised, "B").score < score_of(&unpenalised, "B").score);
        assert!(score_of(&penalised, "A").score > score_of(&penalised, "B").score);
        assert!(score_of(&penalised, "B")
            .reasons
            .iter()
            .any(|r| r.contains("disliked Horror")));
    }

    #[test]
    fn test_substring_genre_matching() {
        let (catalog, index) = catalog_and_index(vec![movie(
            0,
            "Star Quest",
            Some(1999),
            &["Sci-Fi"],
            7.0,
        )]);
        let mut preferences = PreferencePacket::default();
        preferences.genres.insert("sci".to_string());

        let candidates = score_catalog(&catalog, &index, &preferences);
        assert!(score_of(&candidates, "Star Quest")
            .reasons
            .iter()
            .any(|r| r.contains("Sci-Fi match")));
    }

    #[test]
    fn test_emotion_bonus_is_additive_with_genres() {
        let (catalog, index) = catalog_and_index(vec![
            movie(0, "Fast Car", Some(2005), &["Action"], 6.0),
            movie(1, "Slow Walk", Some(2005), &["Documentary"], 6.0),
        ]);
        let mut preferences = PreferencePacket::default();
        preferences.genres.insert("action".to_string());
        preferences.emotion = Some("excited".to_string());
        preferences.emotion_confidence = 0.2; // low confidence still steers

        let candidates = score_catalog(&catalog, &index, &preferences);
        let action = score_of(&candidates, "Fast Car");
        // Quality 3.0 + genre 6.0 + emotion 4.0
        assert_eq!(action.score, 13.0);
        assert!(action.reasons.iter().any(|r| r.contains("feeling excited")));
    }

    #[test]
    fn test_actor_billing_decay_and_director_match() {
        let mut star_vehicle = movie(0, "Star Vehicle", Some(2010), &["Drama"], 6.0);
        star_vehicle.actors = vec![
            "Alice Lead".to_string(),
            "Bob Second".to_string(),
            "Carol Third".to_string(),
        ];
        let mut late_billing = movie(1, "Late Billing", Some(2010), &["Drama"], 6.0);
        late_billing.actors = vec![
            "Someone Else".to_string(),
            "Another Person".to_string(),
            "Alice Lead".to_string(),
        ];
        let mut directed = movie(2, "Auteur Work", Some(2010), &["Drama"], 6.0);
        directed.directors = vec!["Denise Auteur".to_string()];

        let (catalog, index) = catalog_and_index(vec![star_vehicle, late_billing, directed]);
        let mut preferences = PreferencePacket::default();
        preferences.actors.insert("alice lead".to_string());
        preferences.directors.insert("Denise Auteur".to_string());

        let candidates = score_catalog(&catalog, &index, &preferences);
        let top = score_of(&candidates, "Star Vehicle");
        let late = score_of(&candidates, "Late Billing");
        let auteur = score_of(&candidates, "Auteur Work");

        // 3.0 top billing vs 2.0 third billing
        assert_eq!(top.score, 3.0 + 3.0);
        assert_eq!(late.score, 3.0 + 2.0);
        assert_eq!(auteur.score, 3.0 + 3.0);
        assert!(auteur.reasons.iter().any(|r| r.contains("directed by Denise Auteur")));
    }

    #[test]
    fn test_era_bonus_with_early_half_extra() {
        let (catalog, index) = catalog_and_index(vec![
            movie(0, "Early Nineties", Some(1992), &["Drama"], 6.0),
            movie(1, "Late Nineties", Some(1998), &["Drama"], 6.0),
            movie(2, "Eighties", Some(1985), &["Drama"], 6.0),
        ]);
        let mut preferences = PreferencePacket::default();
        preferences.era = Some("90s".to_string());

        let candidates = score_catalog(&catalog, &index, &preferences);
        assert_eq!(score_of(&candidates, "Early Nineties").score, 3.0 + 2.0 + 1.0);
        assert_eq!(score_of(&candidates, "Late Nineties").score, 3.0 + 2.0);
        assert_eq!(score_of(&candidates, "Eighties").score, 3.0);
    }

    #[test]
    fn test_unknown_era_is_ignored() {
        let (catalog, index) =
            catalog_and_index(vec![movie(0, "Whenever", Some(1992), &["Drama"], 6.0)]);
        let mut preferences = PreferencePacket::default();
        preferences.era = Some("jurassic".to_string());

        let candidates = score_catalog(&catalog, &index, &preferences);
        assert_eq!(score_of(&candidates, "Whenever").score, 3.0);
    }

    #[test]
    fn test_reference_title_similarity_bonus() {
        let (catalog, index) = catalog_and_index(vec![
            movie(0, "Space War", Some(1999), &["Sci-Fi", "Action"], 6.0),
            movie(1, "Space Battle", Some(1999), &["Sci-Fi", "Action"], 6.0),
            movie(2, "Tea Party", Some(1999), &["Romance"], 6.0),
        ]);
        let mut preferences = PreferencePacket::default();
        preferences.reference_title = Some("Space War".to_string());

        let candidates = score_catalog(&catalog, &index, &preferences);
        let close = score_of(&candidates, "Space Battle");
        let far = score_of(&candidates, "Tea Party");
        assert!(close.score > far.score);
        assert!(close.reasons.iter().any(|r| r.contains("similar to Space War")));
        // The reference movie itself earns no self-similarity bonus
        assert_eq!(score_of(&candidates, "Space War").score, 3.0);
    }

    #[test]
    fn test_unresolvable_reference_title_absorbed() {
        let (catalog, index) =
            catalog_and_index(vec![movie(0, "Alone", Some(1999), &["Drama"], 6.0)]);
        let mut preferences = PreferencePacket::default();
        preferences.reference_title = Some("No Such Film".to_string());

        let candidates = score_catalog(&catalog, &index, &preferences);
        assert_eq!(score_of(&candidates, "Alone").score, 3.0);
    }

    #[test]
    fn test_all_null_packet_ranks_by_quality_alone() {
        let (catalog, index) = catalog_and_index(vec![
            movie(0, "Great", Some(2000), &["Drama"], 9.0),
            movie(1, "Fine", Some(2000), &["Drama"], 7.0),
            movie(2, "Rough", Some(2000), &["Drama"], 3.0),
        ]);
        let candidates = score_catalog(&catalog, &index, &PreferencePacket::default());

        // Everyone keeps a positive score via the floor bonus
        assert_eq!(candidates.len(), 3);
        assert_eq!(score_of(&candidates, "Great").score, 5.0);
        assert_eq!(score_of(&candidates, "Fine").score, 4.0);
        assert_eq!(score_of(&candidates, "Rough").score, 1.0);
    }

    #[test]
    fn test_empty_catalog_yields_empty_list() {
        let (catalog, index) = catalog_and_index(vec![]);
        let candidates = score_catalog(&catalog, &index, &PreferencePacket::default());
        assert!(candidates.is_empty());
    }
}
