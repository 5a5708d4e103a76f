use crate::{error::AppResult, models::PreferencePacket};
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;

/// Turns free-form user text into a structured preference packet.
///
/// The recommendation core never parses text itself; it only consumes the
/// packet. Keeping this behind a trait lets the service swap in a remote
/// NLP extractor without touching the scoring pipeline.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PreferenceExtractor: Send + Sync {
    async fn extract(&self, text: &str) -> AppResult<PreferencePacket>;
}

/// Keyword table mapping catalog genres to the words people actually say
const GENRE_KEYWORDS: &[(&str, &[&str])] = &[
    ("action", &["action", "fight", "martial arts", "superhero"]),
    ("comedy", &["comedy", "funny", "laugh", "hilarious", "humor"]),
    ("drama", &["drama", "dramatic", "serious", "emotional"]),
    ("horror", &["horror", "scary", "frightening", "spooky"]),
    ("thriller", &["thriller", "suspense", "suspenseful"]),
    ("romance", &["romance", "romantic", "love story"]),
    (
        "sci-fi",
        &["sci-fi", "science fiction", "futuristic", "aliens", "space"],
    ),
    ("animation", &["animation", "animated", "cartoon"]),
    ("documentary", &["documentary", "true story", "factual"]),
    ("fantasy", &["fantasy", "magic", "magical", "wizard"]),
    ("crime", &["crime", "detective", "investigation", "mystery"]),
    ("family", &["family", "kids", "children", "wholesome"]),
    ("adventure", &["adventure", "quest", "journey"]),
];

const MOOD_WORDS: &[&str] = &[
    "sad", "happy", "excited", "calm", "stressed", "angry", "tired", "romantic", "down",
    "cheerful", "melancholy",
];

const ERA_TOKENS: &[&str] = &[
    "classic", "70s", "80s", "90s", "2000s", "2010s", "2020s", "modern", "recent", "vintage",
];

lazy_static! {
    /// "no horror", "without anything scary", "not too serious". Captures a
    /// short window after the negator; every word in it is checked against
    /// the genre table.
    static ref NEGATION: Regex =
        Regex::new(r"(?:\bno\b|\bnot\b|\bwithout\b|\bnothing\b)((?:\s+\w+){1,3})").unwrap();
    /// "like The Matrix", "similar to Alien"
    static ref REFERENCE: Regex =
        Regex::new(r"(?:\blike\b|\bsimilar to\b)\s+([^,.!?]+)").unwrap();
    /// "with Tom Hanks and Meg Ryan", "starring Sigourney Weaver"
    static ref CAST: Regex =
        Regex::new(r"(?:\bwith\b|\bstarring\b|\bfeaturing\b)\s+([A-Z][\w.'-]*(?:\s+(?:and\s+)?[A-Z][\w.'-]*)+)").unwrap();
    /// "directed by Ridley Scott"
    static ref DIRECTOR: Regex =
        Regex::new(r"(?:\bdirected by\b|\bfrom director\b)\s+([A-Z][\w.'-]*(?:\s+[A-Z][\w.'-]*)+)").unwrap();
}

/// Local keyword-driven extractor, good enough for plain requests like
/// "a funny 90s movie with Tom Hanks, nothing scary".
#[derive(Debug, Default, Clone)]
pub struct KeywordExtractor;

impl KeywordExtractor {
    fn extract_sync(&self, text: &str) -> PreferencePacket {
        let lower = text.to_lowercase();
        let mut packet = PreferencePacket::default();

        // Negated words first, so "no horror" lands in exclusions only
        for capture in NEGATION.captures_iter(&lower) {
            for word in capture[1].split_whitespace() {
                if let Some(genre) = keyword_to_genre(word) {
                    packet.excluded_genres.insert(genre.to_string());
                }
            }
        }

        for (genre, keywords) in GENRE_KEYWORDS {
            if packet.excluded_genres.contains(*genre) {
                continue;
            }
            if keywords.iter().any(|k| lower.contains(k)) {
                packet.genres.insert((*genre).to_string());
            }
        }

        packet.mood = MOOD_WORDS
            .iter()
            .find(|m| contains_word(&lower, m))
            .map(|m| (*m).to_string());

        packet.era = ERA_TOKENS
            .iter()
            .find(|e| contains_word(&lower, e))
            .map(|e| (*e).to_string());

        if let Some(capture) = REFERENCE.captures(text) {
            packet.reference_title = Some(capture[1].trim().to_string());
        }

        for capture in CAST.captures_iter(text) {
            for name in capture[1].split(" and ") {
                let name = name.trim();
                if !name.is_empty() {
                    packet.actors.insert(name.to_string());
                }
            }
        }

        for capture in DIRECTOR.captures_iter(text) {
            packet.directors.insert(capture[1].trim().to_string());
        }

        tracing::debug!(
            genres = packet.genres.len(),
            excluded = packet.excluded_genres.len(),
            mood = ?packet.mood,
            era = ?packet.era,
            "Extracted preferences from text"
        );

        packet
    }
}

#[async_trait]
impl PreferenceExtractor for KeywordExtractor {
    async fn extract(&self, text: &str) -> AppResult<PreferencePacket> {
        Ok(self.extract_sync(text))
    }
}

fn keyword_to_genre(word: &str) -> Option<&'static str> {
    GENRE_KEYWORDS
        .iter()
        .find(|(genre, keywords)| {
            *genre == word || keywords.iter().any(|k| *k == word)
        })
        .map(|(genre, _)| *genre)
}

fn contains_word(haystack: &str, word: &str) -> bool {
    haystack
        .split(|c: char| !c.is_alphanumeric())
        .any(|token| token == word)
}
