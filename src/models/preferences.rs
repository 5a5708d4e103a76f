use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Structured representation of what a user wants, produced by the preference
/// extractor (or supplied directly by an API client).
///
/// Every field has a defined empty default, so a missing field always means
/// "unconstrained" and the scorer never needs existence checks. Ordered sets
/// keep scoring reasons deterministic across calls.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PreferencePacket {
    /// Desired genres
    pub genres: BTreeSet<String>,
    /// Explicitly disliked genres
    pub excluded_genres: BTreeSet<String>,
    pub mood: Option<String>,
    /// Named year range, e.g. "90s" or "classic"; unknown values are ignored
    pub era: Option<String>,
    pub actors: BTreeSet<String>,
    pub directors: BTreeSet<String>,
    /// Set when the user wants "something like X"
    pub reference_title: Option<String>,
    /// Label from the external emotion detector
    pub emotion: Option<String>,
    /// Detector confidence in 0-1. Carried for collaborators; scoring does
    /// not gate on it.
    pub emotion_confidence: f64,
}

impl PreferencePacket {
    /// True when no signal is set at all, leaving ranking to the quality
    /// baseline alone
    pub fn is_unconstrained(&self) -> bool {
        self.genres.is_empty()
            && self.excluded_genres.is_empty()
            && self.mood.is_none()
            && self.era.is_none()
            && self.actors.is_empty()
            && self.directors.is_empty()
            && self.reference_title.is_none()
            && self.emotion.is_none()
    }
}

/// A named year range used for date-based preference matching
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Era {
    Classic,
    Seventies,
    Eighties,
    Nineties,
    TwoThousands,
    TwentyTens,
    TwentyTwenties,
    Modern,
}

impl Era {
    /// Parse a vocabulary token, tolerating a few spoken aliases. Returns
    /// `None` for anything outside the vocabulary; callers treat that as
    /// an unconstrained era rather than an error.
    pub fn parse(token: &str) -> Option<Era> {
        match token.trim().to_lowercase().as_str() {
            "classic" | "old" | "vintage" | "golden age" => Some(Era::Classic),
            "70s" | "1970s" | "seventies" => Some(Era::Seventies),
            "80s" | "1980s" | "eighties" => Some(Era::Eighties),
            "90s" | "1990s" | "nineties" => Some(Era::Nineties),
            "2000s" | "noughties" => Some(Era::TwoThousands),
            "2010s" => Some(Era::TwentyTens),
            "2020s" => Some(Era::TwentyTwenties),
            "modern" | "recent" | "new" | "latest" => Some(Era::Modern),
            _ => None,
        }
    }

    /// Inclusive year range covered by the era
    pub fn year_range(self) -> (i32, i32) {
        match self {
            Era::Classic => (1920, 1969),
            Era::Seventies => (1970, 1979),
            Era::Eighties => (1980, 1989),
            Era::Nineties => (1990, 1999),
            Era::TwoThousands => (2000, 2009),
            Era::TwentyTens => (2010, 2019),
            Era::TwentyTwenties => (2020, 2029),
            Era::Modern => (2010, 2029),
        }
    }

    pub fn contains(self, year: i32) -> bool {
        let (start, end) = self.year_range();
        (start..=end).contains(&year)
    }

    /// True when the year falls in the first half of the era's range; these
    /// are the more prototypical examples and earn a secondary bonus.
    pub fn in_first_half(self, year: i32) -> bool {
        let (start, end) = self.year_range();
        year >= start && year <= start + (end - start) / 2
    }
}
