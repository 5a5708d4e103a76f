use crate::{
    error::{AppError, AppResult},
    models::MovieRecord,
};
use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};
use std::path::Path;

/// In-memory movie catalog, built once at startup and read-only afterward.
///
/// Rebuilding after a data refresh means loading a fresh `Catalog` and
/// swapping the engine reference; nothing here mutates in place.
#[derive(Debug)]
pub struct Catalog {
    movies: Vec<MovieRecord>,
    /// Lowercased title -> catalog_index
    by_title: HashMap<String, usize>,
}

/// One row of the tabular catalog feed.
///
/// Everything is read as raw text and parsed leniently: a row is only
/// rejected when it has no title, never because a numeric field is junk.
#[derive(Debug, Deserialize)]
struct CatalogRow {
    #[serde(default)]
    movie_title: Option<String>,
    #[serde(default)]
    title_year: Option<String>,
    #[serde(default)]
    genres: Option<String>,
    #[serde(default)]
    actor_1_name: Option<String>,
    #[serde(default)]
    actor_2_name: Option<String>,
    #[serde(default)]
    actor_3_name: Option<String>,
    #[serde(default)]
    director_name: Option<String>,
    #[serde(default)]
    mood: Option<String>,
    #[serde(default)]
    imdb_score: Option<String>,
    #[serde(default)]
    plot_keywords: Option<String>,
}

impl Catalog {
    /// Loads the catalog from a CSV feed.
    ///
    /// A source without a `movie_title` column is a fatal configuration
    /// error. A structurally valid source with zero usable rows yields an
    /// empty catalog, which is valid (requests will return empty results).
    pub fn from_csv_path(path: impl AsRef<Path>) -> AppResult<Catalog> {
        let path = path.as_ref();
        let mut reader = csv::Reader::from_path(path).map_err(|e| {
            AppError::Configuration(format!("cannot open catalog {}: {}", path.display(), e))
        })?;

        let headers = reader.headers()?;
        if !headers.iter().any(|h| h == "movie_title") {
            return Err(AppError::Configuration(format!(
                "catalog {} has no movie_title column",
                path.display()
            )));
        }

        let mut rows = Vec::new();
        let mut skipped = 0usize;
        for result in reader.deserialize::<CatalogRow>() {
            match result {
                Ok(row) => rows.push(row),
                Err(e) => {
                    skipped += 1;
                    tracing::warn!(error = %e, "Skipping unreadable catalog row");
                }
            }
        }

        let catalog = Self::from_rows(rows, &mut skipped);

        tracing::info!(
            path = %path.display(),
            movies = catalog.len(),
            skipped,
            "Catalog loaded"
        );

        Ok(catalog)
    }

    fn from_rows(rows: Vec<CatalogRow>, skipped: &mut usize) -> Catalog {
        let mut movies = Vec::new();
        let mut by_title: HashMap<String, usize> = HashMap::new();

        for row in rows {
            let title = match row.movie_title.as_deref().map(str::trim) {
                Some(t) if !t.is_empty() => t.to_string(),
                _ => {
                    *skipped += 1;
                    continue;
                }
            };

            let key = title.to_lowercase();
            if by_title.contains_key(&key) {
                *skipped += 1;
                tracing::warn!(title = %title, "Skipping duplicate catalog title");
                continue;
            }

            let genres = dedup_ordered(split_pipe_list(row.genres.as_deref()));
            let actors: Vec<String> = [&row.actor_1_name, &row.actor_2_name, &row.actor_3_name]
                .into_iter()
                .filter_map(|a| a.as_deref())
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .map(str::to_string)
                .collect();
            let directors: Vec<String> = row
                .director_name
                .as_deref()
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(|d| vec![d.to_string()])
                .unwrap_or_default();
            let mood_tags: BTreeSet<String> = split_pipe_list(row.mood.as_deref())
                .into_iter()
                .map(|m| m.to_lowercase())
                .collect();

            // No real plot text in the feed: synthesize one from the genre
            // list so the movie still participates in similarity.
            let plot_text = match row.plot_keywords.as_deref().map(str::trim) {
                Some(p) if !p.is_empty() => p.replace('|', " "),
                _ => genres.join(" "),
            };

            let catalog_index = movies.len();
            by_title.insert(key, catalog_index);
            movies.push(MovieRecord {
                title,
                year: parse_year(row.title_year.as_deref()),
                genres,
                actors,
                directors,
                mood_tags,
                quality_score: parse_score(row.imdb_score.as_deref()),
                plot_text,
                catalog_index,
            });
        }

        Catalog { movies, by_title }
    }

    /// Builds a catalog directly from records, reassigning dense indices.
    /// Intended for composition in tests and programmatic rebuilds.
    pub fn from_records(records: Vec<MovieRecord>) -> Catalog {
        let mut movies = Vec::with_capacity(records.len());
        let mut by_title = HashMap::new();
        for mut record in records {
            let key = record.title.to_lowercase();
            if by_title.contains_key(&key) {
                continue;
            }
            record.catalog_index = movies.len();
            by_title.insert(key, record.catalog_index);
            movies.push(record);
        }
        Catalog { movies, by_title }
    }

    pub fn movies(&self) -> &[MovieRecord] {
        &self.movies
    }

    pub fn len(&self) -> usize {
        self.movies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }

    pub fn get(&self, catalog_index: usize) -> Option<&MovieRecord> {
        self.movies.get(catalog_index)
    }

    /// Resolves a title to a record: exact case-insensitive match first,
    /// then first substring match in catalog order.
    pub fn find_by_title(&self, query: &str) -> Option<&MovieRecord> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }
        if let Some(&idx) = self.by_title.get(&needle) {
            return self.movies.get(idx);
        }
        self.movies
            .iter()
            .find(|m| m.title.to_lowercase().contains(&needle))
    }

    /// All titles containing the query, case-insensitively, in catalog order
    pub fn search(&self, query: &str) -> Vec<&MovieRecord> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        self.movies
            .iter()
            .filter(|m| m.title.to_lowercase().contains(&needle))
            .collect()
    }
}

fn split_pipe_list(value: Option<&str>) -> Vec<String> {
    value
        .unwrap_or_default()
        .split('|')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

fn dedup_ordered(values: Vec<String>) -> Vec<String> {
    let mut seen = BTreeSet::new();
    values
        .into_iter()
        .filter(|v| seen.insert(v.to_lowercase()))
        .collect()
}

fn parse_year(value: Option<&str>) -> Option<i32> {
    let value = value?.trim();
    if value.is_empty() {
        return None;
    }
    value
        .parse::<i32>()
        .ok()
        .or_else(|| value.parse::<f64>().ok().map(|y| y as i32))
        .filter(|y| (1880..=2100).contains(y))
}

fn parse_score(value: Option<&str>) -> f64 {
    value
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|s| s.is_finite() && *s >= 0.0)
        .unwrap_or(0.0)
}
