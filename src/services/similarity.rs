use crate::{
    error::{AppError, AppResult},
    models::MovieRecord,
};
use std::collections::BTreeMap;

/// Precomputed pairwise content similarity over the catalog.
///
/// Each movie is reduced to a bag-of-words count vector over a vocabulary fit
/// once on the whole corpus, and the full N×N cosine matrix is materialized
/// up front. Vectorization is O(N·V) and the matrix is O(N²); that is fine
/// for catalogs up to low tens of thousands of titles, which is this index's
/// scaling boundary. Rebuilding means constructing a new instance.
pub struct SimilarityIndex {
    n: usize,
    /// Row-major N×N cosine matrix
    matrix: Vec<f64>,
    degenerate: bool,
}

impl SimilarityIndex {
    /// Builds the index over the catalog, in catalog order.
    ///
    /// A corpus whose feature text is entirely empty degrades to the
    /// identity matrix: no movie is similar to any other except itself,
    /// and callers get zeros rather than a build failure.
    pub fn build(movies: &[MovieRecord]) -> SimilarityIndex {
        let n = movies.len();
        let documents: Vec<String> = movies.iter().map(feature_text).collect();

        let mut vocabulary: BTreeMap<&str, usize> = BTreeMap::new();
        for doc in &documents {
            for token in doc.split_whitespace() {
                let next_id = vocabulary.len();
                vocabulary.entry(token).or_insert(next_id);
            }
        }

        if vocabulary.is_empty() {
            if n > 0 {
                tracing::warn!(
                    movies = n,
                    "Catalog has no feature text; similarity degrades to identity"
                );
            }
            return SimilarityIndex {
                n,
                matrix: identity_matrix(n),
                degenerate: true,
            };
        }

        // Sparse count vectors, one per document
        let vectors: Vec<BTreeMap<usize, f64>> = documents
            .iter()
            .map(|doc| {
                let mut counts: BTreeMap<usize, f64> = BTreeMap::new();
                for token in doc.split_whitespace() {
                    if let Some(&term) = vocabulary.get(token) {
                        *counts.entry(term).or_insert(0.0) += 1.0;
                    }
                }
                counts
            })
            .collect();
        let norms: Vec<f64> = vectors
            .iter()
            .map(|v| v.values().map(|c| c * c).sum::<f64>().sqrt())
            .collect();

        let mut matrix = vec![0.0; n * n];
        for i in 0..n {
            matrix[i * n + i] = 1.0;
            for j in (i + 1)..n {
                let value = cosine(&vectors[i], norms[i], &vectors[j], norms[j]);
                matrix[i * n + j] = value;
                matrix[j * n + i] = value;
            }
        }

        tracing::info!(movies = n, vocabulary = vocabulary.len(), "Similarity index built");

        SimilarityIndex {
            n,
            matrix,
            degenerate: false,
        }
    }

    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    pub fn is_degenerate(&self) -> bool {
        self.degenerate
    }

    /// Cosine similarity between two catalog indices
    pub fn similarity(&self, a: usize, b: usize) -> AppResult<f64> {
        if a >= self.n || b >= self.n {
            return Err(AppError::NotFound(format!(
                "catalog index {} out of range",
                a.max(b)
            )));
        }
        Ok(self.matrix[a * self.n + b])
    }

    /// The `k` most similar catalog indices, excluding the query itself.
    ///
    /// Ordering is by descending similarity, ties broken by lower catalog
    /// index, so results are stable across calls.
    pub fn similar_to(&self, catalog_index: usize, k: usize) -> AppResult<Vec<usize>> {
        if catalog_index >= self.n {
            return Err(AppError::NotFound(format!(
                "catalog index {} out of range",
                catalog_index
            )));
        }

        let row = &self.matrix[catalog_index * self.n..(catalog_index + 1) * self.n];
        let mut neighbours: Vec<(usize, f64)> = row
            .iter()
            .copied()
            .enumerate()
            .filter(|(j, _)| *j != catalog_index)
            .collect();
        neighbours.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        neighbours.truncate(k);

        Ok(neighbours.into_iter().map(|(j, _)| j).collect())
    }
}

/// Synthesizes the text a movie is vectorized from. Field order is fixed:
/// genres, plot text, actors, directors, year token.
pub fn feature_text(movie: &MovieRecord) -> String {
    let mut parts: Vec<String> = Vec::new();
    parts.extend(movie.genres.iter().cloned());
    parts.push(movie.plot_text.clone());
    parts.extend(movie.actors.iter().cloned());
    parts.extend(movie.directors.iter().cloned());
    if let Some(year) = movie.year {
        parts.push(format!("year_{}", year));
    }
    normalize(&parts.join(" "))
}

/// Lowercases and strips punctuation, keeping word characters only
fn normalize(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '_' {
                c
            } else {
                ' '
            }
        })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn cosine(a: &BTreeMap<usize, f64>, norm_a: f64, b: &BTreeMap<usize, f64>, norm_b: f64) -> f64 {
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    // Iterate the smaller vector for the sparse dot product
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let dot: f64 = small
        .iter()
        .filter_map(|(term, count)| large.get(term).map(|other| count * other))
        .sum();
    dot / (norm_a * norm_b)
}

fn identity_matrix(n: usize) -> Vec<f64> {
    let mut matrix = vec![0.0; n * n];
    for i in 0..n {
        matrix[i * n + i] = 1.0;
    }
    matrix
}
