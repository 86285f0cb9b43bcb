//! Keeps each movie's `ranking` in step with its rating.
//!
//! Rankings count down from the number of movies: the lowest rated movie gets
//! `N`, the highest rated gets `1`. Ties fall back to `id` order, so of two
//! equally rated movies the older row ranks lower.

use crate::{error::AppResult, models::Movie, store::MovieStore};

/// Pairs each movie with its ranking. `movies` must already be sorted by
/// `(rating, id)` ascending, which is what [`MovieStore::list_all`] returns.
pub fn compute_rankings(movies: &[Movie]) -> Vec<(i32, i32)> {
    let total = movies.len() as i32;
    movies.iter().enumerate().map(|(i, m)| (m.id, total - i as i32)).collect()
}

/// Recomputes every ranking and persists the ones that changed.
pub async fn recalculate(store: &MovieStore) -> AppResult<()> {
    let movies = store.list_all().await?;
    let changed: Vec<(i32, i32)> = compute_rankings(&movies)
        .into_iter()
        .zip(&movies)
        .filter(|((_, ranking), movie)| movie.ranking != *ranking)
        .map(|(pair, _)| pair)
        .collect();

    if !changed.is_empty() {
        tracing::debug!(total = movies.len(), changed = changed.len(), "rankings updated");
        store.apply_rankings(&changed).await?;
    }
    Ok(())
}
