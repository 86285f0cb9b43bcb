use serde::Deserialize;

pub use crate::entities::movie::Model as Movie;

pub const MAX_DESCRIPTION_LEN: usize = 250;
pub const MAX_REVIEW_LEN: usize = 250;

/// Fields of a movie that does not exist yet; `id` is assigned on insert.
#[derive(Clone, Debug, PartialEq)]
pub struct NewMovie {
    pub title: String,
    pub year: String,
    pub description: String,
    pub rating: f64,
    pub ranking: i32,
    pub review: String,
    pub img_url: String,
}

/// Partial update. `None` leaves the column untouched.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MoviePatch {
    pub rating: Option<f64>,
    pub review: Option<String>,
    pub ranking: Option<i32>,
}

impl MoviePatch {
    pub fn is_empty(&self) -> bool {
        self.rating.is_none() && self.review.is_none() && self.ranking.is_none()
    }
}

/// One hit from the metadata API's movie search.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct SearchResult {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
}

impl SearchResult {
    pub fn year(&self) -> Option<&str> {
        self.release_date.as_deref().map(release_year).filter(|y| !y.is_empty())
    }
}

/// Detail record for a single movie, as much of it as gets imported.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct MovieDetail {
    #[serde(rename = "original_title")]
    pub title: String,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
}

impl MovieDetail {
    /// Initial record for a freshly imported movie: unrated, unreviewed.
    pub fn into_new_movie(self, image_base_url: &str) -> NewMovie {
        let year = self.release_date.as_deref().map(release_year).unwrap_or_default().to_string();
        let description =
            truncate_chars(self.overview.as_deref().unwrap_or_default(), MAX_DESCRIPTION_LEN);
        let img_url = self
            .poster_path
            .as_deref()
            .map(|p| poster_url(image_base_url, p))
            .unwrap_or_default();

        NewMovie {
            title: self.title,
            year,
            description,
            rating: 0.0,
            ranking: 1,
            review: String::new(),
            img_url,
        }
    }
}

/// `"2002-11-14"` -> `"2002"`.
pub fn release_year(release_date: &str) -> &str {
    release_date.split('-').next().unwrap_or_default()
}

pub fn poster_url(image_base_url: &str, poster_path: &str) -> String {
    format!("{}/w500{}", image_base_url.trim_end_matches('/'), poster_path)
}

pub fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
