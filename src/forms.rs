use serde::Deserialize;

use crate::{
    error::AppError,
    models::{MAX_REVIEW_LEN, MoviePatch},
};

pub const MAX_RATING: f64 = 10.0;

#[derive(Clone, Debug, Default, Deserialize)]
pub struct AddForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub csrf_token: String,
}

impl AddForm {
    /// Returns the search query.
    pub fn validate(&self) -> Result<String, FormErrors> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(FormErrors::default().with_field("title", "Movie title is required"));
        }
        Ok(title.to_string())
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct EditForm {
    #[serde(default)]
    pub rating: String,
    #[serde(default)]
    pub review: String,
    #[serde(default)]
    pub csrf_token: String,
}

impl EditForm {
    /// Parses the form into a patch that touches rating and review only.
    pub fn validate(&self) -> Result<MoviePatch, FormErrors> {
        let mut errors = FormErrors::default();

        let rating = match parse_rating(&self.rating) {
            Ok(r) => Some(r),
            Err(msg) => {
                errors.push("rating", msg);
                None
            },
        };

        let review = self.review.trim();
        if review.is_empty() {
            errors.push("review", "Review is required");
        } else if review.chars().count() > MAX_REVIEW_LEN {
            errors.push("review", format!("Review must be at most {MAX_REVIEW_LEN} characters"));
        }

        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(MoviePatch { rating, review: Some(review.to_string()), ranking: None })
    }
}

fn parse_rating(raw: &str) -> Result<f64, &'static str> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err("Rating is required");
    }
    let rating: f64 = raw.parse().map_err(|_| "Rating must be a number, e.g. 7.5")?;
    if !rating.is_finite() {
        return Err("Rating must be a number, e.g. 7.5");
    }
    if !(0.0..=MAX_RATING).contains(&rating) {
        return Err("Rating must be between 0 and 10");
    }
    Ok(rating)
}

/// Validation messages, keyed by field name, plus an optional message for the
/// form as a whole.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FormErrors {
    fields: Vec<(&'static str, String)>,
    form: Option<String>,
}

impl FormErrors {
    pub fn with_field(mut self, field: &'static str, message: impl Into<String>) -> Self {
        self.push(field, message);
        self
    }

    pub fn with_form(mut self, message: impl Into<String>) -> Self {
        self.form = Some(message.into());
        self
    }

    pub fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.fields.push((field, message.into()));
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.iter().find(|(f, _)| *f == name).map(|(_, m)| m.as_str())
    }

    pub fn form(&self) -> Option<&str> {
        self.form.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.form.is_none()
    }
}

impl From<FormErrors> for AppError {
    fn from(errors: FormErrors) -> Self {
        match errors.fields.into_iter().next() {
            Some((field, message)) => AppError::Validation { field, message },
            None => AppError::Validation {
                field: "form",
                message: errors.form.unwrap_or_else(|| "invalid form".to_string()),
            },
        }
    }
}
