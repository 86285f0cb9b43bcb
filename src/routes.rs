use axum::{
    extract::{Form, FromRequestParts, Path, State},
    http::{StatusCode, request::Parts},
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::SignedCookieJar;

use crate::{
    AppState, csrf,
    error::{AppError, AppResult},
    forms::{AddForm, EditForm, FormErrors},
    models::Movie,
    ranking, templates,
};

const FORM_EXPIRED: &str = "This form has expired. Please submit it again.";

/// Local movie id taken from the path. Anything that is not a valid id
/// (non-numeric, or outside the id column's range) names no movie, so it is
/// rejected as not found.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MovieId(pub i32);

impl<S: Send + Sync> FromRequestParts<S> for MovieId {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|err| AppError::Internal(anyhow::anyhow!(err.body_text())))?;
        raw.parse::<i32>().map(MovieId).map_err(|_| AppError::NotFound(raw))
    }
}

pub async fn index(State(state): State<AppState>) -> AppResult<Html<String>> {
    ranking::recalculate(&state.store).await?;
    let movies = state.store.list_all().await?;
    Ok(Html(templates::index_page(&movies)))
}

pub async fn add_form(jar: SignedCookieJar) -> Response {
    render_add(jar, &AddForm::default(), FormErrors::default(), StatusCode::OK)
}

pub async fn add_search(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Form(form): Form<AddForm>,
) -> AppResult<Response> {
    if !csrf::verify(&jar, &form.csrf_token) {
        let errors = FormErrors::default().with_form(FORM_EXPIRED);
        return Ok(render_add(jar, &form, errors, StatusCode::FORBIDDEN));
    }

    let query = match form.validate() {
        Ok(query) => query,
        Err(errors) => return Ok(render_add(jar, &form, errors, StatusCode::UNPROCESSABLE_ENTITY)),
    };

    match state.tmdb.search(&query).await {
        Ok(results) => {
            tracing::info!(query = %query, results = results.len(), "movie search");
            let body =
                templates::select_page(&query, &results, &state.config.tmdb_image_base_url);
            Ok(Html(body).into_response())
        },
        Err(err @ AppError::Upstream(_)) => {
            tracing::warn!(query = %query, error = %err, "movie search failed");
            let errors = FormErrors::default().with_form(err.user_message());
            Ok(render_add(jar, &form, errors, StatusCode::BAD_GATEWAY))
        },
        Err(err) => Err(err),
    }
}

pub async fn add_new_movie(
    State(state): State<AppState>,
    Path(external_id): Path<u64>,
    jar: SignedCookieJar,
) -> AppResult<Response> {
    let detail = state.tmdb.fetch_detail(external_id).await?;
    let new_movie = detail.into_new_movie(&state.config.tmdb_image_base_url);
    let title = new_movie.title.clone();

    match state.store.create(new_movie).await {
        Ok(movie) => {
            tracing::info!(external_id, movie_id = movie.id, "movie imported");
            Ok(Redirect::to(&format!("/edit/{}", movie.id)).into_response())
        },
        Err(err @ AppError::Conflict(_)) => {
            tracing::debug!(external_id, title = %title, "movie already in list");
            let errors = FormErrors::default().with_field("title", err.to_string());
            let form = AddForm { title, ..Default::default() };
            Ok(render_add(jar, &form, errors, StatusCode::CONFLICT))
        },
        Err(err) => Err(err),
    }
}

pub async fn edit_form(
    State(state): State<AppState>,
    MovieId(id): MovieId,
    jar: SignedCookieJar,
) -> AppResult<Response> {
    let Some(movie) = state.store.find(id).await? else {
        return Err(AppError::NotFound(id.to_string()));
    };
    Ok(render_edit(jar, &movie, FormErrors::default(), StatusCode::OK))
}

pub async fn edit_submit(
    State(state): State<AppState>,
    MovieId(id): MovieId,
    jar: SignedCookieJar,
    Form(form): Form<EditForm>,
) -> AppResult<Response> {
    let Some(movie) = state.store.find(id).await? else {
        return Err(AppError::NotFound(id.to_string()));
    };

    if !csrf::verify(&jar, &form.csrf_token) {
        let errors = FormErrors::default().with_form(FORM_EXPIRED);
        return Ok(render_edit(jar, &movie, errors, StatusCode::FORBIDDEN));
    }

    let patch = match form.validate() {
        Ok(patch) => patch,
        Err(errors) => {
            tracing::debug!(movie_id = id, "edit rejected");
            return Ok(render_edit(jar, &movie, errors, StatusCode::UNPROCESSABLE_ENTITY));
        },
    };

    state.store.update(id, patch).await?;
    Ok(Redirect::to("/").into_response())
}

pub async fn delete(
    State(state): State<AppState>,
    MovieId(id): MovieId,
) -> AppResult<Redirect> {
    state.store.delete(id).await?;
    Ok(Redirect::to("/"))
}

fn render_add(
    jar: SignedCookieJar,
    form: &AddForm,
    errors: FormErrors,
    status: StatusCode,
) -> Response {
    let (jar, token) = csrf::issue(jar);
    (status, jar, Html(templates::add_page(form, &errors, &token))).into_response()
}

fn render_edit(
    jar: SignedCookieJar,
    movie: &Movie,
    errors: FormErrors,
    status: StatusCode,
) -> Response {
    let (jar, token) = csrf::issue(jar);
    (status, jar, Html(templates::edit_page(movie, &errors, &token))).into_response()
}
