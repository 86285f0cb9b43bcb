pub mod config;
pub mod csrf;
pub mod db;
pub mod entities;
pub mod error;
pub mod forms;
pub mod models;
pub mod ranking;
pub mod routes;
pub mod store;
pub mod templates;
pub mod tmdb;

use std::sync::Arc;

use anyhow::Context;
use axum::{Router, extract::FromRef, routing::get};
use axum_extra::extract::cookie::Key;
use tower_http::trace::TraceLayer;

use crate::{config::Config, error::AppResult, store::MovieStore, tmdb::TmdbClient};

/// Everything a request handler needs. Built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: MovieStore,
    pub tmdb: Arc<TmdbClient>,
    cookie_key: Key,
}

impl AppState {
    pub fn new(config: Config, store: MovieStore, tmdb: TmdbClient) -> Self {
        let cookie_key = csrf::key_from_secret(&config.secret_key);
        Self { config: Arc::new(config), store, tmdb: Arc::new(tmdb), cookie_key }
    }

    pub async fn from_config(config: Config) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent("top-movies/0.1")
            .timeout(config.tmdb_timeout)
            .build()
            .context("building http client")?;

        let db = db::connect_and_migrate(&config.database_url).await?;
        let store = MovieStore::new(db);

        let tmdb = TmdbClient::new(
            http,
            config.tmdb_access_token.clone(),
            config.tmdb_base_url.clone(),
            config.tmdb_rps,
        );

        Ok(Self::new(config, store, tmdb))
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(routes::index))
        .route("/add", get(routes::add_form).post(routes::add_search))
        .route("/add_new_movie/{external_id}", get(routes::add_new_movie))
        .route("/edit/{id}", get(routes::edit_form).post(routes::edit_submit))
        .route("/delete/{id}", get(routes::delete))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
