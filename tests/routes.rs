//! Router-level tests: each request goes through `build_router` with an
//! in-memory database and a local stand-in for the movie metadata API.

use std::{collections::HashMap, time::Duration};

use axum::{
    Json, Router,
    body::Body,
    extract::{Path, Query},
    http::{HeaderMap, Request, StatusCode, header},
    response::Response,
    routing::get,
};
use serde_json::{Value, json};
use tower::util::ServiceExt; // for `oneshot`
use top_movies::{
    AppState, build_router,
    config::Config,
    models::{Movie, MoviePatch, NewMovie},
    store::MovieStore,
};

const TOKEN: &str = "integration-token";
const IMAGE_BASE: &str = "https://image.example/t/p";

// =============================================================================
// Helpers
// =============================================================================

async fn fake_search(
    headers: HeaderMap,
    Query(q): Query<HashMap<String, String>>,
) -> Result<Json<Value>, StatusCode> {
    check_auth(&headers)?;
    let results = match q.get("query").map(String::as_str) {
        Some("Phone Booth") => json!([
            {"id": 1817, "title": "Phone Booth", "release_date": "2002-11-14", "poster_path": "/pb.jpg"},
            {"id": 99, "title": "Phone Booth", "release_date": "", "poster_path": null},
        ]),
        _ => json!([]),
    };
    Ok(Json(json!({ "results": results })))
}

async fn fake_detail(headers: HeaderMap, Path(id): Path<u64>) -> Result<Json<Value>, StatusCode> {
    check_auth(&headers)?;
    match id {
        1817 => Ok(Json(json!({
            "original_title": "Phone Booth",
            "release_date": "2002-11-14",
            "overview": "Publicist Stuart Shepard finds himself trapped in a phone booth.",
            "poster_path": "/pb.jpg",
        }))),
        _ => Err(StatusCode::NOT_FOUND),
    }
}

fn check_auth(headers: &HeaderMap) -> Result<(), StatusCode> {
    let expected = format!("Bearer {TOKEN}");
    match headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        Some(v) if v == expected => Ok(()),
        _ => Err(StatusCode::UNAUTHORIZED),
    }
}

async fn spawn_fake_tmdb() -> String {
    let app = Router::new()
        .route("/search/movie", get(fake_search))
        .route("/movie/{id}", get(fake_detail));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    format!("http://{addr}")
}

/// Answers searches, but only after `delay`.
async fn spawn_slow_tmdb(delay: Duration) -> String {
    let app = Router::new().route(
        "/search/movie",
        get(move || async move {
            tokio::time::sleep(delay).await;
            Json(json!({ "results": [] }))
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    format!("http://{addr}")
}

/// Base URL nothing is listening on.
async fn dead_tmdb() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

fn test_config(tmdb_base_url: String, tmdb_timeout: Duration) -> Config {
    Config {
        addr: "127.0.0.1:0".parse().unwrap(),
        database_url: "sqlite::memory:".to_string(),
        tmdb_access_token: TOKEN.to_string(),
        tmdb_base_url,
        tmdb_image_base_url: IMAGE_BASE.to_string(),
        tmdb_rps: 50,
        tmdb_timeout,
        secret_key: "0123456789abcdef0123456789abcdef".to_string(),
    }
}

/// Builds the app the same way `main` does, from a `Config`.
async fn setup_app_with(config: Config) -> (Router, MovieStore) {
    let state = AppState::from_config(config).await.unwrap();
    let store = state.store.clone();
    (build_router(state), store)
}

async fn setup_app(tmdb_base_url: String) -> (Router, MovieStore) {
    setup_app_with(test_config(tmdb_base_url, Duration::from_secs(5))).await
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder().method("GET").uri(uri).body(Body::empty()).unwrap()
}

fn form_request(uri: &str, cookie: Option<&str>, body: String) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body)).unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn location(response: &Response) -> &str {
    response.headers().get(header::LOCATION).unwrap().to_str().unwrap()
}

/// Loads a form page and returns the `name=value` cookie pair plus the hidden
/// token the page embeds.
async fn csrf_for(app: &Router, uri: &str) -> (String, String) {
    let response = app.clone().oneshot(get_request(uri)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("form page should set the csrf cookie")
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string();

    let html = body_text(response).await;
    let marker = "name=\"csrf_token\" value=\"";
    let start = html.find(marker).expect("form should carry a token") + marker.len();
    let end = start + html[start..].find('"').unwrap();
    (cookie, html[start..end].to_string())
}

fn movie(title: &str, year: &str, rating: f64) -> NewMovie {
    NewMovie {
        title: title.to_string(),
        year: year.to_string(),
        description: format!("About {title}"),
        rating,
        ranking: 1,
        review: String::new(),
        img_url: format!("{IMAGE_BASE}/w500/{year}.jpg"),
    }
}

async fn by_title(store: &MovieStore, title: &str) -> Movie {
    store.find_by_title(title).await.unwrap().unwrap()
}

// =============================================================================
// List view
// =============================================================================

#[tokio::test]
async fn list_view_recomputes_rankings() {
    let (app, store) = setup_app(dead_tmdb().await).await;
    store.create(movie("Phone Booth", "2002", 0.0)).await.unwrap();
    store.create(movie("Up", "2009", 8.2)).await.unwrap();

    let response = app.oneshot(get_request("/")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    let booth = html.find("Phone Booth").unwrap();
    let up = html.find(">Up<").unwrap();
    assert!(booth < up, "list is ordered by ascending rating");

    assert_eq!(by_title(&store, "Phone Booth").await.ranking, 2);
    assert_eq!(by_title(&store, "Up").await.ranking, 1);
}

#[tokio::test]
async fn empty_list_renders() {
    let (app, _store) = setup_app(dead_tmdb().await).await;
    let response = app.oneshot(get_request("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("No movies yet"));
}

// =============================================================================
// Edit
// =============================================================================

#[tokio::test]
async fn edit_changes_only_rating_and_review() {
    let (app, store) = setup_app(dead_tmdb().await).await;
    let original = store.create(movie("Phone Booth", "2002", 0.0)).await.unwrap();
    let uri = format!("/edit/{}", original.id);
    let (cookie, token) = csrf_for(&app, &uri).await;

    let body =
        format!("rating=7.3&review=My+favourite+character+was+the+caller.&csrf_token={token}");
    let response = app.oneshot(form_request(&uri, Some(&cookie), body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");

    let updated = store.get(original.id).await.unwrap();
    assert_eq!(updated.rating, 7.3);
    assert_eq!(updated.review, "My favourite character was the caller.");
    assert_eq!(Movie { rating: 0.0, review: String::new(), ..updated }, original);
}

#[tokio::test]
async fn edit_with_non_numeric_rating_is_rejected() {
    let (app, store) = setup_app(dead_tmdb().await).await;
    let original = store.create(movie("Up", "2009", 8.2)).await.unwrap();
    let uri = format!("/edit/{}", original.id);
    let (cookie, token) = csrf_for(&app, &uri).await;

    let body = format!("rating=not-a-number&review=Fine&csrf_token={token}");
    let response = app.oneshot(form_request(&uri, Some(&cookie), body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let html = body_text(response).await;
    assert!(html.contains("Rating must be a number"));
    assert!(html.contains("border-red-500"));

    assert_eq!(store.get(original.id).await.unwrap(), original);
}

#[tokio::test]
async fn edit_without_csrf_token_is_refused() {
    let (app, store) = setup_app(dead_tmdb().await).await;
    let original = store.create(movie("Up", "2009", 8.2)).await.unwrap();
    let uri = format!("/edit/{}", original.id);

    let response = app
        .oneshot(form_request(&uri, None, "rating=1&review=Bad&csrf_token=forged".to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(body_text(response).await.contains("expired"));
    assert_eq!(store.get(original.id).await.unwrap(), original);
}

#[tokio::test]
async fn edit_unknown_movie_is_not_found() {
    let (app, _store) = setup_app(dead_tmdb().await).await;

    let response = app.clone().oneshot(get_request("/edit/404")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .oneshot(form_request("/edit/404", None, "rating=5&review=x&csrf_token=t".to_string()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn edit_form_starts_blank() {
    let (app, store) = setup_app(dead_tmdb().await).await;
    let m = store.create(movie("Up", "2009", 0.0)).await.unwrap();
    store
        .update(m.id, MoviePatch { review: Some("Balloons!".to_string()), ..Default::default() })
        .await
        .unwrap();

    let response = app.oneshot(get_request(&format!("/edit/{}", m.id))).await.unwrap();
    let html = body_text(response).await;

    assert!(html.contains("placeholder=\"Balloons!\""));
    assert!(!html.contains("value=\"Balloons!\""));
}

// =============================================================================
// Delete
// =============================================================================

#[tokio::test]
async fn delete_removes_movie_and_redirects_home() {
    let (app, store) = setup_app(dead_tmdb().await).await;
    let keep = store.create(movie("Up", "2009", 8.2)).await.unwrap();
    let gone = store.create(movie("Jaws", "1975", 6.0)).await.unwrap();

    let response = app.oneshot(get_request(&format!("/delete/{}", gone.id))).await.unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
    assert_eq!(store.list_all().await.unwrap(), vec![keep]);
}

#[tokio::test]
async fn delete_unknown_movie_is_not_found_and_table_unchanged() {
    let (app, store) = setup_app(dead_tmdb().await).await;
    store.create(movie("Up", "2009", 8.2)).await.unwrap();
    let before = store.list_all().await.unwrap();

    let response = app.oneshot(get_request("/delete/999")).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(body_text(response).await.contains("movie 999 not found"));
    assert_eq!(store.list_all().await.unwrap(), before);
}

#[tokio::test]
async fn bare_id_path_does_not_delete() {
    let (app, store) = setup_app(dead_tmdb().await).await;
    let m = store.create(movie("Up", "2009", 8.2)).await.unwrap();

    let response = app.oneshot(get_request(&format!("/{}", m.id))).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(store.find(m.id).await.unwrap().is_some());
}

#[tokio::test]
async fn out_of_range_id_is_not_found_and_table_unchanged() {
    let (app, store) = setup_app(dead_tmdb().await).await;
    store.create(movie("Up", "2009", 8.2)).await.unwrap();
    let before = store.list_all().await.unwrap();

    for uri in ["/delete/3000000000", "/edit/3000000000", "/delete/abc"] {
        let response = app.clone().oneshot(get_request(uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
        assert!(body_text(response).await.contains("not found"), "{uri}");
    }

    let response = app
        .oneshot(form_request(
            "/edit/3000000000",
            None,
            "rating=5&review=x&csrf_token=t".to_string(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    assert_eq!(store.list_all().await.unwrap(), before);
}

// =============================================================================
// Add flow
// =============================================================================

#[tokio::test]
async fn search_lists_results_linking_to_import() {
    let (app, _store) = setup_app(spawn_fake_tmdb().await).await;
    let (cookie, token) = csrf_for(&app, "/add").await;

    let body = format!("title=Phone+Booth&csrf_token={token}");
    let response = app.oneshot(form_request("/add", Some(&cookie), body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("href=\"/add_new_movie/1817\""));
    assert!(html.contains("href=\"/add_new_movie/99\""));
    assert!(html.contains("Phone Booth - 2002"));
}

#[tokio::test]
async fn blank_search_is_flagged() {
    let (app, _store) = setup_app(spawn_fake_tmdb().await).await;
    let (cookie, token) = csrf_for(&app, "/add").await;

    let body = format!("title=+++&csrf_token={token}");
    let response = app.oneshot(form_request("/add", Some(&cookie), body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body_text(response).await.contains("Movie title is required"));
}

#[tokio::test]
async fn search_failure_shows_retryable_message() {
    let (app, _store) = setup_app(dead_tmdb().await).await;
    let (cookie, token) = csrf_for(&app, "/add").await;

    let body = format!("title=Phone+Booth&csrf_token={token}");
    let response = app.oneshot(form_request("/add", Some(&cookie), body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let html = body_text(response).await;
    assert!(html.contains("Please try again"));
    assert!(html.contains("value=\"Phone Booth\""));
}

#[tokio::test]
async fn slow_search_times_out_as_bad_gateway() {
    let base_url = spawn_slow_tmdb(Duration::from_secs(5)).await;
    let (app, _store) = setup_app_with(test_config(base_url, Duration::from_secs(1))).await;
    let (cookie, token) = csrf_for(&app, "/add").await;

    let body = format!("title=Phone+Booth&csrf_token={token}");
    let started = std::time::Instant::now();
    let response = app.oneshot(form_request("/add", Some(&cookie), body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert!(started.elapsed() < Duration::from_secs(4));
    assert!(body_text(response).await.contains("Please try again"));
}

#[tokio::test]
async fn import_creates_unrated_movie_and_redirects_to_edit() {
    let (app, store) = setup_app(spawn_fake_tmdb().await).await;

    let response = app.oneshot(get_request("/add_new_movie/1817")).await.unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let created = by_title(&store, "Phone Booth").await;
    assert_eq!(location(&response), format!("/edit/{}", created.id));
    assert_eq!(created.year, "2002");
    assert_eq!(created.rating, 0.0);
    assert_eq!(created.ranking, 1);
    assert_eq!(created.review, "");
    assert_eq!(created.img_url, format!("{IMAGE_BASE}/w500/pb.jpg"));
}

#[tokio::test]
async fn importing_same_title_twice_is_conflict() {
    let (app, store) = setup_app(spawn_fake_tmdb().await).await;
    let first = app.clone().oneshot(get_request("/add_new_movie/1817")).await.unwrap();
    assert_eq!(first.status(), StatusCode::SEE_OTHER);
    let before = store.list_all().await.unwrap();

    let second = app.oneshot(get_request("/add_new_movie/1817")).await.unwrap();

    assert_eq!(second.status(), StatusCode::CONFLICT);
    assert!(body_text(second).await.contains("already in your list"));
    assert_eq!(store.list_all().await.unwrap(), before);
}

#[tokio::test]
async fn import_upstream_failure_is_bad_gateway() {
    let (app, store) = setup_app(spawn_fake_tmdb().await).await;

    let response = app.oneshot(get_request("/add_new_movie/5")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert!(body_text(response).await.contains("Try again"));
    assert_eq!(store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn add_then_delete_restores_table() {
    let (app, store) = setup_app(spawn_fake_tmdb().await).await;
    store.create(movie("Up", "2009", 8.2)).await.unwrap();
    let before = store.list_all().await.unwrap();

    let response = app.clone().oneshot(get_request("/add_new_movie/1817")).await.unwrap();
    let edit_uri = location(&response).to_string();
    let id = edit_uri.trim_start_matches("/edit/");

    let response = app.oneshot(get_request(&format!("/delete/{id}"))).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(store.list_all().await.unwrap(), before);
}
