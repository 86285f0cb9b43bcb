use axum::http::StatusCode;
use maud::{DOCTYPE, Markup, html};

use crate::{
    forms::{AddForm, FormErrors},
    models::{Movie, SearchResult, poster_url},
};

const TAILWIND_CDN: &str = "https://cdn.tailwindcss.com";

const INPUT: &str = "mt-2 w-full rounded-md border px-3 py-2 focus:outline-none focus:ring-1";
const BUTTON: &str =
    "w-full rounded-md bg-blue-600 px-4 py-2 font-semibold text-white hover:bg-blue-700";

pub fn index_page(movies: &[Movie]) -> String {
    page(
        "My Top Movies",
        html! {
            div class="min-h-screen bg-gray-50" {
                div class="max-w-4xl mx-auto px-6 py-12" {
                    div class="flex items-start justify-between gap-6" {
                        div {
                            h1 class="text-3xl font-bold text-gray-900" { "My Top Movies" }
                            p class="mt-2 text-gray-600" { "These are my all-time favourite movies." }
                        }
                        a class="rounded-md bg-blue-600 px-4 py-2 font-semibold text-white hover:bg-blue-700" href="/add" { "Add Movie" }
                    }

                    @if movies.is_empty() {
                        div class="mt-10 bg-white shadow rounded-lg p-8" {
                            p class="text-gray-600" { "No movies yet. Add one to get started." }
                        }
                    } @else {
                        div class="mt-10 space-y-4" {
                            @for movie in movies {
                                (movie_card(movie))
                            }
                        }
                    }
                }
            }
        },
    )
}

pub fn add_page(form: &AddForm, errors: &FormErrors, csrf_token: &str) -> String {
    page(
        "Add Movie",
        html! {
            div class="min-h-screen bg-gray-50" {
                div class="max-w-2xl mx-auto px-6 py-12" {
                    div class="bg-white shadow rounded-lg p-8" {
                        h1 class="text-3xl font-bold text-gray-900" { "Add a Movie" }
                        (form_error(errors))

                        form class="mt-8 space-y-6" method="post" action="/add" {
                            input type="hidden" name="csrf_token" value=(csrf_token);
                            div {
                                label class="block text-sm font-medium text-gray-700" for="title" { "Movie Title" }
                                input class=(input_class(errors.field("title").is_some())) name="title" id="title" value=(form.title) required;
                                (field_error(errors.field("title")))
                            }
                            button class=(BUTTON) type="submit" { "Add Movie" }
                        }
                        a class="mt-6 inline-block text-blue-600 hover:text-blue-800" href="/" { "Back" }
                    }
                }
            }
        },
    )
}

pub fn select_page(query: &str, results: &[SearchResult], image_base_url: &str) -> String {
    page(
        "Select Movie",
        html! {
            div class="min-h-screen bg-gray-50" {
                div class="max-w-2xl mx-auto px-6 py-12" {
                    div class="bg-white shadow rounded-lg p-8" {
                        h1 class="text-3xl font-bold text-gray-900" { "Select Movie" }
                        p class="mt-2 text-gray-600" { "Results for \"" (query) "\"" }

                        @if results.is_empty() {
                            p class="mt-8 text-gray-600" { "No movies matched that title." }
                        } @else {
                            ul class="mt-8 divide-y divide-gray-200" {
                                @for hit in results {
                                    li class="py-3 flex items-center gap-4" {
                                        @if let Some(path) = &hit.poster_path {
                                            img class="h-16 w-11 rounded object-cover" src=(poster_url(image_base_url, path)) alt=(hit.title);
                                        }
                                        a class="text-blue-600 hover:text-blue-800" href=(format!("/add_new_movie/{}", hit.id)) {
                                            (hit.title)
                                            @if let Some(year) = hit.year() {
                                                " - " (year)
                                            }
                                        }
                                    }
                                }
                            }
                        }
                        a class="mt-6 inline-block text-blue-600 hover:text-blue-800" href="/add" { "Search again" }
                    }
                }
            }
        },
    )
}

/// The rating/review inputs start blank; the current values appear as
/// placeholders.
pub fn edit_page(movie: &Movie, errors: &FormErrors, csrf_token: &str) -> String {
    let rating_placeholder =
        if movie.rating > 0.0 { movie.rating.to_string() } else { "e.g. 7.5".to_string() };

    page(
        "Edit Movie",
        html! {
            div class="min-h-screen bg-gray-50" {
                div class="max-w-2xl mx-auto px-6 py-12" {
                    div class="bg-white shadow rounded-lg p-8" {
                        h1 class="text-3xl font-bold text-gray-900" { (movie.title) }
                        p class="mt-2 text-gray-600" { "Edit Movie Rating" }
                        (form_error(errors))

                        form class="mt-8 space-y-6" method="post" action=(format!("/edit/{}", movie.id)) {
                            input type="hidden" name="csrf_token" value=(csrf_token);
                            div {
                                label class="block text-sm font-medium text-gray-700" for="rating" { "Your Rating Out of 10 e.g. 7.5" }
                                input class=(input_class(errors.field("rating").is_some())) name="rating" id="rating" placeholder=(rating_placeholder) required;
                                (field_error(errors.field("rating")))
                            }
                            div {
                                label class="block text-sm font-medium text-gray-700" for="review" { "Your Review" }
                                input class=(input_class(errors.field("review").is_some())) name="review" id="review" maxlength="250" placeholder=(movie.review) required;
                                (field_error(errors.field("review")))
                            }
                            button class=(BUTTON) type="submit" { "Done" }
                        }
                        a class="mt-6 inline-block text-blue-600 hover:text-blue-800" href="/" { "Back" }
                    }
                }
            }
        },
    )
}

pub fn error_page(status: StatusCode, message: &str, retryable: bool) -> String {
    page(
        "Error",
        html! {
            div class="min-h-screen bg-gray-50 flex items-center justify-center" {
                div class="max-w-xl w-full px-6" {
                    div class="bg-white shadow rounded-lg p-8" {
                        h1 class="text-2xl font-bold text-gray-900" {
                            "Error " (status.as_u16())
                        }
                        p class="mt-4 text-gray-700" { (message) }
                        div class="mt-6 flex gap-6" {
                            @if retryable {
                                a class="text-blue-600 hover:text-blue-800" href="" { "Try again" }
                            }
                            a class="text-blue-600 hover:text-blue-800" href="/" { "Back" }
                        }
                    }
                }
            }
        },
    )
}

fn page(title: &str, body: Markup) -> String {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (title) }
                script src=(TAILWIND_CDN) {}
            }
            body { (body) }
        }
    }
    .into_string()
}

fn movie_card(movie: &Movie) -> Markup {
    html! {
        div class="bg-white shadow rounded-lg p-6 flex gap-6" id=(format!("movie-{}", movie.id)) {
            @if !movie.img_url.is_empty() {
                img class="h-40 w-28 rounded object-cover" src=(movie.img_url) alt=(movie.title);
            }
            div class="flex-1" {
                div class="flex items-start justify-between gap-4" {
                    h2 class="text-xl font-semibold text-gray-900" {
                        span class="mr-2 text-gray-400" { "#" (movie.ranking) }
                        (movie.title)
                        @if !movie.year.is_empty() {
                            span class="ml-2 font-normal text-gray-500" { "(" (movie.year) ")" }
                        }
                    }
                    span class="text-lg font-bold text-amber-500" { (format!("{:.1}", movie.rating)) }
                }
                p class="mt-3 text-sm text-gray-700" { (movie.description) }
                @if !movie.review.is_empty() {
                    p class="mt-3 text-sm italic text-gray-600" { "\u{201c}" (movie.review) "\u{201d}" }
                }
                div class="mt-4 flex gap-4 text-sm" {
                    a class="text-blue-600 hover:text-blue-800" href=(format!("/edit/{}", movie.id)) { "Update" }
                    a class="text-red-600 hover:text-red-800" href=(format!("/delete/{}", movie.id)) { "Delete" }
                }
            }
        }
    }
}

fn input_class(invalid: bool) -> String {
    let border = if invalid {
        "border-red-500 focus:border-red-500 focus:ring-red-500"
    } else {
        "border-gray-300 focus:border-blue-500 focus:ring-blue-500"
    };
    format!("{INPUT} {border}")
}

fn field_error(message: Option<&str>) -> Markup {
    html! {
        @if let Some(message) = message {
            p class="mt-2 text-sm text-red-600" { (message) }
        }
    }
}

fn form_error(errors: &FormErrors) -> Markup {
    html! {
        @if let Some(message) = errors.form() {
            div class="mt-6 rounded-md bg-red-50 p-4 text-sm text-red-700" role="alert" { (message) }
        }
    }
}
