// src/routes.rs

use axum::{
    Router, http::Method, middleware,
    routing::{get, post, put},
};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::{
    handlers::{auth, books, members},
    state::AppState,
    utils::jwt::auth_middleware,
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (auth, books, members).
/// * Applies global middleware (Trace, CORS) and static cover serving.
/// * Injects global state (stores + config).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        "http://localhost:3000".parse().unwrap(),
        "http://127.0.0.1:3000".parse().unwrap(),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login));

    let book_routes = Router::new()
        .route("/", get(books::list_books))
        .route("/genres", get(books::list_genres))
        .route("/stats", get(books::stats))
        .route("/{id}", get(books::get_book))
        // Protected book routes
        .merge(
            Router::new()
                .route("/", post(books::create_book))
                .route(
                    "/{id}",
                    put(books::update_book).delete(books::delete_book),
                )
                .route("/{id}/rent", post(books::rent_book))
                .route("/{id}/return", post(books::return_book))
                .route("/{id}/ratings", post(books::rate_book))
                .route("/{id}/image", post(books::upload_image))
                .route("/{id}/pdf", post(books::upload_pdf).get(books::download_pdf))
                .layer(middleware::from_fn_with_state(
                    state.clone(),
                    auth_middleware,
                )),
        );

    let member_routes = Router::new()
        .route("/members", get(members::list_members))
        .route("/profile", get(members::get_profile))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/books", book_routes)
        .nest("/api", member_routes)
        // Public cover images; gated PDFs live outside this root.
        .nest_service("/uploads", ServeDir::new(state.config.uploads_dir()))
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
