pub mod clock;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod services;

use axum::{
    Router,
    http::{
        HeaderValue, Method,
        header::{ACCEPT, CONTENT_TYPE},
    },
    routing::{delete, get, post},
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{config::Config, services::voting_engine::VotingEngine};

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<VotingEngine>,
    pub config: Arc<Config>,
}

pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(
            state
                .config
                .allowed_origins
                .iter()
                .filter_map(|origin| origin.parse::<HeaderValue>().ok())
                .collect::<Vec<_>>(),
        )
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([ACCEPT, CONTENT_TYPE]);

    // Article routes
    let article_routes = Router::new()
        .route("/api/articles", get(handlers::articles::get_articles))
        .route("/api/articles", post(handlers::articles::create_article))
        .route(
            "/api/articles/{article_id}",
            get(handlers::articles::get_article),
        )
        .route(
            "/api/articles/{article_id}",
            delete(handlers::articles::delete_article),
        )
        .route(
            "/api/articles/{article_id}/vote",
            post(handlers::articles::vote_article),
        )
        .route(
            "/api/articles/{article_id}/groups",
            post(handlers::articles::add_article_groups),
        );

    // Group routes
    let group_routes = Router::new()
        .route(
            "/api/groups/{name}/articles",
            get(handlers::groups::get_group_articles),
        )
        .route(
            "/api/groups/{name}/articles",
            post(handlers::groups::add_to_group),
        )
        .route(
            "/api/groups/{name}/articles/{article_id}",
            delete(handlers::groups::remove_from_group),
        );

    Router::new()
        .merge(article_routes)
        .merge(group_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
