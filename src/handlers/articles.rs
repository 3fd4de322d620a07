use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde_json::{Value, json};
use validator::Validate;

use crate::{
    AppState,
    error::Result,
    models::{
        AddGroupsRequest, ArticleId, ArticleResponse, CreateArticleRequest, ListArticlesQuery,
        VoteArticleRequest, VoteDirection, VoteResponse,
    },
};

const MAX_PAGE_SIZE: usize = 100;

pub async fn create_article(
    State(state): State<AppState>,
    Json(payload): Json<CreateArticleRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    // Validate input
    payload.validate()?;
    let direction = VoteDirection::try_from(payload.vote_type)?;

    let article_id = state
        .engine
        .post(&payload.author, &payload.title, &payload.link, direction)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Article posted successfully",
            "article_id": article_id
        })),
    ))
}

pub async fn get_articles(
    State(state): State<AppState>,
    Query(params): Query<ListArticlesQuery>,
) -> Result<Json<Value>> {
    let page = params.page.unwrap_or(1);
    let limit = params
        .limit
        .unwrap_or(state.engine.settings().articles_per_page)
        .min(MAX_PAGE_SIZE);
    let order = params.order.unwrap_or_default();

    let articles = state.engine.list(order, page, limit).await?;

    Ok(Json(json!({
        "articles": articles,
        "pagination": {
            "page": page,
            "limit": limit,
            "order": order,
        }
    })))
}

pub async fn get_article(
    State(state): State<AppState>,
    Path(article_id): Path<ArticleId>,
) -> Result<Json<ArticleResponse>> {
    let article = state.engine.get_article(article_id)?;
    let score = state.engine.score_of(article_id).await?;

    Ok(Json(ArticleResponse { article, score }))
}

pub async fn delete_article(
    State(state): State<AppState>,
    Path(article_id): Path<ArticleId>,
) -> Result<Json<Value>> {
    state.engine.delete_article(article_id).await?;

    Ok(Json(json!({
        "message": "Article deleted successfully"
    })))
}

pub async fn vote_article(
    State(state): State<AppState>,
    Path(article_id): Path<ArticleId>,
    Json(payload): Json<VoteArticleRequest>,
) -> Result<Json<VoteResponse>> {
    payload.validate()?;
    // Reject unknown directions before touching the ledger
    let direction = VoteDirection::try_from(payload.vote_type)?;

    let outcome = state
        .engine
        .vote(&payload.user, article_id, direction)
        .await?;

    let article = state.engine.get_article(article_id)?;
    let score = state.engine.score_of(article_id).await?;
    let user_vote = state
        .engine
        .voter_state(article_id, &payload.user)
        .await?;

    Ok(Json(VoteResponse {
        outcome,
        user_vote,
        votes: article.votes,
        upvotes: article.upvotes,
        downvotes: article.downvotes,
        score,
    }))
}

pub async fn add_article_groups(
    State(state): State<AppState>,
    Path(article_id): Path<ArticleId>,
    Json(payload): Json<AddGroupsRequest>,
) -> Result<Json<Value>> {
    payload.validate()?;

    state.engine.add_groups(article_id, payload.groups.as_slice()).await?;

    Ok(Json(json!({
        "message": "Article added to groups",
        "groups": payload.groups
    })))
}
