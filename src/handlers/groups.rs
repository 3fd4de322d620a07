use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde_json::{Value, json};

use crate::{
    AppState,
    error::{AppError, Result},
    models::{AddToGroupRequest, ArticleId, ListArticlesQuery, is_valid_group_name},
};

const MAX_PAGE_SIZE: usize = 100;

fn check_group_name(name: &str) -> Result<()> {
    if is_valid_group_name(name) {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!("Invalid group name: {}", name)))
    }
}

pub async fn get_group_articles(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(params): Query<ListArticlesQuery>,
) -> Result<Json<Value>> {
    check_group_name(&name)?;

    let page = params.page.unwrap_or(1);
    let limit = params
        .limit
        .unwrap_or(state.engine.settings().articles_per_page)
        .min(MAX_PAGE_SIZE);
    let order = params.order.unwrap_or_default();

    let articles = state.engine.list_group(&name, order, page, limit).await?;

    Ok(Json(json!({
        "group": name,
        "articles": articles,
        "pagination": {
            "page": page,
            "limit": limit,
            "order": order,
        }
    })))
}

pub async fn add_to_group(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(payload): Json<AddToGroupRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    check_group_name(&name)?;

    let added = state.engine.add_to_group(&name, payload.article_id).await?;
    let status = if added {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    Ok((
        status,
        Json(json!({
            "group": name,
            "article_id": payload.article_id,
            "added": added
        })),
    ))
}

pub async fn remove_from_group(
    State(state): State<AppState>,
    Path((name, article_id)): Path<(String, ArticleId)>,
) -> Result<Json<Value>> {
    check_group_name(&name)?;

    if !state.engine.remove_from_group(&name, article_id).await? {
        return Err(AppError::NotFound(format!(
            "Article {} is not in group {}",
            article_id, name
        )));
    }

    Ok(Json(json!({
        "message": "Article removed from group"
    })))
}
