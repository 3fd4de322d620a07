use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::{
    error::{AppError, Result},
    models::{Article, ArticleId},
};

/// Article records keyed by id, plus the id allocator.
#[derive(Debug, Default)]
pub struct ArticleStore {
    next_id: AtomicU64,
    articles: DashMap<ArticleId, Article>,
}

impl ArticleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate an id and store a fresh article with zeroed vote counters.
    pub fn post(&self, author: &str, title: &str, link: &str, created_at: i64) -> ArticleId {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;

        self.articles.insert(
            id,
            Article {
                id,
                title: title.to_string(),
                link: link.to_string(),
                author: author.to_string(),
                created_at,
                votes: 0,
                upvotes: 0,
                downvotes: 0,
            },
        );

        id
    }

    pub fn get(&self, article_id: ArticleId) -> Result<Article> {
        self.articles
            .get(&article_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| AppError::NotFound(format!("Article {} not found", article_id)))
    }

    pub fn contains(&self, article_id: ArticleId) -> bool {
        self.articles.contains_key(&article_id)
    }

    /// Join an ordered list of ids back into records. Ids that no longer
    /// resolve are skipped.
    pub fn get_many(&self, ids: &[ArticleId]) -> Vec<Article> {
        ids.iter()
            .filter_map(|id| self.articles.get(id).map(|entry| entry.value().clone()))
            .collect()
    }

    /// Adjust the up/down counters and recompute `votes` under the entry's
    /// shard lock.
    pub fn apply_vote_delta(
        &self,
        article_id: ArticleId,
        up_delta: i64,
        down_delta: i64,
    ) -> Result<Article> {
        let mut entry = self
            .articles
            .get_mut(&article_id)
            .ok_or_else(|| AppError::NotFound(format!("Article {} not found", article_id)))?;

        let article = entry.value_mut();
        article.upvotes += up_delta;
        article.downvotes += down_delta;
        article.votes = article.upvotes + article.downvotes;

        Ok(article.clone())
    }

    pub fn remove(&self, article_id: ArticleId) -> Option<Article> {
        self.articles.remove(&article_id).map(|(_, article)| article)
    }

    pub fn len(&self) -> usize {
        self.articles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }
}
