use std::cmp::Reverse;
use std::collections::{BTreeSet, HashMap, HashSet};
use tokio::sync::RwLock;

use crate::{
    error::{AppError, Result},
    models::{ArticleId, OrderKind, VoteDirection},
};

/// One sorted mapping of article id to score.
///
/// Entries are kept as `(Reverse(score), id)` so forward iteration is
/// score-descending. Ids are allocated monotonically, so among equal scores
/// the lower id (the earlier insertion) comes first.
#[derive(Debug, Default)]
struct Ranking {
    scores: HashMap<ArticleId, i64>,
    ranked: BTreeSet<(Reverse<i64>, ArticleId)>,
}

impl Ranking {
    fn insert(&mut self, id: ArticleId, score: i64) {
        if let Some(old) = self.scores.insert(id, score) {
            self.ranked.remove(&(Reverse(old), id));
        }
        self.ranked.insert((Reverse(score), id));
    }

    fn increment(&mut self, id: ArticleId, delta: i64) -> Option<i64> {
        let old = *self.scores.get(&id)?;
        let new = old + delta;

        self.ranked.remove(&(Reverse(old), id));
        self.ranked.insert((Reverse(new), id));
        self.scores.insert(id, new);

        Some(new)
    }

    fn remove(&mut self, id: ArticleId) -> Option<i64> {
        let score = self.scores.remove(&id)?;
        self.ranked.remove(&(Reverse(score), id));
        Some(score)
    }

    fn page<F>(&self, offset: usize, limit: usize, descending: bool, keep: F) -> Vec<ArticleId>
    where
        F: Fn(ArticleId) -> bool,
    {
        if descending {
            self.ranked
                .iter()
                .map(|(_, id)| *id)
                .filter(|id| keep(*id))
                .skip(offset)
                .take(limit)
                .collect()
        } else {
            self.ranked
                .iter()
                .rev()
                .map(|(_, id)| *id)
                .filter(|id| keep(*id))
                .skip(offset)
                .take(limit)
                .collect()
        }
    }
}

/// The two orderings over all articles: decayed score and creation time.
#[derive(Debug)]
pub struct ScoreIndex {
    vote_score: i64,
    by_score: RwLock<Ranking>,
    by_time: RwLock<Ranking>,
}

impl ScoreIndex {
    pub fn new(vote_score: i64) -> Self {
        Self {
            vote_score,
            by_score: RwLock::new(Ranking::default()),
            by_time: RwLock::new(Ranking::default()),
        }
    }

    fn ordering(&self, order: OrderKind) -> &RwLock<Ranking> {
        match order {
            OrderKind::Score => &self.by_score,
            OrderKind::Time => &self.by_time,
        }
    }

    /// Seed both orderings. The score ordering starts one vote away from
    /// the creation time, in the direction of the author's vote.
    pub async fn insert(
        &self,
        article_id: ArticleId,
        created_at: i64,
        initial_direction: VoteDirection,
    ) {
        self.by_time.write().await.insert(article_id, created_at);
        self.by_score.write().await.insert(
            article_id,
            created_at + self.vote_score * initial_direction.sign(),
        );
    }

    pub async fn adjust_score(&self, article_id: ArticleId, delta: i64) -> Result<i64> {
        self.by_score
            .write()
            .await
            .increment(article_id, delta)
            .ok_or_else(|| AppError::NotFound(format!("Article {} not found", article_id)))
    }

    pub async fn time_of(&self, article_id: ArticleId) -> Option<i64> {
        self.by_time.read().await.scores.get(&article_id).copied()
    }

    pub async fn score_of(&self, article_id: ArticleId) -> Option<i64> {
        self.by_score.read().await.scores.get(&article_id).copied()
    }

    pub async fn range(
        &self,
        order: OrderKind,
        offset: usize,
        limit: usize,
        descending: bool,
    ) -> Vec<ArticleId> {
        self.ordering(order)
            .read()
            .await
            .page(offset, limit, descending, |_| true)
    }

    pub async fn range_by_score(
        &self,
        offset: usize,
        limit: usize,
        descending: bool,
    ) -> Vec<ArticleId> {
        self.range(OrderKind::Score, offset, limit, descending).await
    }

    /// Intersect `restrict` with an ordering, highest first. Ids are unique
    /// so max-aggregation reduces to a filter.
    pub async fn range_within(
        &self,
        order: OrderKind,
        restrict: &HashSet<ArticleId>,
        offset: usize,
        limit: usize,
    ) -> Vec<ArticleId> {
        if restrict.is_empty() {
            return Vec::new();
        }

        self.ordering(order)
            .read()
            .await
            .page(offset, limit, true, |id| restrict.contains(&id))
    }

    pub async fn range_by_score_within(
        &self,
        restrict: &HashSet<ArticleId>,
        offset: usize,
        limit: usize,
    ) -> Vec<ArticleId> {
        self.range_within(OrderKind::Score, restrict, offset, limit)
            .await
    }

    pub async fn remove(&self, article_id: ArticleId) {
        self.by_score.write().await.remove(article_id);
        self.by_time.write().await.remove(article_id);
    }

    pub async fn len(&self) -> usize {
        self.by_time.read().await.scores.len()
    }
}
