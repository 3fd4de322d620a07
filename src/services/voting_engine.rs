use std::sync::Arc;

use crate::{
    clock::{Clock, SystemClock},
    error::{AppError, Result},
    models::{Article, ArticleId, OrderKind, VoteDirection, VoteOutcome},
    services::{
        article_store::ArticleStore, group_index::GroupIndex, score_index::ScoreIndex,
        vote_ledger::VoteLedger,
    },
};

pub const ONE_WEEK_IN_SECONDS: i64 = 7 * 86_400;
pub const VOTE_SCORE: i64 = 432;
pub const ARTICLES_PER_PAGE: usize = 25;
pub const GROUP_CACHE_TTL_SECS: i64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSettings {
    pub vote_window_secs: i64,
    pub vote_score: i64,
    pub articles_per_page: usize,
    pub group_cache_ttl_secs: i64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            vote_window_secs: ONE_WEEK_IN_SECONDS,
            vote_score: VOTE_SCORE,
            articles_per_page: ARTICLES_PER_PAGE,
            group_cache_ttl_secs: GROUP_CACHE_TTL_SECS,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    pub vote_sets: usize,
    pub group_caches: usize,
}

/// Articles, votes, rankings and groups behind one handle.
pub struct VotingEngine {
    settings: EngineSettings,
    clock: Arc<dyn Clock>,
    articles: ArticleStore,
    ledger: VoteLedger,
    scores: ScoreIndex,
    groups: GroupIndex,
}

impl VotingEngine {
    pub fn new(settings: EngineSettings, clock: Arc<dyn Clock>) -> Self {
        Self {
            settings,
            clock,
            articles: ArticleStore::new(),
            ledger: VoteLedger::new(settings.vote_window_secs, settings.vote_score),
            scores: ScoreIndex::new(settings.vote_score),
            groups: GroupIndex::new(settings.group_cache_ttl_secs),
        }
    }

    pub fn with_system_clock(settings: EngineSettings) -> Self {
        Self::new(settings, Arc::new(SystemClock))
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn now(&self) -> i64 {
        self.clock.now()
    }

    /// Publish an article with the author's own vote already cast.
    pub async fn post(
        &self,
        author: &str,
        title: &str,
        link: &str,
        initial_direction: VoteDirection,
    ) -> Result<ArticleId> {
        let now = self.clock.now();
        let article_id = self.articles.post(author, title, link, now);

        self.ledger
            .record_initial_vote(article_id, author, initial_direction, now, &self.articles)?;
        // last, so listings never see an id without its record
        self.scores.insert(article_id, now, initial_direction).await;

        tracing::info!(
            "Article {} posted by {} ({:?})",
            article_id,
            author,
            initial_direction
        );
        Ok(article_id)
    }

    pub async fn vote(
        &self,
        user_id: &str,
        article_id: ArticleId,
        direction: VoteDirection,
    ) -> Result<VoteOutcome> {
        let outcome = self
            .ledger
            .vote(
                article_id,
                user_id,
                direction,
                self.clock.now(),
                &self.articles,
                &self.scores,
            )
            .await?;

        tracing::debug!(
            "Vote {:?} by {} on article {}: {:?}",
            direction,
            user_id,
            article_id,
            outcome
        );
        Ok(outcome)
    }

    pub fn get_article(&self, article_id: ArticleId) -> Result<Article> {
        self.articles.get(article_id)
    }

    pub async fn score_of(&self, article_id: ArticleId) -> Result<i64> {
        self.scores
            .score_of(article_id)
            .await
            .ok_or_else(|| AppError::NotFound(format!("Article {} not found", article_id)))
    }

    pub async fn voter_state(
        &self,
        article_id: ArticleId,
        user_id: &str,
    ) -> Result<Option<VoteDirection>> {
        self.ledger.voter_state(article_id, user_id).await
    }

    /// Highest-scoring articles, 1-based `page`.
    pub async fn list_top(&self, page: usize, page_size: usize) -> Result<Vec<Article>> {
        self.list(OrderKind::Score, page, page_size).await
    }

    pub async fn list_newest(&self, page: usize, page_size: usize) -> Result<Vec<Article>> {
        self.list(OrderKind::Time, page, page_size).await
    }

    pub async fn list(
        &self,
        order: OrderKind,
        page: usize,
        page_size: usize,
    ) -> Result<Vec<Article>> {
        let offset = page_offset(page, page_size)?;
        let ids = self.scores.range(order, offset, page_size, true).await;
        Ok(self.articles.get_many(&ids))
    }

    pub async fn list_group_top(
        &self,
        group: &str,
        page: usize,
        page_size: usize,
    ) -> Result<Vec<Article>> {
        self.list_group(group, OrderKind::Score, page, page_size)
            .await
    }

    pub async fn list_group_newest(
        &self,
        group: &str,
        page: usize,
        page_size: usize,
    ) -> Result<Vec<Article>> {
        self.list_group(group, OrderKind::Time, page, page_size).await
    }

    pub async fn list_group(
        &self,
        group: &str,
        order: OrderKind,
        page: usize,
        page_size: usize,
    ) -> Result<Vec<Article>> {
        let offset = page_offset(page, page_size)?;
        let ids = self
            .groups
            .list_group(
                group,
                order,
                offset,
                page_size,
                self.clock.now(),
                &self.scores,
            )
            .await;
        Ok(self.articles.get_many(&ids))
    }

    /// Returns `true` if the article was not already in the group.
    pub async fn add_to_group(&self, group: &str, article_id: ArticleId) -> Result<bool> {
        self.ensure_exists(article_id)?;
        Ok(self.groups.add_to_group(group, article_id).await)
    }

    pub async fn add_groups<S: AsRef<str>>(&self, article_id: ArticleId, groups: &[S]) -> Result<()> {
        self.ensure_exists(article_id)?;
        for group in groups {
            self.groups.add_to_group(group.as_ref(), article_id).await;
        }
        Ok(())
    }

    pub async fn remove_from_group(&self, group: &str, article_id: ArticleId) -> Result<bool> {
        self.ensure_exists(article_id)?;
        Ok(self.groups.remove_from_group(group, article_id).await)
    }

    pub async fn group_members(&self, group: &str) -> Vec<ArticleId> {
        self.groups.members(group).await
    }

    /// Remove the article with its votes, ranking entries and group
    /// memberships.
    pub async fn delete_article(&self, article_id: ArticleId) -> Result<Article> {
        self.ledger.remove(article_id).await?;
        self.scores.remove(article_id).await;
        self.groups.remove_article(article_id).await;

        let article = self
            .articles
            .remove(article_id)
            .ok_or_else(|| AppError::Internal(format!("Article {} had no record", article_id)))?;

        tracing::info!("Article {} deleted", article_id);
        Ok(article)
    }

    /// Drop voter sets past their window and group rankings past their TTL.
    pub fn sweep_expired(&self) -> SweepReport {
        let now = self.clock.now();
        SweepReport {
            vote_sets: self.ledger.purge_expired(now),
            group_caches: self.groups.purge_expired(now),
        }
    }

    pub fn article_count(&self) -> usize {
        self.articles.len()
    }

    fn ensure_exists(&self, article_id: ArticleId) -> Result<()> {
        if self.articles.contains(article_id) {
            Ok(())
        } else {
            Err(AppError::NotFound(format!(
                "Article {} not found",
                article_id
            )))
        }
    }
}

fn page_offset(page: usize, page_size: usize) -> Result<usize> {
    if page == 0 {
        return Err(AppError::InvalidArgument(
            "Pages are numbered from 1".to_string(),
        ));
    }
    if page_size == 0 {
        return Err(AppError::InvalidArgument(
            "Page size must be positive".to_string(),
        ));
    }

    (page - 1)
        .checked_mul(page_size)
        .ok_or_else(|| AppError::InvalidArgument("Page out of range".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::models::RejectReason;

    fn engine() -> (VotingEngine, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(1_700_000_000));
        let engine = VotingEngine::new(EngineSettings::default(), clock.clone());
        (engine, clock)
    }

    #[tokio::test]
    async fn alice_and_bob() {
        let (engine, _) = engine();
        let a = engine
            .post("alice", "A", "https://example.com/a", VoteDirection::Upvote)
            .await
            .unwrap();

        let article = engine.get_article(a).unwrap();
        assert_eq!((article.votes, article.upvotes, article.downvotes), (1, 1, 0));

        let outcome = engine.vote("bob", a, VoteDirection::Downvote).await.unwrap();
        assert_eq!(outcome, VoteOutcome::Accepted);
        let article = engine.get_article(a).unwrap();
        assert_eq!((article.votes, article.upvotes, article.downvotes), (2, 1, 1));

        let outcome = engine.vote("bob", a, VoteDirection::Upvote).await.unwrap();
        assert_eq!(outcome, VoteOutcome::Switched);
        let article = engine.get_article(a).unwrap();
        assert_eq!((article.votes, article.upvotes, article.downvotes), (2, 2, 0));
    }

    #[tokio::test]
    async fn voting_closes_after_a_week() {
        let (engine, clock) = engine();
        let a = engine
            .post("alice", "A", "https://example.com/a", VoteDirection::Upvote)
            .await
            .unwrap();

        clock.advance(ONE_WEEK_IN_SECONDS + 1);
        let outcome = engine.vote("bob", a, VoteDirection::Upvote).await.unwrap();
        assert_eq!(outcome, VoteOutcome::Rejected(RejectReason::TooLate));
        assert_eq!(engine.get_article(a).unwrap().votes, 1);
    }

    #[tokio::test]
    async fn page_zero_is_invalid() {
        let (engine, _) = engine();
        assert!(matches!(
            engine.list_top(0, 25).await,
            Err(AppError::InvalidArgument(_))
        ));
        assert!(matches!(
            engine.list_top(1, 0).await,
            Err(AppError::InvalidArgument(_))
        ));
        assert!(engine.list_top(1, 25).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn group_ops_require_existing_article() {
        let (engine, _) = engine();
        assert!(matches!(
            engine.add_to_group("g", 5).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            engine.vote("bob", 5, VoteDirection::Upvote).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn delete_removes_everywhere() {
        let (engine, _) = engine();
        let a = engine
            .post("alice", "A", "https://example.com/a", VoteDirection::Upvote)
            .await
            .unwrap();
        engine.add_groups(a, &["g", "h"]).await.unwrap();

        let deleted = engine.delete_article(a).await.unwrap();
        assert_eq!(deleted.id, a);
        assert!(engine.list_top(1, 25).await.unwrap().is_empty());
        assert!(engine.list_group_top("g", 1, 25).await.unwrap().is_empty());
        assert!(engine.group_members("h").await.is_empty());
        assert!(matches!(
            engine.score_of(a).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            engine.delete_article(a).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn sweep_reports_what_expired() {
        let (engine, clock) = engine();
        let a = engine
            .post("alice", "A", "https://example.com/a", VoteDirection::Upvote)
            .await
            .unwrap();
        engine.add_to_group("g", a).await.unwrap();
        engine.list_group_top("g", 1, 25).await.unwrap();

        assert_eq!(engine.sweep_expired(), SweepReport::default());

        clock.advance(ONE_WEEK_IN_SECONDS + 1);
        assert_eq!(
            engine.sweep_expired(),
            SweepReport {
                vote_sets: 1,
                group_caches: 1
            }
        );
        assert_eq!(engine.get_article(a).unwrap().upvotes, 1);
    }
}
