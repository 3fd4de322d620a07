use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::{
    error::{AppError, Result},
    models::{ArticleId, RejectReason, VoteDirection, VoteOutcome},
    services::{article_store::ArticleStore, score_index::ScoreIndex},
};

/// Who voted which way on one article.
#[derive(Debug, Default)]
struct VoteSets {
    upvoters: HashSet<String>,
    downvoters: HashSet<String>,
    created_at: i64,
    expires_at: i64,
    removed: bool,
}

impl VoteSets {
    fn voters(&self, direction: VoteDirection) -> &HashSet<String> {
        match direction {
            VoteDirection::Upvote => &self.upvoters,
            VoteDirection::Downvote => &self.downvoters,
        }
    }

    fn voters_mut(&mut self, direction: VoteDirection) -> &mut HashSet<String> {
        match direction {
            VoteDirection::Upvote => &mut self.upvoters,
            VoteDirection::Downvote => &mut self.downvoters,
        }
    }

    fn is_expired(&self, now: i64) -> bool {
        now > self.expires_at
    }

    fn is_empty(&self) -> bool {
        self.upvoters.is_empty() && self.downvoters.is_empty()
    }
}

/// Counter deltas for one accepted transition, as `(up, down)`.
fn counter_delta(direction: VoteDirection, switched: bool) -> (i64, i64) {
    match (direction, switched) {
        (VoteDirection::Upvote, false) => (1, 0),
        (VoteDirection::Downvote, false) => (0, 1),
        (VoteDirection::Upvote, true) => (1, -1),
        (VoteDirection::Downvote, true) => (-1, 1),
    }
}

/// Per-article voter sets, each behind its own lock so votes on different
/// articles never contend.
#[derive(Debug)]
pub struct VoteLedger {
    entries: DashMap<ArticleId, Arc<Mutex<VoteSets>>>,
    vote_window_secs: i64,
    vote_score: i64,
}

impl VoteLedger {
    pub fn new(vote_window_secs: i64, vote_score: i64) -> Self {
        Self {
            entries: DashMap::new(),
            vote_window_secs,
            vote_score,
        }
    }

    fn slot(&self, article_id: ArticleId) -> Result<Arc<Mutex<VoteSets>>> {
        self.entries
            .get(&article_id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| AppError::NotFound(format!("Article {} not found", article_id)))
    }

    /// Seed the ledger with the author's own vote. The score ordering is
    /// seeded separately by `ScoreIndex::insert`.
    pub fn record_initial_vote(
        &self,
        article_id: ArticleId,
        author: &str,
        direction: VoteDirection,
        created_at: i64,
        articles: &ArticleStore,
    ) -> Result<()> {
        let mut sets = VoteSets {
            created_at,
            expires_at: created_at + self.vote_window_secs,
            ..VoteSets::default()
        };
        sets.voters_mut(direction).insert(author.to_string());

        let (up, down) = counter_delta(direction, false);
        articles.apply_vote_delta(article_id, up, down)?;

        self.entries.insert(article_id, Arc::new(Mutex::new(sets)));
        Ok(())
    }

    /// Cast `user_id`'s vote. The window check, the membership change, the
    /// counter update and the score nudge all happen under the article's
    /// lock.
    pub async fn vote(
        &self,
        article_id: ArticleId,
        user_id: &str,
        direction: VoteDirection,
        now: i64,
        articles: &ArticleStore,
        scores: &ScoreIndex,
    ) -> Result<VoteOutcome> {
        let slot = self.slot(article_id)?;
        let mut sets = slot.lock().await;

        if sets.removed {
            return Err(AppError::NotFound(format!(
                "Article {} not found",
                article_id
            )));
        }

        let created_at = scores
            .time_of(article_id)
            .await
            .ok_or_else(|| AppError::NotFound(format!("Article {} not found", article_id)))?;
        let cutoff = now - self.vote_window_secs;
        if created_at < cutoff {
            return Ok(VoteOutcome::Rejected(RejectReason::TooLate));
        }

        let switched = sets.voters(direction.opposite()).contains(user_id);
        if !switched && sets.voters(direction).contains(user_id) {
            return Ok(VoteOutcome::NoOp);
        }

        let (up, down) = counter_delta(direction, switched);
        let magnitude = if switched { 2 } else { 1 };
        let score_delta = magnitude * self.vote_score * direction.sign();

        articles.apply_vote_delta(article_id, up, down)?;
        if let Err(e) = scores.adjust_score(article_id, score_delta).await {
            // keep counters and score in step
            articles.apply_vote_delta(article_id, -up, -down)?;
            return Err(e);
        }

        if switched {
            sets.voters_mut(direction.opposite()).remove(user_id);
        }
        sets.voters_mut(direction).insert(user_id.to_string());
        sets.expires_at = sets.created_at + self.vote_window_secs;

        Ok(if switched {
            VoteOutcome::Switched
        } else {
            VoteOutcome::Accepted
        })
    }

    /// The direction `user_id` currently votes on the article, if any.
    pub async fn voter_state(
        &self,
        article_id: ArticleId,
        user_id: &str,
    ) -> Result<Option<VoteDirection>> {
        let slot = self.slot(article_id)?;
        let sets = slot.lock().await;

        Ok([VoteDirection::Upvote, VoteDirection::Downvote]
            .into_iter()
            .find(|direction| sets.voters(*direction).contains(user_id)))
    }

    /// Drop the voter sets of articles whose voting window has passed.
    /// Counters on the articles are left as they are. Slots busy with a
    /// vote are skipped until the next sweep.
    pub fn purge_expired(&self, now: i64) -> usize {
        let mut purged = 0;

        for entry in self.entries.iter() {
            if let Ok(mut sets) = entry.value().try_lock() {
                if sets.is_expired(now) && !sets.is_empty() {
                    sets.upvoters = HashSet::new();
                    sets.downvoters = HashSet::new();
                    purged += 1;
                }
            }
        }

        purged
    }

    /// Forget the article. A vote already waiting on the lock observes the
    /// removal and fails with `NotFound`.
    pub async fn remove(&self, article_id: ArticleId) -> Result<()> {
        let (_, slot) = self
            .entries
            .remove(&article_id)
            .ok_or_else(|| AppError::NotFound(format!("Article {} not found", article_id)))?;

        let mut sets = slot.lock().await;
        sets.removed = true;
        sets.upvoters.clear();
        sets.downvoters.clear();

        Ok(())
    }

    pub async fn voter_counts(&self, article_id: ArticleId) -> Result<(usize, usize)> {
        let slot = self.slot(article_id)?;
        let sets = slot.lock().await;
        Ok((sets.upvoters.len(), sets.downvoters.len()))
    }
}
