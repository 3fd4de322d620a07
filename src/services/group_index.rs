use dashmap::DashMap;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

use crate::{
    models::{ArticleId, OrderKind},
    services::score_index::ScoreIndex,
};

type CacheKey = (OrderKind, String);

#[derive(Debug)]
struct CachedRanking {
    ids: Vec<ArticleId>,
    expires_at: i64,
}

impl CachedRanking {
    fn is_fresh(&self, now: i64) -> bool {
        now < self.expires_at
    }
}

/// Named article collections, each with a short-lived materialized ranking.
#[derive(Debug)]
pub struct GroupIndex {
    groups: RwLock<HashMap<String, HashSet<ArticleId>>>,
    cache: DashMap<CacheKey, Arc<Mutex<Option<CachedRanking>>>>,
    cache_ttl_secs: i64,
}

impl GroupIndex {
    pub fn new(cache_ttl_secs: i64) -> Self {
        Self {
            groups: RwLock::new(HashMap::new()),
            cache: DashMap::new(),
            cache_ttl_secs,
        }
    }

    /// Returns `true` if the article was not already a member.
    pub async fn add_to_group(&self, group: &str, article_id: ArticleId) -> bool {
        self.groups
            .write()
            .await
            .entry(group.to_string())
            .or_default()
            .insert(article_id)
    }

    pub async fn remove_from_group(&self, group: &str, article_id: ArticleId) -> bool {
        let mut groups = self.groups.write().await;

        let Some(members) = groups.get_mut(group) else {
            return false;
        };
        let removed = members.remove(&article_id);
        if members.is_empty() {
            groups.remove(group);
        }

        removed
    }

    /// Members in id order.
    pub async fn members(&self, group: &str) -> Vec<ArticleId> {
        let mut members: Vec<ArticleId> = self
            .groups
            .read()
            .await
            .get(group)
            .map(|m| m.iter().copied().collect())
            .unwrap_or_default();
        members.sort_unstable();
        members
    }

    /// Page through the group's ranking. The ranking is rebuilt from the
    /// score index when the cached copy is missing or older than the TTL;
    /// concurrent callers for the same key wait on a single rebuild.
    pub async fn list_group(
        &self,
        group: &str,
        order: OrderKind,
        offset: usize,
        limit: usize,
        now: i64,
        scores: &ScoreIndex,
    ) -> Vec<ArticleId> {
        let slot = Arc::clone(
            self.cache
                .entry((order, group.to_string()))
                .or_default()
                .value(),
        );
        let mut cached = slot.lock().await;

        if !cached.as_ref().is_some_and(|c| c.is_fresh(now)) {
            let members = self
                .groups
                .read()
                .await
                .get(group)
                .cloned()
                .unwrap_or_default();
            let ids = scores.range_within(order, &members, 0, usize::MAX).await;

            tracing::debug!(
                "Rebuilt {:?} ranking for group {} ({} articles)",
                order,
                group,
                ids.len()
            );
            *cached = Some(CachedRanking {
                ids,
                expires_at: now + self.cache_ttl_secs,
            });
        }

        cached
            .as_ref()
            .map(|c| c.ids.iter().skip(offset).take(limit).copied().collect())
            .unwrap_or_default()
    }

    /// Remove the article from every group and drop those groups' cached
    /// rankings.
    pub async fn remove_article(&self, article_id: ArticleId) -> usize {
        let mut groups = self.groups.write().await;
        let mut touched = Vec::new();

        groups.retain(|name, members| {
            if members.remove(&article_id) {
                touched.push(name.clone());
            }
            !members.is_empty()
        });
        drop(groups);

        for name in &touched {
            self.cache.retain(|(_, group), _| group != name);
        }

        touched.len()
    }

    /// Drop cached rankings past their TTL. Slots being rebuilt are kept.
    pub fn purge_expired(&self, now: i64) -> usize {
        let before = self.cache.len();
        self.cache.retain(|_, slot| match slot.try_lock() {
            Ok(cached) => cached.as_ref().is_some_and(|c| c.is_fresh(now)),
            Err(_) => true,
        });
        before.saturating_sub(self.cache.len())
    }

    pub fn cached_rankings(&self) -> usize {
        self.cache.len()
    }
}
