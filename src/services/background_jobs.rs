use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{Duration, interval};

use crate::{
    error::Result,
    services::voting_engine::{SweepReport, VotingEngine},
};

#[derive(Clone)]
pub struct BackgroundJobsService {
    engine: Arc<VotingEngine>,
    sweep_interval: Duration,
}

impl BackgroundJobsService {
    pub fn new(engine: Arc<VotingEngine>, sweep_interval: Duration) -> Self {
        Self {
            engine,
            sweep_interval,
        }
    }

    /// Start all background jobs
    pub fn start_all_jobs(&self) -> JoinHandle<()> {
        let jobs_service = self.clone();

        // Expire voter sets and group rankings
        let handle = tokio::spawn(async move {
            let mut interval = interval(jobs_service.sweep_interval);
            loop {
                interval.tick().await;
                if let Err(e) = jobs_service.sweep_expired().await {
                    tracing::error!("Failed to sweep expired state: {}", e);
                }
            }
        });

        tracing::info!("Background jobs started successfully");
        handle
    }

    pub async fn sweep_expired(&self) -> Result<SweepReport> {
        let report = self.engine.sweep_expired();
        if report != SweepReport::default() {
            tracing::debug!(
                "Swept {} expired vote sets and {} group rankings",
                report.vote_sets,
                report.group_caches
            );
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::models::VoteDirection;
    use crate::services::voting_engine::{EngineSettings, ONE_WEEK_IN_SECONDS};

    #[tokio::test]
    async fn sweep_purges_closed_articles() {
        let clock = Arc::new(ManualClock::new(1_700_000_000));
        let engine = Arc::new(VotingEngine::new(EngineSettings::default(), clock.clone()));
        engine
            .post("alice", "A", "https://example.com/a", VoteDirection::Upvote)
            .await
            .unwrap();

        let jobs = BackgroundJobsService::new(engine.clone(), Duration::from_secs(60));
        assert_eq!(jobs.sweep_expired().await.unwrap().vote_sets, 0);

        clock.advance(ONE_WEEK_IN_SECONDS + 1);
        assert_eq!(jobs.sweep_expired().await.unwrap().vote_sets, 1);
    }

    #[tokio::test]
    async fn jobs_can_be_stopped() {
        let engine = Arc::new(VotingEngine::with_system_clock(EngineSettings::default()));
        let jobs = BackgroundJobsService::new(engine, Duration::from_millis(10));

        let handle = jobs.start_all_jobs();
        tokio::time::sleep(Duration::from_millis(30)).await;
        handle.abort();
        assert!(handle.await.unwrap_err().is_cancelled());
    }
}
