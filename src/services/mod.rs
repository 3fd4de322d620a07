pub mod article_store;
pub mod background_jobs;
pub mod group_index;
pub mod score_index;
pub mod vote_ledger;
pub mod voting_engine;
