use std::str::FromStr;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteDirection {
    Upvote,
    Downvote,
}

impl VoteDirection {
    pub fn opposite(self) -> Self {
        match self {
            VoteDirection::Upvote => VoteDirection::Downvote,
            VoteDirection::Downvote => VoteDirection::Upvote,
        }
    }

    /// +1 for upvotes, -1 for downvotes.
    pub fn sign(self) -> i64 {
        match self {
            VoteDirection::Upvote => 1,
            VoteDirection::Downvote => -1,
        }
    }
}

impl FromStr for VoteDirection {
    type Err = AppError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "upvote" | "Upvote" | "up" => Ok(VoteDirection::Upvote),
            "downvote" | "Downvote" | "down" => Ok(VoteDirection::Downvote),
            _ => Err(AppError::InvalidArgument(format!(
                "Unknown vote direction: {}",
                s
            ))),
        }
    }
}

impl TryFrom<i16> for VoteDirection {
    type Error = AppError;
    fn try_from(value: i16) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(VoteDirection::Upvote),
            -1 => Ok(VoteDirection::Downvote),
            other => Err(AppError::InvalidArgument(format!(
                "Invalid vote type: {}",
                other
            ))),
        }
    }
}

/// Vote type as it arrives on the wire: `1` / `-1` or `"upvote"` / `"downvote"`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawVoteType {
    Number(i16),
    Name(String),
}

impl TryFrom<RawVoteType> for VoteDirection {
    type Error = AppError;
    fn try_from(raw: RawVoteType) -> Result<Self, Self::Error> {
        match raw {
            RawVoteType::Number(n) => VoteDirection::try_from(n),
            RawVoteType::Name(name) => name.parse(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    TooLate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "reason", rename_all = "snake_case")]
pub enum VoteOutcome {
    Accepted,
    Switched,
    Rejected(RejectReason),
    NoOp,
}

// Vote request
#[derive(Debug, Validate, Deserialize)]
pub struct VoteArticleRequest {
    #[validate(length(min = 1, max = 64))]
    pub user: String,
    pub vote_type: RawVoteType,
}

// Vote response
#[derive(Debug, Serialize)]
pub struct VoteResponse {
    #[serde(flatten)]
    pub outcome: VoteOutcome,
    pub user_vote: Option<VoteDirection>,
    pub votes: i64,
    pub upvotes: i64,
    pub downvotes: i64,
    pub score: i64,
}
