use std::str::FromStr;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::RawVoteType;

pub type ArticleId = u64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub id: ArticleId,
    pub title: String,
    pub link: String,
    pub author: String,
    /// Unix seconds.
    pub created_at: i64,
    /// Total votes cast (upvotes + downvotes), not the net score.
    pub votes: i64,
    pub upvotes: i64,
    pub downvotes: i64,
}

/// Which of the two orderings a listing walks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderKind {
    #[default]
    Score,
    Time,
}

impl FromStr for OrderKind {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "score" | "Score" => Ok(OrderKind::Score),
            "time" | "Time" => Ok(OrderKind::Time),
            _ => Err(format!("Unknown OrderKind: {}", s)),
        }
    }
}

// Create article request
#[derive(Debug, Validate, Deserialize)]
pub struct CreateArticleRequest {
    #[validate(length(min = 1, max = 64))]
    pub author: String,
    #[validate(length(min = 1, max = 300))]
    pub title: String,
    #[validate(url)]
    pub link: String,
    pub vote_type: RawVoteType,
}

// Article with its current ranking score
#[derive(Debug, Serialize)]
pub struct ArticleResponse {
    #[serde(flatten)]
    pub article: Article,
    pub score: i64,
}

#[derive(Debug, Deserialize)]
pub struct ListArticlesQuery {
    pub page: Option<usize>,
    pub limit: Option<usize>,
    pub order: Option<OrderKind>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_kind_parses_both_spellings() {
        assert_eq!("score".parse::<OrderKind>(), Ok(OrderKind::Score));
        assert_eq!("Time".parse::<OrderKind>(), Ok(OrderKind::Time));
        assert!("hot".parse::<OrderKind>().is_err());
    }

    #[test]
    fn create_request_rejects_bad_link() {
        let request = CreateArticleRequest {
            author: "alice".to_string(),
            title: "A title".to_string(),
            link: "not a url".to_string(),
            vote_type: RawVoteType::Number(1),
        };
        assert!(request.validate().is_err());
    }
}
