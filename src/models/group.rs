use serde::Deserialize;
use validator::{Validate, ValidationError};

use crate::models::ArticleId;

#[derive(Debug, Deserialize)]
pub struct AddToGroupRequest {
    pub article_id: ArticleId,
}

#[derive(Debug, Validate, Deserialize)]
pub struct AddGroupsRequest {
    #[validate(length(min = 1), custom(function = "validate_group_names"))]
    pub groups: Vec<String>,
}

fn validate_group_names(groups: &Vec<String>) -> Result<(), ValidationError> {
    let valid = groups.iter().all(|name| is_valid_group_name(name));

    if valid {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_group_name")
            .with_message("Group names must be 1-50 chars of letters, digits, '_' or '-'".into()))
    }
}

pub fn is_valid_group_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 50
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '-')
}
