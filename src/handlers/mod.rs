pub mod articles;
pub mod groups;
