pub mod article;
pub mod group;
pub mod vote;

pub use article::*;
pub use group::*;
pub use vote::*;
