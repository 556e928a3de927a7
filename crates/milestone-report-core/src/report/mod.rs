pub mod model;
pub mod score;
pub mod summary;
