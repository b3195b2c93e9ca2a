pub mod application;
pub mod rubric;
pub mod score;
pub mod user;
