pub mod applications;
pub mod scoring;
