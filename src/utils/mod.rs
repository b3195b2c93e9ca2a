pub mod dates;
pub mod errors;
pub mod jwt;
pub mod logger;
