pub mod config;
pub mod engine;
pub mod expression;
pub mod global;
pub mod vocab;
