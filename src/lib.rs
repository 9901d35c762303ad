//! YouTube thumbnail suggestion generator
//!
//! Turns a video title and keywords into a batch of styled thumbnail
//! suggestions using a hosted text-generation model, and renders each
//! suggestion as a downloadable 1280×720 PNG card.

pub mod ai;
pub mod app;
pub mod error;
pub mod handler;
pub mod models;
pub mod normalizer;
pub mod prompts;
pub mod render;
pub mod server;

pub use error::{Error, Result};
