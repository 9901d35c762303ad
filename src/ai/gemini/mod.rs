pub mod client;
pub mod generate;
pub mod types;

pub use client::GeminiHttpClient;
pub use generate::GeminiGenerationClient;
