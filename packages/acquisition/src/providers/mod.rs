//! External provider clients.

pub mod gemini;
pub mod serp;

pub use gemini::GeminiModel;
pub use serp::SerpSearcher;
