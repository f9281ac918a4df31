pub mod content;
pub mod gateway;
pub mod prediction;
pub mod prompts;

#[cfg(test)]
pub mod testing;

pub use content::ContentGenerator;
pub use gateway::{LlmAgent, LlmGateway};
pub use prediction::RatingPredictor;
