pub mod content;
pub mod export;
pub mod image;
pub mod llm;
pub mod setup;
pub mod workflow;
