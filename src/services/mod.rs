pub mod pipeline;
pub mod providers;

pub use pipeline::TextGenerationPipeline;
