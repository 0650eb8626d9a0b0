//! One-shot text generation against the Llama Guard checkpoint.
//!
//! Loads the model through the hub, runs a single fixed prompt and prints
//! the result. A missing or misnamed model id is reported rather than
//! propagated; every other failure bubbles up.

use llama_gateway::observability::init_tracing;
use llama_gateway::services::providers::ProviderError;
use llama_gateway::services::TextGenerationPipeline;

const MODEL_ID: &str = "meta-llama/Meta-Llama-Guard-2-8B";
const PROMPT: &str = "Hey, how are you doing today?";

fn main() -> anyhow::Result<()> {
    init_tracing("warn");

    match TextGenerationPipeline::from_pretrained(MODEL_ID) {
        Ok(pipeline) => {
            let output = pipeline.run(PROMPT)?;
            println!("{output}");
            Ok(())
        }
        Err(err @ ProviderError::ModelNotFound(_)) => {
            println!("{}", not_found_report(&err));
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}

fn not_found_report(err: &ProviderError) -> String {
    format!("Error: {err}. Please ensure the model path or ID is correct.")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_report_starts_with_error_prefix() {
        let err = ProviderError::ModelNotFound("meta-llama/does-not-exist".to_string());
        let report = not_found_report(&err);
        assert!(report.starts_with("Error:"));
        assert!(report.contains("meta-llama/does-not-exist"));
    }
}
