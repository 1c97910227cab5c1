//! Response policy: welcome path, grounded path, fixed degradation strings
//!
//! Every failure past retrieval resolves to one of two fixed strings; which
//! one only matters for diagnosis. The caller always gets text back.

use std::sync::Arc;

use tracing::{debug, error, info};

use crate::error::Error;
use crate::generation::{CompletionProvider, PromptBuilder};
use crate::retrieval::RetrievedPassage;

/// Returned when no grounding context exists; no remote call is made
pub const WELCOME_MESSAGE: &str = "Welcome to AllOfTech! We're a technology agency specializing in AI/ML, blockchain, web and mobile apps, UX/UI design, and branding. How can we help you achieve your goals?";

/// Returned when the completion endpoint answers with a non-success status
pub const APOLOGY_MESSAGE: &str = "Sorry, I faced an issue while generating the response.";

/// Returned when the completion call fails in transport or parsing
pub const INTERRUPTION_MESSAGE: &str = "System interruption detected. Please try again shortly.";

/// Turns a query and its grounding passages into the final answer text
pub struct Responder {
    completion: Arc<dyn CompletionProvider>,
}

impl Responder {
    pub fn new(completion: Arc<dyn CompletionProvider>) -> Self {
        Self { completion }
    }

    /// Answer a query given its retrieved passages
    ///
    /// An empty passage list short-circuits to the welcome message without
    /// touching the network. Otherwise a single completion is attempted and
    /// its failures map to the fixed apology or interruption strings.
    pub async fn respond(
        &self,
        query: &str,
        passages: &[RetrievedPassage],
        product: &str,
    ) -> String {
        if passages.is_empty() {
            debug!("No grounding context for '{}'; welcome path taken", product);
            return WELCOME_MESSAGE.to_string();
        }

        let context = PromptBuilder::build_context(passages);
        let prompt = PromptBuilder::build_grounded_prompt(query, &context, product);
        info!(
            "Generating grounded answer for '{}' with {} passages",
            product,
            passages.len()
        );

        match self.completion.complete(&prompt).await {
            Ok(answer) => answer,
            Err(Error::CompletionStatus { status, body }) => {
                error!("Completion endpoint returned HTTP {}: {}", status, body);
                APOLOGY_MESSAGE.to_string()
            }
            Err(e) => {
                error!("Completion call failed: {}", e);
                INTERRUPTION_MESSAGE.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::testing::StubCompletion;

    fn passage(text: &str) -> RetrievedPassage {
        RetrievedPassage {
            text: text.to_string(),
            similarity: 0.8,
        }
    }

    #[tokio::test]
    async fn test_empty_passages_take_welcome_path() {
        let stub = Arc::new(StubCompletion::ok("should never appear"));
        let responder = Responder::new(stub.clone());

        let answer = responder.respond("hello", &[], "Acme").await;
        assert_eq!(answer, WELCOME_MESSAGE);
        // The welcome path makes no remote call
        assert_eq!(stub.call_count(), 0);
    }

    #[tokio::test]
    async fn test_grounded_answer_returned_verbatim() {
        let stub = Arc::new(StubCompletion::ok("We accept credit card and bank transfer."));
        let responder = Responder::new(stub.clone());

        let passages = vec![passage("[ACME] We accept credit card and bank transfer.")];
        let answer = responder
            .respond("what payment methods do you accept", &passages, "Acme")
            .await;
        assert_eq!(answer, "We accept credit card and bank transfer.");

        let prompts = stub.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("[ACME] We accept credit card and bank transfer."));
        assert!(prompts[0].ends_with("Question: what payment methods do you accept"));
    }

    #[tokio::test]
    async fn test_upstream_status_maps_to_apology() {
        let stub = Arc::new(StubCompletion::status(500, "internal error"));
        let responder = Responder::new(stub);

        let answer = responder.respond("q", &[passage("[ACME] chunk")], "Acme").await;
        assert_eq!(answer, APOLOGY_MESSAGE);
    }

    #[tokio::test]
    async fn test_transport_failure_maps_to_interruption() {
        let stub = Arc::new(StubCompletion::transport("connection refused"));
        let responder = Responder::new(stub.clone());

        let answer = responder.respond("q", &[passage("[ACME] chunk")], "Acme").await;
        assert_eq!(answer, INTERRUPTION_MESSAGE);
        // Exactly one attempt, no retry
        assert_eq!(stub.call_count(), 1);
    }
}
