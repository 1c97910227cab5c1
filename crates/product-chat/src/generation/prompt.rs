//! Prompt templates for grounded answers

use crate::retrieval::RetrievedPassage;

/// Prompt builder for grounded queries
pub struct PromptBuilder;

impl PromptBuilder {
    /// Concatenate labeled passages into the context block
    pub fn build_context(passages: &[RetrievedPassage]) -> String {
        passages
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Build the full grounded prompt: context first, instruction block,
    /// the literal user question last
    pub fn build_grounded_prompt(question: &str, context: &str, product: &str) -> String {
        format!(
            r#"Context:
{context}

INSTRUCTIONS:
1. You are a professional assistant representing {product}; keep a courteous, business-appropriate tone
2. Answer using ONLY the information in the context above
3. If the context does not support an answer, reply: "I'm sorry, I don't have that information right now. Please contact us at contact@alloftech.com and our team will assist you directly."
4. For questions about payment methods, mention only the methods explicitly present in the context
5. Be concise

Question: {question}"#,
            context = context,
            product = product,
            question = question
        )
    }
}
