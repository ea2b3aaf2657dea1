use crate::traits::ChatModel;
use crate::{ModelError, RetrievalResult};
use tracing::debug;

/// Per-page character budget inside the prompt context.
pub const CONTEXT_CHAR_BUDGET: usize = 1_000;

pub const NO_RELEVANT_INFORMATION: &str =
    "I couldn't find relevant information in the manuals.";

/// Hard cutoff at `max_chars` characters; never splits a UTF-8 sequence.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

pub fn build_context(results: &[RetrievalResult]) -> String {
    let mut context = String::new();
    for result in results {
        context.push_str(&format!(
            "Manual {} (relevance: {:.2}):\n{}\n\n",
            result.manual(),
            result.similarity(),
            truncate_chars(&result.content, CONTEXT_CHAR_BUDGET)
        ));
    }
    context
}

pub fn build_prompt(question: &str, context: &str) -> String {
    format!(
        "Based on the company manuals below, answer clearly and practically:\n\n\
         {context}\n\n\
         Question: {question}\n\n\
         Answer based on the manuals:"
    )
}

/// Answers `question` from the retrieved pages. No results means no model call.
pub fn synthesize<C: ChatModel>(
    question: &str,
    results: &[RetrievalResult],
    chat_model: &C,
) -> Result<String, ModelError> {
    if results.is_empty() {
        return Ok(NO_RELEVANT_INFORMATION.to_string());
    }

    let prompt = build_prompt(question, &build_context(results));
    debug!(prompt_chars = prompt.len(), passages = results.len(), "invoking chat model");
    chat_model.generate(&prompt)
}
