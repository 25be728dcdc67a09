//! Prompt templates and user-visible fallback strings.

/// Returned when retrieval produced nothing to answer from: no chunk index,
/// an empty index, or no match above the similarity threshold.
pub const FAIL_RESPONSE: &str = "Sorry, I'm not able to provide an answer to that question.";

/// Returned for query modes that exist in [`QueryMode`](crate::models::QueryMode)
/// but have no retrieval path yet. Deliberately different from
/// [`FAIL_RESPONSE`].
pub const UNSUPPORTED_MODE_RESPONSE: &str =
    "This query mode is not available yet; use the naive mode instead.";

/// Separator placed between chunks in the naive context section.
pub const CHUNK_SEPARATOR: &str = "\n--New Chunk--\n";

/// System prompt for naive RAG answers.
pub fn naive_rag_response(content_data: &str, response_type: &str) -> String {
    format!(
        "You're a helpful assistant\n\
         Below are the knowledge you know:\n\
         {content_data}\n\
         ---\n\
         If you don't know the answer or if the provided knowledge do not contain sufficient \
         information to provide an answer, just say so. Do not make anything up.\n\
         Generate a response of the target length and format that responds to the user's \
         question, summarizing all information in the input data tables appropriate for the \
         response length and format, and incorporating any relevant general knowledge.\n\
         If you don't know the answer, just say so. Do not make anything up.\n\
         Do not include information where the supporting evidence for it is not provided.\n\
         ---Target response length and format---\n\
         {response_type}"
    )
}
