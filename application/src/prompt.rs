use domain::models::RetrievedChunk;

pub const CONTEXT_HEADER: &str = "Контекст из документов:";
pub const QUESTION_HEADER: &str = "Вопрос пользователя:";
pub const NO_CONTEXT_PLACEHOLDER: &str = "Контекст не найден.";

pub fn join_context(chunks: &[RetrievedChunk]) -> String {
    if chunks.is_empty() {
        return NO_CONTEXT_PLACEHOLDER.to_string();
    }
    chunks
        .iter()
        .map(|c| c.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn compose_prompt(system_prompt: &str, chunks: &[RetrievedChunk], question: &str) -> String {
    format!(
        "{}\n\n{}\n{}\n\n{} {}",
        system_prompt,
        CONTEXT_HEADER,
        join_context(chunks),
        QUESTION_HEADER,
        question
    )
}
