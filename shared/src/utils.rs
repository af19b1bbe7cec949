/// Number of whitespace-delimited words in `text`.
///
/// Stands in for a model token count in usage reports; it is not one.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}
