/// Lowercased whitespace tokens. Punctuation stays attached, so `data.` and
/// `data` are different tokens.
pub fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split_whitespace().map(str::to_lowercase)
}
