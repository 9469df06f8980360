/// Split text into words on the space byte.
///
/// Runs of spaces collapse and leading or trailing spaces produce no empty
/// words. Tabs and other control characters are not delimiters; they stay
/// inside the word so validation can reject it.
pub fn split_into_words(text: &str) -> Vec<&str> {
    text.split(' ').filter(|word| !word.is_empty()).collect()
}

/// A word is valid when it holds no control bytes (below 0x20).
pub fn is_valid_word(word: &str) -> bool {
    !word.bytes().any(|b| b < b' ')
}
