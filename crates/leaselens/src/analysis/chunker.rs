/// Default per-chunk token budget for the analysis prompts.
pub const DEFAULT_MAX_TOKENS: usize = 4000;

/// Rough approximation used in place of a tokenizer: 1 token ~ 4 characters.
const CHARS_PER_TOKEN: usize = 4;

/// Split text into fixed-size character windows of `max_tokens * 4` chars,
/// taken left to right with no overlap. The final chunk may be shorter.
///
/// Windows are measured in characters, not bytes, so multi-byte text is never
/// split inside a scalar value. Concatenating the chunks in order reproduces
/// the input exactly.
pub fn split_into_chunks(text: &str, max_tokens: usize) -> Vec<String> {
    let window = max_tokens * CHARS_PER_TOKEN;
    if window == 0 || text.is_empty() {
        return Vec::new();
    }

    let mut chunks = Vec::new();
    let mut chars = text.chars();
    loop {
        let chunk: String = chars.by_ref().take(window).collect();
        if chunk.is_empty() {
            break;
        }
        chunks.push(chunk);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_yields_single_chunk() {
        let chunks = split_into_chunks("short lease text", DEFAULT_MAX_TOKENS);
        assert_eq!(chunks, vec!["short lease text".to_string()]);
    }

    #[test]
    fn chunk_count_is_ceiling_of_length_over_window() {
        // window = 2 tokens * 4 = 8 chars
        let text = "a".repeat(20);
        let chunks = split_into_chunks(&text, 2);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].chars().count(), 8);
        assert_eq!(chunks[1].chars().count(), 8);
        assert_eq!(chunks[2].chars().count(), 4);
    }

    #[test]
    fn concatenation_reconstructs_input() {
        let text = "lorem ipsum dolor sit amet ".repeat(40);
        let chunks = split_into_chunks(&text, 10);
        assert!(chunks.iter().all(|chunk| chunk.chars().count() <= 40));
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn multibyte_text_is_split_on_character_boundaries() {
        let text = "租赁合同：甲方与乙方就下列房屋达成协议。".repeat(10);
        let chunks = split_into_chunks(&text, 8);
        assert_eq!(chunks.concat(), text);
        assert!(chunks.iter().all(|chunk| chunk.chars().count() <= 32));
    }

    #[test]
    fn twelve_thousand_chars_fit_one_default_chunk() {
        let text = "x".repeat(12_000);
        assert_eq!(split_into_chunks(&text, DEFAULT_MAX_TOKENS).len(), 1);
    }

    #[test]
    fn empty_text_yields_no_chunks() {
        assert!(split_into_chunks("", DEFAULT_MAX_TOKENS).is_empty());
    }
}
