//! Text chunking for length-limited services
//!
//! Translation and TTS endpoints both cap the amount of text per request.
//! Lengths are counted in characters, not bytes, so Indic scripts split
//! at the same points as Latin ones.
//!
//! [`split_into_chunks`] normalizes whitespace, which is fine for speech.
//! [`split_preserving_separators`] keeps every original character so line
//! structure survives translation.

/// Split `text` into pieces of at most `max_chars` characters
///
/// Splits prefer whitespace boundaries; a single word longer than the limit
/// is cut at a character boundary. Leading and trailing whitespace of each
/// chunk is trimmed and empty chunks are dropped.
///
/// # Examples
///
/// ```
/// use conversai::text::split_into_chunks;
///
/// let chunks = split_into_chunks("one two three four", 9);
/// assert_eq!(chunks, vec!["one two", "three", "four"]);
/// ```
pub fn split_into_chunks(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();

        if word_len > max_chars {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let chars: Vec<char> = word.chars().collect();
            for piece in chars.chunks(max_chars) {
                chunks.push(piece.iter().collect());
            }
            continue;
        }

        let needed = if current.is_empty() {
            word_len
        } else {
            current_len + 1 + word_len
        };

        if needed > max_chars {
            chunks.push(std::mem::take(&mut current));
            current.push_str(word);
            current_len = word_len;
        } else {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
            current_len = needed;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

/// Split `text` into slices of at most `max_chars` characters
///
/// Concatenating the slices gives back `text` exactly. Text that fits is
/// returned whole; otherwise splits fall after newlines where possible,
/// then after whitespace, and only cut inside a word that alone exceeds
/// the limit.
///
/// # Examples
///
/// ```
/// use conversai::text::split_preserving_separators;
///
/// let text = "- one\n- two\n- three";
/// let chunks = split_preserving_separators(text, 12);
/// assert_eq!(chunks, vec!["- one\n- two\n", "- three"]);
/// assert_eq!(chunks.concat(), text);
/// ```
pub fn split_preserving_separators(text: &str, max_chars: usize) -> Vec<&str> {
    let max_chars = max_chars.max(1);
    if text.is_empty() {
        return Vec::new();
    }
    if text.chars().count() <= max_chars {
        return vec![text];
    }

    // contiguous pieces that are each within the limit
    let mut pieces: Vec<&str> = Vec::new();
    for line in text.split_inclusive('\n') {
        if line.chars().count() <= max_chars {
            pieces.push(line);
            continue;
        }
        for word in line.split_inclusive(char::is_whitespace) {
            let mut rest = word;
            while rest.chars().count() > max_chars {
                let cut = rest
                    .char_indices()
                    .nth(max_chars)
                    .map_or(rest.len(), |(i, _)| i);
                pieces.push(&rest[..cut]);
                rest = &rest[cut..];
            }
            if !rest.is_empty() {
                pieces.push(rest);
            }
        }
    }

    let mut chunks = Vec::new();
    let (mut start, mut end, mut len) = (0usize, 0usize, 0usize);
    for piece in pieces {
        let piece_len = piece.chars().count();
        if len > 0 && len + piece_len > max_chars {
            chunks.push(&text[start..end]);
            start = end;
            len = 0;
        }
        end += piece.len();
        len += piece_len;
    }
    if end > start {
        chunks.push(&text[start..end]);
    }
    chunks
}
