//! Heuristic cl100k-style token counting.
//!
//! Approximates the token count a cl100k_base BPE encoder would produce,
//! without shipping the vocabulary. The contract is determinism and
//! near-additivity under concatenation, not identity with any external
//! encoder.

/// Byte categories driving run segmentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ByteClass {
    Whitespace,
    Newline,
    Letter,
    Digit,
    Punctuation,
    Other,
}

fn classify(byte: u8) -> ByteClass {
    match byte {
        b'\n' | b'\r' => ByteClass::Newline,
        b' ' | b'\t' | 0x0b | 0x0c => ByteClass::Whitespace,
        b'0'..=b'9' => ByteClass::Digit,
        b'A'..=b'Z' | b'a'..=b'z' | b'_' => ByteClass::Letter,
        // Non-ASCII bytes group into word runs so multi-byte characters are
        // never split.
        0x80..=0xff => ByteClass::Letter,
        b'!'..=b'/' | b':'..=b'@' | b'['..=b'`' | b'{'..=b'~' => ByteClass::Punctuation,
        _ => ByteClass::Other,
    }
}

fn is_word_byte(byte: u8) -> bool {
    matches!(classify(byte), ByteClass::Letter | ByteClass::Digit)
}

fn is_numeric_byte(byte: u8) -> bool {
    byte.is_ascii_digit()
        || matches!(
            byte,
            b'.' | b'e' | b'E' | b'+' | b'-' | b'x' | b'X' | b'a'..=b'f' | b'A'..=b'F'
        )
}

/// Two-character operators that count as a single token.
fn is_two_byte_operator(a: u8, b: u8) -> bool {
    matches!(
        (a, b),
        (b'=', b'=')
            | (b'!', b'=')
            | (b'<', b'=')
            | (b'>', b'=')
            | (b'&', b'&')
            | (b'|', b'|')
            | (b'=', b'>')
            | (b'-', b'>')
            | (b':', b':')
            | (b'+', b'+')
            | (b'-', b'-')
            | (b'+', b'=')
            | (b'-', b'=')
            | (b'*', b'=')
            | (b'/', b'=')
    )
}

/// One contiguous run of same-category bytes with its token cost.
#[derive(Debug, Clone, Copy)]
struct Run {
    start: usize,
    end: usize,
    tokens: u32,
}

/// Splits text into runs; both the counter and the boundary search consume
/// this, so their accounting can never drift apart.
struct RunScanner<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> RunScanner<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            bytes: text.as_bytes(),
            pos: 0,
        }
    }
}

impl Iterator for RunScanner<'_> {
    type Item = Run;

    fn next(&mut self) -> Option<Run> {
        let bytes = self.bytes;
        let len = bytes.len();
        let start = self.pos;
        if start >= len {
            return None;
        }

        let mut end = start + 1;
        let tokens = match classify(bytes[start]) {
            ByteClass::Newline => 1,
            ByteClass::Whitespace => {
                while end < len && classify(bytes[end]) == ByteClass::Whitespace {
                    end += 1;
                }
                1
            }
            ByteClass::Letter => {
                while end < len && is_word_byte(bytes[end]) {
                    end += 1;
                }
                let width = (end - start) as u32;
                match width {
                    0..=4 => 1,
                    5..=8 => 2,
                    9..=12 => 3,
                    _ => width.div_ceil(4),
                }
            }
            ByteClass::Digit => {
                while end < len && is_numeric_byte(bytes[end]) {
                    end += 1;
                }
                ((end - start) as u32).div_ceil(3)
            }
            ByteClass::Punctuation => {
                if end < len && is_two_byte_operator(bytes[start], bytes[end]) {
                    end += 1;
                    // Absorb a trailing `=` so e.g. `===` stays one token.
                    if end < len && bytes[end] == b'=' {
                        end += 1;
                    }
                }
                1
            }
            ByteClass::Other => 1,
        };

        self.pos = end;
        Some(Run { start, end, tokens })
    }
}

/// Count tokens in `text`. Empty input counts as zero.
pub fn count_tokens(text: &str) -> u32 {
    RunScanner::new(text).map(|run| run.tokens).sum()
}

/// Byte offset of the largest prefix of `text` whose token count does not
/// exceed `target`.
///
/// Scans runs from the start, returning the offset just before the run whose
/// inclusion would push the running count strictly above `target`. If the
/// whole text fits, returns `text.len()`.
pub fn find_token_boundary(text: &str, target: u32) -> usize {
    let mut count = 0u32;
    for run in RunScanner::new(text) {
        if count + run.tokens > target {
            return run.start;
        }
        count += run.tokens;
    }
    text.len()
}
