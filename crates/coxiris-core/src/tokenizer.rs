//! Line normalization and tokenization.
//!
//! A completed line is trimmed, then uppercased, then split on runs of
//! blanks. Trimming always happens before case conversion.

/// Blank characters as understood by the protocol (C `isspace` set).
pub fn is_blank(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\x0b' | '\x0c' | '\r')
}

/// Strip leading and trailing blanks.
pub fn trim(line: &str) -> &str {
    line.trim_matches(is_blank)
}

/// Trim, then ASCII-uppercase a raw line.
///
/// Invalid UTF-8 sequences are replaced rather than rejected; they can never
/// match a command name or pass numeric validation anyway.
pub fn normalize(raw: &[u8]) -> String {
    let text = String::from_utf8_lossy(raw);
    trim(&text).to_ascii_uppercase()
}

/// Split a normalized line into whitespace-delimited tokens.
pub fn tokenize(line: &str) -> Vec<&str> {
    line.split(is_blank).filter(|t| !t.is_empty()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_trims_then_uppercases() {
        assert_eq!(normalize(b"  absolute_move 1 2 3 \t"), "ABSOLUTE_MOVE 1 2 3");
        assert_eq!(normalize(b"\x0b\x0cget_id\r"), "GET_ID");
    }

    #[test]
    fn normalize_is_idempotent() {
        let once = normalize(b"  Set_Speed   12.5  ");
        let twice = normalize(once.as_bytes());
        assert_eq!(once, twice);
        assert_eq!(trim(&once), once);
    }

    #[test]
    fn tokenize_collapses_blank_runs() {
        assert_eq!(
            tokenize("DELTA_MOVE  1\t-2 \t 3"),
            vec!["DELTA_MOVE", "1", "-2", "3"]
        );
    }

    #[test]
    fn tokenize_empty_input() {
        assert!(tokenize("").is_empty());
        assert!(tokenize(&normalize(b"   \t ")).is_empty());
    }

    #[test]
    fn non_ascii_bytes_survive_lossily() {
        let line = normalize(b"help\xff");
        assert!(line.starts_with("HELP"));
        assert_eq!(tokenize(&line).len(), 1);
    }
}
