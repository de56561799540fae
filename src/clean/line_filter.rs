//! Stage 6: Line Filter

use crate::charset::{is_allowed_non_ethiopic, is_ethiopic_punctuation, KNOWN_JUNK_LINES};

/// Why a cleaned line is rejected.
pub(crate) enum Rejection {
    Empty,
    NoEthiopicContent,
    KnownJunk,
}

pub(crate) fn rejection(line: &str) -> Option<Rejection> {
    if line.trim().is_empty() {
        Some(Rejection::Empty)
    } else if line
        .chars()
        .all(|c| is_allowed_non_ethiopic(c) || is_ethiopic_punctuation(c))
    {
        Some(Rejection::NoEthiopicContent)
    } else if is_known_junk(line) {
        Some(Rejection::KnownJunk)
    } else {
        None
    }
}

/// Compares with runs of whitespace collapsed, so raw lines match too.
pub(crate) fn is_known_junk(line: &str) -> bool {
    let squeezed = line.split_whitespace().collect::<Vec<_>>().join(" ");
    KNOWN_JUNK_LINES.contains(&squeezed.as_str())
}

/// Returns true if a fully cleaned line is worth writing out.
pub fn keep_line(line: &str) -> bool {
    rejection(line).is_none()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_lines_without_ethiopic_content() {
        assert!(!keep_line("... - ( )"));
        assert!(!keep_line("። ፣ !"));
        assert!(!keep_line("1997 - 2001"));
        assert!(!keep_line(""));
        assert!(!keep_line("   "));
    }

    #[test]
    fn test_keeps_ethiopic_lines() {
        assert!(keep_line("ሰላም"));
        assert!(keep_line("፲፱ ..."));
        assert!(keep_line("(ሀ)"));
    }

    #[test]
    fn test_rejects_known_junk() {
        assert!(!keep_line("ሰለ እዚህ ዜና ዋርካ ስር በአማርኛ ይወያዩ !"));
        assert!(keep_line("ሰለ እዚህ ዜና"));
        assert!(is_known_junk("  ሰለ እዚህ ዜና ዋርካ\tስር በአማርኛ ይወያዩ  !"));
    }
}
