//! Stage 5: Edge Trimmer
//!
//! Strips list and table remnants from the line ends while keeping the
//! punctuation that belongs to the first and last word.

use super::Stage;
use crate::charset::{
    is_edge_strippable, is_ethiopic, regex_class, EDGE_STRIPPABLE, KEEP_END_BRACKETS,
    KEEP_END_QUOTES, KEEP_START_BRACKETS, KEEP_START_QUOTES,
};
use crate::error::{Error, Result};
use regex::Regex;
use std::sync::LazyLock;

static RE_EDGE_RUN: LazyLock<Regex> = LazyLock::new(|| {
    let class = regex_class(EDGE_STRIPPABLE);
    Regex::new(&format!(r"^{class}{{3,}}.?|.?{class}{{3,}}$")).unwrap()
});

const ELLIPSIS: [char; 3] = ['.', '.', '.'];

/// Characters kept in front of the anchor of a line-start run.
fn kept_before_anchor(run: &[char]) -> String {
    let n = run.len();
    let mut kept = vec![run[n - 1]];
    let mut bracket_quote = Some(n - 2);

    if run[n - 2] == '-' {
        kept.push('-');
        bracket_quote = None;
    } else if run[n - 4..n - 1] == ELLIPSIS {
        kept.extend(ELLIPSIS);
        bracket_quote = n.checked_sub(5);
    }

    if let Some(i) = bracket_quote {
        let c = run[i];
        let partner = i.checked_sub(1).map(|j| run[j]);
        if KEEP_START_BRACKETS.contains(&c) {
            kept.push(c);
            if let Some(q) = partner.filter(|q| KEEP_START_QUOTES.contains(q)) {
                kept.push(q);
            }
        } else if KEEP_START_QUOTES.contains(&c) {
            kept.push(c);
            if let Some(b) = partner.filter(|b| KEEP_START_BRACKETS.contains(b)) {
                kept.push(b);
            }
        }
    }

    // collected back to front
    kept.iter().rev().collect()
}

/// Characters kept after the anchor of a line-end run.
fn kept_after_anchor(run: &[char]) -> String {
    let n = run.len();
    let anchor = run[0];
    let mut kept = String::from(anchor);
    let mut bracket_quote = 1;

    match run[1] {
        '%' if anchor.is_ascii_digit() => {
            kept.push('%');
            bracket_quote = 2;
        }
        '-' => {
            kept.push('-');
            bracket_quote = 2;
        }
        '.' => {
            if run.get(1..4) == Some(&ELLIPSIS[..]) {
                kept.push_str("...");
                bracket_quote = 4;
            } else {
                kept.push('.');
                bracket_quote = 2;
            }
        }
        c @ ('?' | '!') => {
            let three: String = run.iter().skip(1).take(3).collect();
            let two: String = run.iter().skip(1).take(2).collect();
            if three == "!!!" {
                kept.push_str(&three);
                bracket_quote = 4;
            } else if matches!(two.as_str(), "??" | "?!" | "!?" | "!!") {
                kept.push_str(&two);
                bracket_quote = 3;
            } else {
                kept.push(c);
                bracket_quote = 2;
            }
        }
        _ => {}
    }

    if let Some(&c) = run.get(bracket_quote) {
        let partner = run.get(bracket_quote + 1).copied();
        if KEEP_END_BRACKETS.contains(&c) {
            kept.push(c);
            if let Some(q) = partner.filter(|q| KEEP_END_QUOTES.contains(q)) {
                kept.push(q);
            }
        } else if KEEP_END_QUOTES.contains(&c) {
            kept.push(c);
            if let Some(b) = partner.filter(|b| KEEP_END_BRACKETS.contains(b)) {
                kept.push(b);
            }
        }
    }

    kept
}

/// Replacement for one matched run of strippable characters.
///
/// A start run ends with its anchor, an end run begins with it. A run
/// without an anchor covers the whole line and is removed.
pub(crate) fn trim_run(matched: &str) -> Result<String> {
    let run: Vec<char> = matched.chars().collect();
    let (Some(&first), Some(&last)) = (run.first(), run.last()) else {
        return Ok(String::new());
    };

    let at_start = !is_edge_strippable(last);
    let at_end = !is_edge_strippable(first);
    if !at_start && !at_end {
        return Ok(String::new());
    }
    if at_start && at_end {
        return Err(Error::invariant(
            Stage::EdgeTrimmer,
            format!("run {matched:?} is anchored at both ends"),
        ));
    }
    if run.len() < 4 {
        return Err(Error::invariant(
            Stage::EdgeTrimmer,
            format!("run {matched:?} is shorter than four characters"),
        ));
    }

    let anchor = if at_start { last } else { first };
    if !(is_ethiopic(anchor) || anchor.is_ascii_digit()) {
        return Ok(anchor.to_string());
    }

    Ok(if at_start {
        kept_before_anchor(&run)
    } else {
        kept_after_anchor(&run)
    })
}

/// Stage 5: strip non-semantic characters from the line ends and squeeze
/// whitespace.
///
/// Returns an empty string when the whole line is strippable.
pub fn trim_edges(line: &str) -> Result<String> {
    let mut result = String::with_capacity(line.len());
    let mut last = 0;
    for m in RE_EDGE_RUN.find_iter(line) {
        result.push_str(&line[last..m.start()]);
        result.push_str(&trim_run(m.as_str())?);
        last = m.end();
    }
    result.push_str(&line[last..]);

    Ok(result.split_whitespace().collect::<Vec<_>>().join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trim(line: &str) -> String {
        trim_edges(line).unwrap()
    }

    #[test]
    fn test_whole_line_junk_removed() {
        assert_eq!(trim("... - ( ) "), "");
        assert_eq!(trim("«» ..."), "");
        assert_eq!(trim("«»"), "«»");
    }

    #[test]
    fn test_short_runs_untouched() {
        assert_eq!(trim("“ሰላም”"), "“ሰላም”");
        assert_eq!(trim("-ሰላም."), "-ሰላም.");
    }

    #[test]
    fn test_start_run_keeps_hyphen() {
        assert_eq!(trim("* * -ሰላም"), "-ሰላም");
    }

    #[test]
    fn test_start_run_keeps_ellipsis() {
        assert_eq!(trim("...ሰላም"), "...ሰላም");
        assert_eq!(trim("||“(...ሰላም"), "“(...ሰላም");
        assert_eq!(trim("##...ሰላም"), "...ሰላም");
    }

    #[test]
    fn test_start_run_keeps_one_bracket_and_quote() {
        assert_eq!(trim("*** «ሰላም"), "«ሰላም");
        assert_eq!(trim("--- «(ሰላም)"), "«(ሰላም)");
        assert_eq!(trim("---(«ሰላም"), "(«ሰላም");
        assert_eq!(trim("---((ሰላም"), "(ሰላም");
    }

    #[test]
    fn test_start_run_before_non_ethiopic_anchor() {
        assert_eq!(trim("---«x"), "x");
        assert_eq!(trim("... 1997 ዓ.ም"), "1997 ዓ.ም");
    }

    #[test]
    fn test_end_run_keeps_sentence_end_clusters() {
        assert_eq!(trim("ሰላም?!..."), "ሰላም?!");
        assert_eq!(trim("ሰላም!!! ---"), "ሰላም!!!");
        assert_eq!(trim("ሰላም??***"), "ሰላም??");
        assert_eq!(trim("ሰላም?***"), "ሰላም?");
    }

    #[test]
    fn test_end_run_keeps_ellipsis_and_full_stop() {
        assert_eq!(trim("ሰላም... ***"), "ሰላም...");
        assert_eq!(trim("ሰላም. ***"), "ሰላም.");
        assert_eq!(trim("ሰላም- ***"), "ሰላም-");
    }

    #[test]
    fn test_end_run_keeps_percent_after_digit() {
        assert_eq!(trim("ዋጋ 50% ..."), "ዋጋ 50%");
        assert_eq!(trim("ዋጋ ሀ% ..."), "ዋጋ ሀ");
    }

    #[test]
    fn test_end_run_keeps_quote_and_bracket() {
        assert_eq!(trim("ሰላም።”) --"), "ሰላም።”)");
        assert_eq!(trim("(ሰላም)” ::"), "(ሰላም)”");
        assert_eq!(trim("ሰላም?» ..."), "ሰላም?»");
    }

    #[test]
    fn test_both_ends() {
        assert_eq!(trim("*** «ሰላም» ***"), "«ሰላም»");
    }

    #[test]
    fn test_squeezes_whitespace() {
        assert_eq!(trim("  ሰላም   እንደምን  "), "ሰላም እንደምን");
    }

    #[test]
    fn test_trim_run_rejects_short_anchored_run() {
        let err = trim_run("..ሀ").unwrap_err();
        assert!(err.is_invariant_violation());
    }
}
