//! Line splitting and tokenization of config text.

/// Characters that start a comment word.
pub const COMMENT_PREFIXES: [char; 3] = ['#', '%', '/'];

/// One meaningful config line, split on whitespace.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Line<'a> {
    /// 1-based line number in the source text.
    pub number: usize,
    /// Whitespace-separated words, in order.
    pub words: Vec<&'a str>,
}

/// Whether a word starts a comment.
pub fn is_comment(word: &str) -> bool {
    word.starts_with(COMMENT_PREFIXES)
}

/// Split config text into non-empty, non-comment lines.
///
/// Blank lines and lines whose first word starts with `#`, `%` or `/`
/// are dropped, but still advance the line counter.
///
/// ```
/// use weir_config::lexer::lex;
///
/// let lines = lex("# header\nsteps 3\n\n  group  g \n");
/// assert_eq!(lines.len(), 2);
/// assert_eq!(lines[0].number, 2);
/// assert_eq!(lines[1].words, vec!["group", "g"]);
/// ```
pub fn lex(text: &str) -> Vec<Line<'_>> {
    text.lines()
        .enumerate()
        .filter_map(|(i, raw)| {
            let words: Vec<&str> = raw.split_whitespace().collect();
            match words.first() {
                Some(first) if !is_comment(first) => Some(Line {
                    number: i + 1,
                    words,
                }),
                _ => None,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_comment_prefixes_recognised() {
        assert!(is_comment("#x"));
        assert!(is_comment("%"));
        assert!(is_comment("//note"));
        assert!(!is_comment("x#"));
    }

    #[test]
    fn numbering_counts_skipped_lines() {
        let text = "\n% c\n/ c\nsteps 1\n";
        let lines = lex(text);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].number, 4);
    }

    #[test]
    fn tabs_and_crlf_are_whitespace() {
        let lines = lex("write\tout g\r\nsleep 1\r\n");
        assert_eq!(lines[0].words, vec!["write", "out", "g"]);
        assert_eq!(lines[1].words, vec!["sleep", "1"]);
    }

    #[test]
    fn empty_text_has_no_lines() {
        assert!(lex("").is_empty());
        assert!(lex("   \n\t\n").is_empty());
    }
}
