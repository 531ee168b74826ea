/// Checks if a candidate string matches a glob pattern
///
/// The whole candidate must match. Two metacharacters are supported:
/// - `*` matches any run of characters, including an empty one
/// - `?` matches exactly one character
///
/// # Examples
///
/// ```
/// use roundcrawl::url::matches_wildcard;
///
/// assert!(matches_wildcard("*.zip", "http://x.test/f.zip"));
/// assert!(matches_wildcard("http://?.test/*", "http://x.test/a"));
/// assert!(!matches_wildcard("*.zip", "http://x.test/f.tar"));
/// ```
pub fn matches_wildcard(pattern: &str, candidate: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let candidate: Vec<char> = candidate.chars().collect();

    let (mut p, mut c) = (0, 0);
    // Position of the last `*` seen and the candidate index it is currently absorbing up to
    let mut backtrack: Option<(usize, usize)> = None;

    while c < candidate.len() {
        match pattern.get(p) {
            Some('*') => {
                backtrack = Some((p, c));
                p += 1;
            }
            Some(&ch) if ch == '?' || ch == candidate[c] => {
                p += 1;
                c += 1;
            }
            _ => match backtrack {
                Some((star, absorbed)) => {
                    p = star + 1;
                    c = absorbed + 1;
                    backtrack = Some((star, absorbed + 1));
                }
                None => return false,
            },
        }
    }

    // Trailing stars match the empty remainder
    pattern[p..].iter().all(|&ch| ch == '*')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match() {
        assert!(matches_wildcard("http://x.test/a", "http://x.test/a"));
        assert!(!matches_wildcard("http://x.test/a", "http://x.test/ab"));
    }

    #[test]
    fn test_star_matches_any_run() {
        assert!(matches_wildcard("*kekenet*", "http://www.kekenet.com/Article/"));
        assert!(matches_wildcard("*", ""));
        assert!(matches_wildcard("*", "anything"));
        assert!(matches_wildcard("a*", "a"));
        assert!(!matches_wildcard("*kekenet*", "http://example.com/"));
    }

    #[test]
    fn test_question_mark_matches_one_char() {
        assert!(matches_wildcard("f?.zip", "f1.zip"));
        assert!(!matches_wildcard("f?.zip", "f.zip"));
        assert!(!matches_wildcard("f?.zip", "f12.zip"));
    }

    #[test]
    fn test_backtracking() {
        assert!(matches_wildcard("*a*b", "xaxxab"));
        assert!(matches_wildcard("*.mp3", "http://h/a.mp3.mp3"));
        assert!(!matches_wildcard("*a*b", "xaxxa"));
    }

    #[test]
    fn test_empty_strings() {
        assert!(matches_wildcard("", ""));
        assert!(!matches_wildcard("", "a"));
        assert!(!matches_wildcard("?", ""));
    }

    #[test]
    fn test_case_sensitivity() {
        assert!(!matches_wildcard("*ZIP", "f.zip"));
    }

    #[test]
    fn test_multibyte_characters() {
        assert!(matches_wildcard("*文档?", "http://h/文档1"));
    }
}
