//! Glob-style name patterns for include and exclude rules.
//!
//! Grammar:
//!
//! - `?` matches exactly one character.
//! - `*` matches zero or more characters.
//! - `**` matches zero or more whole path segments; `/**/` may also match
//!   a single `/`.
//! - `[...]` is a character class, `[^...]` its negation, `a-z` a range.
//! - `\` escapes the next character, inside classes too.
//! - `/` as the last character only matches directories.
//! - `|` outside a class separates alternatives.
//!
//! Matching is anchored at both ends and works on bytes; case folding, when
//! enabled, is ASCII only.

use serde::{Deserialize, Serialize};

use crate::error::{PatternError, ScanError};

/// Outcome of a one-shot [`match_pattern`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchResult {
    Match,
    NoMatch,
    SyntaxError,
}

/// Compile `pattern` and test it against `name` in one go.
pub fn match_pattern(name: &str, pattern: &str, is_dir: bool, ignore_case: bool) -> MatchResult {
    match Pattern::new(pattern, ignore_case) {
        Ok(p) if p.matches(name, is_dir) => MatchResult::Match,
        Ok(_) => MatchResult::NoMatch,
        Err(_) => MatchResult::SyntaxError,
    }
}

/// A validated pattern, split into its `|` alternatives.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    alternatives: Vec<Box<[u8]>>,
    ignore_case: bool,
}

impl Pattern {
    /// Validate and compile a pattern.
    pub fn new(source: &str, ignore_case: bool) -> Result<Self, PatternError> {
        let alternatives = split_alternatives(source.as_bytes())?
            .into_iter()
            .map(Box::from)
            .collect();

        Ok(Self {
            source: source.to_string(),
            alternatives,
            ignore_case,
        })
    }

    /// The pattern as written.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Test `name`; `is_dir` decides whether a trailing `/` can match.
    pub fn matches(&self, name: &str, is_dir: bool) -> bool {
        let matcher = Matcher {
            is_dir,
            ignore_case: self.ignore_case,
        };
        self.alternatives
            .iter()
            .any(|alt| matcher.matches(alt, name.as_bytes()))
    }
}

/// An ordered list of patterns; matches when any member matches.
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    patterns: Vec<Pattern>,
}

impl PatternSet {
    /// Compile every pattern, failing on the first syntax error.
    pub fn new<I, S>(patterns: I, ignore_case: bool) -> Result<Self, ScanError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| {
                let p = p.as_ref();
                Pattern::new(p, ignore_case).map_err(|source| ScanError::InvalidPattern {
                    pattern: p.to_string(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    /// Check if the set holds no patterns.
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Check if any pattern matches.
    pub fn matches(&self, name: &str, is_dir: bool) -> bool {
        self.patterns.iter().any(|p| p.matches(name, is_dir))
    }
}

/// Split on every `|` that is neither escaped nor inside a class, checking
/// class termination along the way.
fn split_alternatives(pat: &[u8]) -> Result<Vec<&[u8]>, PatternError> {
    let mut alternatives = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < pat.len() {
        match pat[i] {
            b'\\' => i += 2,
            b'[' => i = scan_class(pat, i, None, false)?.1,
            b'|' => {
                alternatives.push(&pat[start..i]);
                i += 1;
                start = i;
            }
            _ => i += 1,
        }
    }
    alternatives.push(&pat[start..]);

    if alternatives.len() > 1 && alternatives.iter().any(|alt| alt.is_empty()) {
        return Err(PatternError::EmptyAlternative);
    }
    Ok(alternatives)
}

/// Walk the class opening at `open`. Returns whether `c` is accepted (always
/// false when `c` is `None`) and the index just past the closing `]`.
fn scan_class(
    pat: &[u8],
    open: usize,
    c: Option<u8>,
    ignore_case: bool,
) -> Result<(bool, usize), PatternError> {
    let unterminated = PatternError::UnterminatedClass { offset: open };
    let fold = |b: u8| if ignore_case { b.to_ascii_lowercase() } else { b };

    let mut j = open + 1;
    let negate = pat.get(j) == Some(&b'^');
    if negate {
        j += 1;
    }

    let mut hit = false;
    loop {
        let mut lo = *pat.get(j).ok_or_else(|| unterminated.clone())?;
        if lo == b']' {
            break;
        }
        if lo == b'\\' {
            j += 1;
            lo = *pat.get(j).ok_or_else(|| unterminated.clone())?;
        }

        let is_range = pat.get(j + 1) == Some(&b'-') && pat.get(j + 2).is_some_and(|&b| b != b']');
        if is_range {
            j += 2;
            let mut hi = pat[j];
            if hi == b'\\' {
                j += 1;
                hi = *pat.get(j).ok_or_else(|| unterminated.clone())?;
            }
            if let Some(c) = c {
                let c = fold(c);
                hit |= fold(lo) <= c && c <= fold(hi);
            }
        } else if let Some(c) = c {
            hit |= fold(lo) == fold(c);
        }
        j += 1;
    }

    let accepted = c.is_some() && hit != negate;
    Ok((accepted, j + 1))
}

struct Matcher {
    is_dir: bool,
    ignore_case: bool,
}

impl Matcher {
    fn eq(&self, a: u8, b: u8) -> bool {
        if self.ignore_case {
            a.eq_ignore_ascii_case(&b)
        } else {
            a == b
        }
    }

    /// Backtracking match of one alternative against the whole of `buf`.
    fn matches(&self, pat: &[u8], buf: &[u8]) -> bool {
        let mut p = 0;
        let mut b = 0;
        let mut prev = 0u8;

        while p < pat.len() {
            match pat[p] {
                b'[' => {
                    let Some(&c) = buf.get(b) else {
                        return false;
                    };
                    // Alternatives are validated at construction.
                    let Ok((hit, next)) = scan_class(pat, p, Some(c), self.ignore_case) else {
                        return false;
                    };
                    if !hit {
                        return false;
                    }
                    b += 1;
                    p = next;
                    prev = b']';
                    continue;
                }
                b'*' => {
                    let rest = &pat[p + 1..];
                    if let Some(rest) = rest.strip_prefix(b"*") {
                        let anchored = p == 0 || prev == b'/';
                        return self.match_segments(rest, &buf[b..], anchored);
                    }
                    if rest.is_empty() {
                        return true;
                    }
                    return (b..=buf.len()).any(|k| self.matches(rest, &buf[k..]));
                }
                b'?' => {
                    if b >= buf.len() {
                        return false;
                    }
                    b += 1;
                }
                b'/' => {
                    if p + 1 == pat.len() && b == buf.len() {
                        return self.is_dir;
                    }
                    if buf.get(b) != Some(&b'/') {
                        return false;
                    }
                    b += 1;
                }
                lit => {
                    let lit = if lit == b'\\' && p + 1 < pat.len() {
                        p += 1;
                        pat[p]
                    } else {
                        lit
                    };
                    match buf.get(b) {
                        Some(&c) if self.eq(c, lit) => b += 1,
                        _ => return false,
                    }
                }
            }
            prev = pat[p];
            p += 1;
        }

        b == buf.len()
    }

    /// `**`: try `rest` at the start of every segment of `buf`. When the
    /// `**` sits at a segment boundary and `rest` starts with `/`, the empty
    /// segment run is allowed too.
    fn match_segments(&self, rest: &[u8], buf: &[u8], anchored: bool) -> bool {
        if rest.is_empty() {
            return true;
        }
        let collapse = anchored && rest.len() > 1 && rest[0] == b'/';

        let mut k = 0;
        while k < buf.len() {
            if self.matches(rest, &buf[k..]) {
                return true;
            }
            if collapse && self.matches(&rest[1..], &buf[k..]) {
                return true;
            }
            k += 1;
            while k < buf.len() && buf[k] != b'/' {
                k += 1;
            }
        }
        self.matches(rest, &buf[k..])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(name: &str, pat: &str) -> bool {
        Pattern::new(pat, false).unwrap().matches(name, false)
    }

    #[test]
    fn test_truth_table() {
        assert_eq!(match_pattern("foo.txt", "*.txt", false, false), MatchResult::Match);
        assert_eq!(match_pattern("a/b/c", "a/**/c", true, false), MatchResult::Match);
        assert_eq!(match_pattern("abc", "a|b", false, false), MatchResult::NoMatch);
        assert_eq!(match_pattern("a", "a|b", false, false), MatchResult::Match);
        assert_eq!(match_pattern("x", "[a-", false, false), MatchResult::SyntaxError);
        assert_eq!(match_pattern("README", "readme", false, true), MatchResult::Match);
        assert_eq!(match_pattern("README", "readme", false, false), MatchResult::NoMatch);
    }

    #[test]
    fn test_star_and_question() {
        assert!(m("main.rs", "*.rs"));
        assert!(!m("main.py", "*.rs"));
        assert!(m("test_foo", "test*"));
        assert!(!m("foo_test", "test*"));
        assert!(m("anything", "*"));
        assert!(m("", "*"));
        assert!(m("test1.rs", "test?.rs"));
        assert!(!m("test12.rs", "test?.rs"));
        assert!(!m("test.rs", "test?.rs"));
        assert!(m("abcabc", "*bc"));
        assert!(m("a.tar.gz", "*.*.gz"));
    }

    #[test]
    fn test_classes() {
        assert!(m("a.txt", "[abc].txt"));
        assert!(!m("d.txt", "[abc].txt"));
        assert!(m("x.txt", "[a-z].txt"));
        assert!(!m("X.txt", "[a-z].txt"));
        assert!(m("X.txt", "[^a-z].txt"));
        assert!(!m("x.txt", "[^a-z].txt"));
        assert!(m("]", "[\\]]"));
        assert!(m("-", "[a-]"));
        assert!(!m("", "[abc]"));
        assert!(Pattern::new("[a-z].txt", true).unwrap().matches("X.txt", false));
    }

    #[test]
    fn test_escapes() {
        assert!(m("*", "\\*"));
        assert!(!m("a", "\\*"));
        assert!(m("a|b", "a\\|b"));
        assert!(m("?", "\\?"));
    }

    #[test]
    fn test_trailing_slash_requires_directory() {
        let p = Pattern::new("src/", false).unwrap();
        assert!(p.matches("src", true));
        assert!(!p.matches("src", false));
        assert!(p.matches("src/", false));
    }

    #[test]
    fn test_double_star_segments() {
        assert!(m("a/c", "a/**/c"));
        assert!(m("a/b/c", "a/**/c"));
        assert!(m("a/b/d/c", "a/**/c"));
        assert!(!m("a/b/d", "a/**/c"));
        assert!(m("foo", "**/foo"));
        assert!(m("x/y/foo", "**/foo"));
        assert!(m("a/anything/else", "a/**"));
    }

    #[test]
    fn test_alternation() {
        assert!(m("foo.rs", "*.c|*.rs"));
        assert!(m("foo.c", "*.c|*.rs"));
        assert!(!m("foo.h", "*.c|*.rs"));
        assert!(m("b", "a|b|c"));
        assert!(m("|", "[|]"));
    }

    #[test]
    fn test_syntax_errors() {
        assert_eq!(Pattern::new("|a", false).unwrap_err(), PatternError::EmptyAlternative);
        assert_eq!(Pattern::new("a|", false).unwrap_err(), PatternError::EmptyAlternative);
        assert_eq!(Pattern::new("a||b", false).unwrap_err(), PatternError::EmptyAlternative);
        assert_eq!(
            Pattern::new("ok|[abc", false).unwrap_err(),
            PatternError::UnterminatedClass { offset: 3 }
        );
        assert!(Pattern::new("[a\\", false).is_err());
    }

    #[test]
    fn test_pattern_set() {
        let set = PatternSet::new(["*.rs", "Cargo.*"], false).unwrap();
        assert!(set.matches("lib.rs", false));
        assert!(set.matches("Cargo.toml", false));
        assert!(!set.matches("README.md", false));
        assert!(PatternSet::default().is_empty());

        let err = PatternSet::new(["*.rs", "[x"], false).unwrap_err();
        assert!(matches!(err, ScanError::InvalidPattern { ref pattern, .. } if pattern == "[x"));
    }
}
