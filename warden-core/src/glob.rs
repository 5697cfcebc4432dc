//! Path-glob matching for permission rules.
//!
//! This is the matching language used by rule patterns like
//! `Read(file_path:**/*.{ts,js})`:
//!
//! - `**` matches zero or more whole path segments
//! - `*` matches any run of characters within a single segment
//! - `{a,b,...}` matches any one of the listed literal alternatives
//!
//! Everything else matches literally and case-sensitively. Matching is a
//! pure function with no filesystem access; both pattern and path are split
//! on `/` and compared segment by segment.
//!
//! # Example
//!
//! ```rust
//! use warden_core::glob::glob_match;
//!
//! assert!(glob_match("**/.env", "src/config/.env"));
//! assert!(glob_match("**/*.{ts,js}", "src/index.ts"));
//! assert!(!glob_match("**/.env", "readme.env"));
//! ```

/// One parsed element of a single pattern segment.
#[derive(Debug, Clone, PartialEq)]
enum Token {
    Literal(String),
    Star,
    Alt(Vec<String>),
}

/// A parsed pattern segment: either the `**` wildcard or a token sequence.
#[derive(Debug, Clone, PartialEq)]
enum Segment {
    AnyDepth,
    Tokens(Vec<Token>),
}

/// Match `path` against `pattern`.
///
/// Returns `true` when the whole path matches the whole pattern. A pattern
/// without `/` only matches single-segment paths, mirroring shell globs.
pub fn glob_match(pattern: &str, path: &str) -> bool {
    let segments: Vec<Segment> = pattern.split('/').map(parse_segment).collect();
    let parts: Vec<&str> = path.split('/').collect();
    match_segments(&segments, &parts)
}

fn parse_segment(segment: &str) -> Segment {
    if segment == "**" {
        return Segment::AnyDepth;
    }

    let mut tokens = Vec::new();
    let mut literal = String::new();
    let mut chars = segment.char_indices().peekable();

    while let Some((idx, ch)) = chars.next() {
        match ch {
            '*' => {
                if !literal.is_empty() {
                    tokens.push(Token::Literal(std::mem::take(&mut literal)));
                }
                // Collapse consecutive stars within a segment
                if tokens.last() != Some(&Token::Star) {
                    tokens.push(Token::Star);
                }
            }
            '{' => {
                // An unclosed brace is treated as a literal character
                match segment[idx..].find('}') {
                    Some(close) => {
                        if !literal.is_empty() {
                            tokens.push(Token::Literal(std::mem::take(&mut literal)));
                        }
                        let body = &segment[idx + 1..idx + close];
                        tokens.push(Token::Alt(
                            body.split(',').map(|s| s.to_string()).collect(),
                        ));
                        while let Some(&(i, _)) = chars.peek() {
                            if i > idx + close {
                                break;
                            }
                            chars.next();
                        }
                    }
                    None => literal.push(ch),
                }
            }
            _ => literal.push(ch),
        }
    }

    if !literal.is_empty() {
        tokens.push(Token::Literal(literal));
    }

    Segment::Tokens(tokens)
}

fn match_segments(pattern: &[Segment], path: &[&str]) -> bool {
    match pattern.first() {
        None => path.is_empty(),
        Some(Segment::AnyDepth) => {
            // `**` may consume zero or more leading path segments
            (0..=path.len()).any(|skip| match_segments(&pattern[1..], &path[skip..]))
        }
        Some(Segment::Tokens(tokens)) => match path.first() {
            None => false,
            Some(part) => match_tokens(tokens, part) && match_segments(&pattern[1..], &path[1..]),
        },
    }
}

fn match_tokens(tokens: &[Token], text: &str) -> bool {
    match tokens.first() {
        None => text.is_empty(),
        Some(Token::Literal(lit)) => text
            .strip_prefix(lit.as_str())
            .is_some_and(|rest| match_tokens(&tokens[1..], rest)),
        Some(Token::Alt(options)) => options.iter().any(|opt| {
            text.strip_prefix(opt.as_str())
                .is_some_and(|rest| match_tokens(&tokens[1..], rest))
        }),
        Some(Token::Star) => {
            // Try every split point, including consuming the whole remainder
            text.char_indices()
                .map(|(i, _)| i)
                .chain([text.len()])
                .any(|i| match_tokens(&tokens[1..], &text[i..]))
        }
    }
}
