//! OSC address patterns.
//!
//! A pattern is compiled once, when a method is registered, so syntax errors surface as a
//! [`ConfigError::MalformedPattern`] at registration time and matching itself can't fail.
//!
//! Supported per-segment operators:
//!
//! - `?` matches exactly one character
//! - `*` matches zero or more characters, never crossing a `/`
//! - `[abc]`, `[a-z]`, `[!0-9]` character classes (inclusive, case-sensitive ranges)
//! - `{foo,bar}` alternation between literal strings
//!
//! Everything else matches itself.

use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// Characters that turn a path into a pattern.
const SPECIAL: &[char] = &['?', '*', '[', ']', '{', '}'];

#[derive(Debug, Clone, PartialEq, Eq)]
enum ClassItem {
    Single(char),
    Range(char, char),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Literal(char),
    AnyChar,
    AnySeq,
    Class { negated: bool, items: Vec<ClassItem> },
    Alternation(Vec<Vec<char>>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    source: String,
    segments: Vec<Vec<Token>>,
    literal: bool,
}

impl Pattern {
    pub fn parse(source: &str) -> Result<Pattern, ConfigError> {
        let malformed = |reason: &str| ConfigError::MalformedPattern {
            pattern: source.to_string(),
            reason: reason.to_string(),
        };

        let Some(body) = source.strip_prefix('/') else {
            return Err(malformed("pattern must start with '/'"));
        };

        let segments = body
            .split('/')
            .map(|segment| parse_segment(segment).map_err(|reason| malformed(reason)))
            .collect::<Result<Vec<_>, _>>()?;

        let literal = segments
            .iter()
            .flatten()
            .all(|token| matches!(token, Token::Literal(_)));

        Ok(Pattern {
            source: source.to_string(),
            segments,
            literal,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// True when the pattern contains no operators, i.e. it only ever matches its own text.
    pub fn is_literal(&self) -> bool {
        self.literal
    }

    /// Matches a concrete path segment by segment. Both sides need the same number of
    /// segments since no operator spans a `/`.
    pub fn matches(&self, path: &str) -> bool {
        let Some(body) = path.strip_prefix('/') else {
            return false;
        };
        if self.literal {
            return self.source == path;
        }

        let mut candidate = body.split('/');
        for tokens in &self.segments {
            let Some(segment) = candidate.next() else {
                return false;
            };
            let text: Vec<char> = segment.chars().collect();
            if !match_tokens(tokens, &text) {
                return false;
            }
        }
        candidate.next().is_none()
    }
}

impl FromStr for Pattern {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Pattern::parse(s)
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// `None` is the catch-all registration and matches everything.
pub fn matches(pattern: Option<&Pattern>, path: &str) -> bool {
    pattern.is_none_or(|pattern| pattern.matches(path))
}

/// Whether an incoming address uses wildcard syntax at all.
pub fn has_wildcards(path: &str) -> bool {
    path.contains(SPECIAL)
}

fn parse_segment(segment: &str) -> Result<Vec<Token>, &'static str> {
    let mut tokens = Vec::new();
    let mut chars = segment.chars().peekable();

    while let Some(c) = chars.next() {
        let token = match c {
            '?' => Token::AnyChar,
            '*' => {
                // "**" is the same as "*"
                if tokens.last() == Some(&Token::AnySeq) {
                    continue;
                }
                Token::AnySeq
            }
            '[' => {
                let negated = chars.next_if_eq(&'!').is_some();
                let mut members = Vec::new();
                loop {
                    match chars.next() {
                        None => return Err("unterminated '['"),
                        Some(']') => break,
                        Some(member) => members.push(member),
                    }
                }
                Token::Class {
                    negated,
                    items: parse_class(&members)?,
                }
            }
            '{' => {
                let mut options = vec![Vec::new()];
                loop {
                    match chars.next() {
                        None => return Err("unterminated '{'"),
                        Some('}') => break,
                        Some(',') => options.push(Vec::new()),
                        Some('{') => return Err("nested '{'"),
                        Some(member) => {
                            if let Some(option) = options.last_mut() {
                                option.push(member);
                            }
                        }
                    }
                }
                Token::Alternation(options)
            }
            ']' => return Err("unmatched ']'"),
            '}' => return Err("unmatched '}'"),
            other => Token::Literal(other),
        };
        tokens.push(token);
    }

    Ok(tokens)
}

// A '-' at either end of the class is a literal dash.
fn parse_class(members: &[char]) -> Result<Vec<ClassItem>, &'static str> {
    if members.is_empty() {
        return Err("empty character class");
    }

    let mut items = Vec::new();
    let mut i = 0;
    while i < members.len() {
        let is_range = i + 2 < members.len() && members[i + 1] == '-';
        if is_range {
            let (lo, hi) = (members[i], members[i + 2]);
            if lo > hi {
                return Err("reversed range in character class");
            }
            items.push(ClassItem::Range(lo, hi));
            i += 3;
        } else {
            items.push(ClassItem::Single(members[i]));
            i += 1;
        }
    }
    Ok(items)
}

fn class_contains(negated: bool, items: &[ClassItem], c: char) -> bool {
    let found = items.iter().any(|item| match *item {
        ClassItem::Single(member) => member == c,
        ClassItem::Range(lo, hi) => (lo..=hi).contains(&c),
    });
    found != negated
}

// Runs the segment's tokens over `text` as a set of reachable positions, one token at a
// time. Work is bounded by tokens * text length no matter how many `*` or `{..}` there are.
fn match_tokens(tokens: &[Token], text: &[char]) -> bool {
    let mut reachable = vec![false; text.len() + 1];
    reachable[0] = true;

    for token in tokens {
        let mut next = vec![false; text.len() + 1];
        match token {
            // Everything from the first reachable position onwards
            Token::AnySeq => {
                if let Some(from) = reachable.iter().position(|&hit| hit) {
                    next[from..].fill(true);
                }
            }
            Token::Alternation(options) => {
                for pos in hits(&reachable) {
                    for option in options {
                        if text[pos..].starts_with(option) {
                            next[pos + option.len()] = true;
                        }
                    }
                }
            }
            single => {
                for pos in hits(&reachable) {
                    if text.get(pos).is_some_and(|&c| matches_one(single, c)) {
                        next[pos + 1] = true;
                    }
                }
            }
        }

        if !next.contains(&true) {
            return false;
        }
        reachable = next;
    }

    reachable[text.len()]
}

fn hits(reachable: &[bool]) -> impl Iterator<Item = usize> + '_ {
    reachable
        .iter()
        .enumerate()
        .filter_map(|(pos, &hit)| hit.then_some(pos))
}

fn matches_one(token: &Token, c: char) -> bool {
    match token {
        Token::Literal(expected) => *expected == c,
        Token::AnyChar => true,
        Token::Class { negated, items } => class_contains(*negated, items, c),
        Token::AnySeq | Token::Alternation(_) => false,
    }
}
