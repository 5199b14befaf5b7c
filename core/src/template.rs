//! `#{var}` command templates, e.g. `g++ -o #{binPath} #{srcPath}`.
//!
//! `##` is an escaped `#`. A `#` that is not followed by `{` or `#` is kept as is.

use std::{borrow::Borrow, collections::HashMap, ffi::OsStr, fmt, hash::Hash};

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    #[error("Undefined variable '{0}' at {}", .1+1)]
    UndefinedVar(String, usize),

    #[error("Unclosed brace (found open brace at {})", .0+1)]
    UnclosedBrace(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Lit(String),
    /// Variable name and the char position of its `#`.
    Var(String, usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl CommandTemplate {
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut lit = String::new();
        let mut chars = source.chars().enumerate().peekable();

        while let Some((i, c)) = chars.next() {
            if c != '#' {
                lit.push(c);
                continue;
            }
            match chars.peek() {
                Some((_, '#')) => {
                    chars.next();
                    lit.push('#');
                }
                Some((_, '{')) => {
                    chars.next();
                    let mut name = String::new();
                    let closed = loop {
                        match chars.next() {
                            Some((_, '}')) => break true,
                            Some((_, ch)) => name.push(ch),
                            None => break false,
                        }
                    };
                    if !closed {
                        return Err(TemplateError::UnclosedBrace(i + 1));
                    }
                    if !lit.is_empty() {
                        segments.push(Segment::Lit(std::mem::take(&mut lit)));
                    }
                    segments.push(Segment::Var(name, i));
                }
                _ => lit.push('#'),
            }
        }
        if !lit.is_empty() {
            segments.push(Segment::Lit(lit));
        }

        Ok(Self {
            source: source.to_owned(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Var(name, _) => Some(name.as_str()),
            Segment::Lit(_) => None,
        })
    }

    pub fn render<K, V>(&self, vars: &HashMap<K, V>) -> Result<String, TemplateError>
    where
        K: Borrow<str> + Hash + Eq,
        V: AsRef<OsStr>,
    {
        let mut res = String::with_capacity(self.source.len() * 2);
        for seg in &self.segments {
            match seg {
                Segment::Lit(s) => res.push_str(s),
                Segment::Var(name, pos) => {
                    let value = vars
                        .get(name.as_str())
                        .ok_or_else(|| TemplateError::UndefinedVar(name.clone(), pos + 1))?;
                    res.push_str(&value.as_ref().to_string_lossy());
                }
            }
        }
        Ok(res)
    }
}

impl fmt::Display for CommandTemplate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.source)
    }
}
