use std::sync::Arc;

use serde::Deserialize;

use crate::model::Testcase;

/// Decides whether an actual output is equivalent to an expected output.
pub trait Comparator: Send + Sync {
    fn equivalent(&self, expected: &str, actual: &str) -> bool;
}

/// Byte-for-byte equality.
#[derive(Debug, Clone, Copy, Default)]
pub struct Exact;

/// Ignores trailing whitespace on every line (`\r` included) and trailing blank lines.
/// Leading and internal whitespace stay significant.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrailingWhitespaceInsensitive;

impl Comparator for Exact {
    fn equivalent(&self, expected: &str, actual: &str) -> bool {
        expected == actual
    }
}

impl Comparator for TrailingWhitespaceInsensitive {
    fn equivalent(&self, expected: &str, actual: &str) -> bool {
        normalized_lines(expected).eq(normalized_lines(actual))
    }
}

fn normalized_lines(s: &str) -> impl Iterator<Item = &str> {
    let lines: Vec<&str> = s.lines().map(str::trim_end).collect();
    let len = lines.iter().rposition(|l| !l.is_empty()).map_or(0, |i| i + 1);
    lines.into_iter().take(len)
}

/// Comparator chosen in the config file (`comparator = "exact"`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, strum::Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum CompareMode {
    #[default]
    TrailingWhitespace,
    Exact,
}

#[derive(Clone)]
pub struct Judge {
    comparator: Arc<dyn Comparator>,
}

impl Default for Judge {
    fn default() -> Self {
        Self::new(TrailingWhitespaceInsensitive)
    }
}

impl Judge {
    pub fn new(comparator: impl Comparator + 'static) -> Self {
        Self {
            comparator: Arc::new(comparator),
        }
    }

    pub fn is_correct(&self, testcase: &Testcase, actual_output: &str) -> bool {
        self.comparator.equivalent(&testcase.output, actual_output)
    }
}

impl From<CompareMode> for Judge {
    fn from(mode: CompareMode) -> Self {
        match mode {
            CompareMode::TrailingWhitespace => Self::new(TrailingWhitespaceInsensitive),
            CompareMode::Exact => Self::new(Exact),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn tc(output: &str) -> Testcase {
        Testcase {
            id: 0,
            input: String::new(),
            output: output.to_owned(),
        }
    }

    #[test]
    fn expected_output_is_always_correct() {
        let judge = Judge::default();
        for out in ["9\n", "1 2 3\n4 5 6\n", "", "YES", "a\n\nb\n"] {
            assert!(judge.is_correct(&tc(out), out), "{:?}", out);
        }
    }

    #[test]
    fn trailing_whitespace_is_insignificant() {
        let judge = Judge::default();
        let t = tc("1 2\n3\n");
        assert!(judge.is_correct(&t, "1 2 \n3"));
        assert!(judge.is_correct(&t, "1 2\r\n3\r\n"));
        assert!(judge.is_correct(&t, "1 2\n3\n\n\n"));
        assert!(judge.is_correct(&t, "1 2\t\n3   \n  \n"));
    }

    #[test]
    fn leading_and_internal_whitespace_is_significant() {
        let judge = Judge::default();
        let t = tc("1 2\n3\n");
        assert!(!judge.is_correct(&t, "1  2\n3\n"));
        assert!(!judge.is_correct(&t, " 1 2\n3\n"));
        assert!(!judge.is_correct(&t, "1 2\n\n3\n"));
        assert!(!judge.is_correct(&t, "\n1 2\n3\n"));
        assert!(!judge.is_correct(&t, "1 2\n"));
        assert!(!judge.is_correct(&t, "1 2\n3\n4\n"));
    }

    #[test]
    fn empty_expected_output() {
        let judge = Judge::default();
        assert!(judge.is_correct(&tc(""), "\n \n"));
        assert!(!judge.is_correct(&tc(""), "0\n"));
    }

    #[test]
    fn exact_comparator() {
        let judge = Judge::from(CompareMode::Exact);
        assert!(judge.is_correct(&tc("9\n"), "9\n"));
        assert!(!judge.is_correct(&tc("9\n"), "9"));
        assert!(!judge.is_correct(&tc("9\n"), "9 \n"));
    }
}
