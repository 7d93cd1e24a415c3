//! Types produced by the tokenizer and consumed by the detectors and the launcher.

use std::ffi::CString;

use nix::errno::Errno;

/// Shell operator recognised by the line detectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// `|`: the line's stdout feeds the next line's command
    Pipe,
    /// `>`: stdout goes to the named file
    RedirectOut,
}

impl Operator {
    /// The operator's shell syntax.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Pipe => "|",
            Operator::RedirectOut => ">",
        }
    }

    /// True when `token` is exactly this operator.
    pub fn matches(&self, token: &str) -> bool {
        token == self.as_str()
    }
}

/// One parsed command line: the program name followed by its arguments.
///
/// Tokens are never empty. The end of the vector plays the role of the
/// argv NULL sentinel; [`ArgVector::to_exec_args`] adds the real terminator
/// when the vector is handed to `execv`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArgVector {
    tokens: Vec<String>,
}

impl ArgVector {
    /// Build a vector from already-split tokens, dropping empty ones.
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tokens = tokens
            .into_iter()
            .map(Into::into)
            .filter(|t: &String| !t.is_empty())
            .collect();
        Self { tokens }
    }

    /// Number of real tokens.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// The program name, if any.
    pub fn program(&self) -> Option<&str> {
        self.tokens.first().map(String::as_str)
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.tokens.get(index).map(String::as_str)
    }

    pub fn last(&self) -> Option<&str> {
        self.tokens.last().map(String::as_str)
    }

    /// Keep only the first `len` tokens.
    pub fn truncate(&mut self, len: usize) {
        self.tokens.truncate(len);
    }

    /// Copy of this vector without a trailing `|`.
    pub fn without_trailing_pipe(&self) -> Self {
        let mut copy = self.clone();
        if copy.last().is_some_and(|t| Operator::Pipe.matches(t)) {
            copy.tokens.pop();
        }
        copy
    }

    /// C strings for `execv`. Fails with `EINVAL` if a token holds a NUL byte.
    pub fn to_exec_args(&self) -> Result<Vec<CString>, Errno> {
        self.tokens
            .iter()
            .map(|t| CString::new(t.as_str()).map_err(|_| Errno::EINVAL))
            .collect()
    }

    /// Render the vector for log records, quoting tokens that need it.
    pub fn display(&self) -> String {
        shlex::try_join(self.tokens.iter().map(String::as_str))
            .unwrap_or_else(|_| self.tokens.join(" "))
    }
}
