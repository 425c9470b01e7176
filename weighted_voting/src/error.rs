use snafu::Snafu;

use std::fmt;

/// The kind of a poll (or of a vote / parser belonging to that poll).
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum PollKind {
    Basic,
    Median,
    Schulze,
}

impl fmt::Display for PollKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PollKind::Basic => "basic-poll",
            PollKind::Median => "median-poll",
            PollKind::Schulze => "schulze-poll",
        };
        write!(f, "{}", s)
    }
}

fn fmt_line(line: &Option<usize>) -> String {
    match line {
        Some(n) => format!(" in line {}", n),
        None => String::new(),
    }
}

/// All errors produced by the poll core.
///
/// Everything that goes wrong inside the tally engine, the converters, the
/// vote parsers or the ballot-matrix ingestion is one of these variants.
/// Errors from reading or writing an underlying source (files, CSV framing)
/// are *not* of this type, so callers can always tell a poll error apart
/// from an I/O error by checking for `PollError`.
#[derive(Eq, PartialEq, Debug, Clone, Snafu)]
#[snafu(visibility(pub))]
pub enum PollError {
    /// Input was malformed on a lexical level, e.g. a ranking component is
    /// not an integer or a weight is not a number.
    #[snafu(display("syntax error{}: {}", fmt_line(line), msg))]
    Syntax { msg: String, line: Option<usize> },

    /// Input was well-formed but violates the model, e.g. a negative median
    /// value or a grid that does not match the declared voters/polls.
    #[snafu(display("semantic error: {}", msg))]
    Semantic { msg: String },

    /// A skeleton, poll or vote has a kind that is incompatible with the
    /// requested operation.
    #[snafu(display("poll kind error: {}", msg))]
    KindMismatch { msg: String },

    /// An empty ballot cell was found for a poll whose empty-vote policy is
    /// [`EmptyVotePolicy::Error`](crate::EmptyVotePolicy).
    ///
    /// This belongs to the kind-error family (see
    /// [`is_kind_error`](PollError::is_kind_error)) but stays its own
    /// variant so callers can react to it specifically.
    #[snafu(display("empty votes are not allowed: voter \"{}\", poll kind \"{}\"", voter, kind))]
    EmptyVote { voter: String, kind: PollKind },

    /// A voter, poll or skeleton name appeared twice where it must be
    /// unique.
    #[snafu(display("duplicate {} name \"{}\"", what, name))]
    DuplicateName { what: &'static str, name: String },

    /// Input exceeded a configured limit (line length, counts, ...).
    /// Only the file-format parsers raise this.
    #[snafu(display("validation of parser input failed: {}", msg))]
    Validation { msg: String },
}

impl PollError {
    pub fn syntax(msg: impl Into<String>) -> Self {
        PollError::Syntax {
            msg: msg.into(),
            line: None,
        }
    }

    pub fn semantic(msg: impl Into<String>) -> Self {
        PollError::Semantic { msg: msg.into() }
    }

    pub fn kind_mismatch(msg: impl Into<String>) -> Self {
        PollError::KindMismatch { msg: msg.into() }
    }

    pub fn duplicate(what: &'static str, name: impl Into<String>) -> Self {
        PollError::DuplicateName {
            what,
            name: name.into(),
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        PollError::Validation { msg: msg.into() }
    }

    /// Attaches a line number to a syntax error, other variants are
    /// returned unchanged.
    pub fn with_line(self, line_num: usize) -> Self {
        match self {
            PollError::Syntax { msg, .. } => PollError::Syntax {
                msg,
                line: Some(line_num),
            },
            other => other,
        }
    }

    /// The line number of a syntax error, if one was attached.
    pub fn line(&self) -> Option<usize> {
        match self {
            PollError::Syntax { line, .. } => *line,
            _ => None,
        }
    }

    /// True for the kind-error family: [`KindMismatch`](PollError::KindMismatch)
    /// and [`EmptyVote`](PollError::EmptyVote).
    pub fn is_kind_error(&self) -> bool {
        matches!(
            self,
            PollError::KindMismatch { .. } | PollError::EmptyVote { .. }
        )
    }
}

pub type PollResult<T> = Result<T, PollError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn syntax_error_formats_line_number() {
        let err = PollError::syntax("unexpected token").with_line(3);
        assert_eq!(err.to_string(), "syntax error in line 3: unexpected token");
        assert_eq!(err.line(), Some(3));

        let bare = PollError::syntax("unexpected token");
        assert_eq!(bare.to_string(), "syntax error: unexpected token");
        assert_eq!(bare.line(), None);
    }

    #[test]
    fn kind_error_family() {
        assert!(PollError::kind_mismatch("nope").is_kind_error());
        let empty = PollError::EmptyVote {
            voter: "ada".to_string(),
            kind: PollKind::Median,
        };
        assert!(empty.is_kind_error());
        assert!(!PollError::semantic("nope").is_kind_error());
        assert!(!PollError::duplicate("voter", "ada").is_kind_error());
    }
}
