// Parsing of the voter roster format: one voter per line, like
//
//   * ada: 4
//   * grace
//
// The weight after the colon is optional and defaults to 1. Empty lines
// and lines starting with # are ignored.

use regex::Regex;

use weighted_voting::{parse_weight, PollError, PollResult, Voter, Weight};

use std::sync::Arc;

fn is_ignored_line(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty() || trimmed.starts_with('#')
}

/// Parses voters from the roster format.
///
/// The optional limits reject oversized input early with a validation
/// error before anything else looks at it; they all default to off.
#[derive(Debug, Clone)]
pub struct VotersParser {
    pub max_num_lines: Option<usize>,
    pub max_num_voters: Option<usize>,
    pub max_line_length: Option<usize>,
    pub max_name_length: Option<usize>,
    pub max_weight: Option<Weight>,
    line_rx: Regex,
}

impl VotersParser {
    pub fn new() -> VotersParser {
        VotersParser {
            max_num_lines: None,
            max_num_voters: None,
            max_line_length: None,
            max_name_length: None,
            max_weight: None,
            line_rx: Regex::new(r"^\s*[*]\s+(.+?)\s*(?::\s+(\d+)\s*)?$")
                .expect("voter line pattern is valid"),
        }
    }

    /// Parses a single voter line of the form `* <name>[: <weight>]`.
    pub fn parse_voters_line(&self, line: &str) -> PollResult<Arc<Voter>> {
        if let Some(max_len) = self.max_line_length {
            if line.len() > max_len {
                return Err(PollError::validation(format!(
                    "line is too long: got length {}, allowed max length is {}",
                    line.len(),
                    max_len
                )));
            }
        }
        let caps = self.line_rx.captures(line).ok_or_else(|| {
            PollError::syntax("voter line must be of the form \"* voter: weight\"")
        })?;
        let name = caps
            .get(1)
            .map(|m| m.as_str().trim())
            .unwrap_or_default()
            .to_string();
        let weight = match caps.get(2) {
            Some(m) => parse_weight(m.as_str().trim())?,
            None => 1,
        };

        if let Some(max_name) = self.max_name_length {
            let name_length = name.chars().count();
            if name_length > max_name {
                return Err(PollError::validation(format!(
                    "voter name is too long: got length {}, allowed max length is {}",
                    name_length, max_name
                )));
            }
        }
        if let Some(max_weight) = self.max_weight {
            if weight > max_weight {
                return Err(PollError::validation(format!(
                    "voter weight is too big: got {}, allowed max weight is {}",
                    weight, max_weight
                )));
            }
        }

        Ok(Voter::new(name, weight))
    }

    /// Parses a whole roster; syntax errors carry the line number.
    pub fn parse_voters(&self, s: &str) -> PollResult<Vec<Arc<Voter>>> {
        let mut res = Vec::new();
        for (idx, line) in s.lines().enumerate() {
            let line_num = idx + 1;
            if let Some(max_lines) = self.max_num_lines {
                if line_num > max_lines {
                    return Err(PollError::validation(format!(
                        "there are too many lines: only {} lines are allowed in a voters file",
                        max_lines
                    )));
                }
            }
            if is_ignored_line(line) {
                continue;
            }
            let voter = self
                .parse_voters_line(line)
                .map_err(|err| err.with_line(line_num))?;
            res.push(voter);
            if let Some(max_voters) = self.max_num_voters {
                if res.len() > max_voters {
                    return Err(PollError::validation(format!(
                        "there are too many voters: only {} voters are allowed",
                        max_voters
                    )));
                }
            }
        }
        Ok(res)
    }
}

impl Default for VotersParser {
    fn default() -> Self {
        VotersParser::new()
    }
}
