use crate::basic::{BasicChoice, BasicVote};
use crate::currency::{CurrencyHandler, RawCentHandler, SimpleEuroHandler};
use crate::error::{PollError, PollResult};
use crate::median::{MedianUnit, MedianVote, NO_MEDIAN_UNIT};
use crate::poll::{Poll, Vote};
use crate::schulze::{SchulzeRanking, SchulzeVote};
use crate::voter::Voter;

use std::sync::Arc;

/// Parses votes for two-choice polls.
///
/// A string is accepted, case-insensitively, if it appears in one of the
/// three answer sets; the defaults contain English and German words plus
/// single-letter shorthands. With the ranking style enabled a two-element
/// Schulze-style ranking like `"1,2"` is accepted as well: first element
/// smaller means Aye, larger means No, equal means Abstain.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct BasicVoteParser {
    ayes: Vec<String>,
    noes: Vec<String>,
    abstentions: Vec<String>,
    ranking_style: bool,
}

impl Default for BasicVoteParser {
    fn default() -> Self {
        let to_owned = |words: &[&str]| words.iter().map(|s| s.to_string()).collect();
        BasicVoteParser {
            ayes: to_owned(&["aye", "yes", "ja", "y", "j"]),
            noes: to_owned(&["no", "nein", "n"]),
            abstentions: to_owned(&["abstention", "abstain", "enthaltung", "a"]),
            ranking_style: false,
        }
    }
}

impl BasicVoteParser {
    pub fn new() -> BasicVoteParser {
        BasicVoteParser::default()
    }

    /// Replaces the three answer sets. The words are matched lowercase.
    pub fn with_answers(
        ayes: Vec<String>,
        noes: Vec<String>,
        abstentions: Vec<String>,
    ) -> BasicVoteParser {
        BasicVoteParser {
            ayes,
            noes,
            abstentions,
            ranking_style: false,
        }
    }

    /// Enables or disables the two-element ranking style.
    pub fn with_ranking_style(mut self, enabled: bool) -> BasicVoteParser {
        self.ranking_style = enabled;
        self
    }

    fn invalid_input_error(&self, s: &str) -> PollError {
        if self.ranking_style {
            PollError::syntax(format!(
                "invalid vote \"{}\": allowed are {:?} (aye), {:?} (no), {:?} (abstention) or a ranking like \"1,2\"",
                s, self.ayes, self.noes, self.abstentions
            ))
        } else {
            PollError::syntax(format!(
                "invalid vote \"{}\": allowed are {:?} (aye) or {:?} (no)",
                s, self.ayes, self.noes
            ))
        }
    }

    pub fn parse(&self, s: &str, voter: &Arc<Voter>) -> PollResult<Vote> {
        let lower = s.trim().to_lowercase();
        let choice = if self.ayes.contains(&lower) {
            Some(BasicChoice::Aye)
        } else if self.noes.contains(&lower) {
            Some(BasicChoice::No)
        } else if self.abstentions.contains(&lower) {
            Some(BasicChoice::Abstain)
        } else {
            None
        };
        if let Some(choice) = choice {
            return Ok(Vote::Basic(BasicVote::new(Arc::clone(voter), choice)));
        }
        if self.ranking_style {
            if let Ok(ranking) = parse_ranking_string(&lower) {
                if ranking.len() == 2 {
                    let choice = match ranking[0].cmp(&ranking[1]) {
                        std::cmp::Ordering::Less => BasicChoice::Aye,
                        std::cmp::Ordering::Greater => BasicChoice::No,
                        std::cmp::Ordering::Equal => BasicChoice::Abstain,
                    };
                    return Ok(Vote::Basic(BasicVote::new(Arc::clone(voter), choice)));
                }
            }
        }
        Err(self.invalid_input_error(s))
    }

    pub fn customize_for(&self, poll: &Poll) -> PollResult<BasicVoteParser> {
        match poll {
            Poll::Basic(_) => Ok(self.clone()),
            other => Err(PollError::kind_mismatch(format!(
                "can't customize a basic vote parser for a {}",
                other.kind()
            ))),
        }
    }
}

/// Parses votes for median polls.
///
/// The string is handed to the currency collaborator; the parsed value
/// must not be negative, and not above the maximum if one is set (a parser
/// customized for a poll uses the poll ceiling as maximum).
#[derive(Clone)]
pub struct MedianVoteParser {
    currency: Arc<dyn CurrencyHandler>,
    max_value: MedianUnit,
}

impl MedianVoteParser {
    /// A parser without a maximum; customize it for a poll to get the
    /// ceiling check.
    pub fn new(currency: Arc<dyn CurrencyHandler>) -> MedianVoteParser {
        MedianVoteParser {
            currency,
            max_value: NO_MEDIAN_UNIT,
        }
    }

    /// A parser reading plain cent integers instead of currency strings.
    pub fn raw_cents() -> MedianVoteParser {
        MedianVoteParser::new(Arc::new(RawCentHandler))
    }

    pub fn with_max_value(&self, max_value: MedianUnit) -> MedianVoteParser {
        MedianVoteParser {
            currency: Arc::clone(&self.currency),
            max_value,
        }
    }

    pub fn parse(&self, s: &str, voter: &Arc<Voter>) -> PollResult<Vote> {
        let currency = self.currency.parse(s)?;
        if currency.value_cents < 0 {
            return Err(PollError::semantic(format!(
                "string \"{}\" describes a negative value, can't be used in a median vote",
                s
            )));
        }
        let value = currency.value_cents as MedianUnit;
        if self.max_value != NO_MEDIAN_UNIT && value > self.max_value {
            return Err(PollError::semantic(format!(
                "value for median vote ({}) is greater than the allowed maximum ({})",
                value, self.max_value
            )));
        }
        Ok(Vote::Median(MedianVote::new(Arc::clone(voter), value)))
    }

    pub fn customize_for(&self, poll: &Poll) -> PollResult<MedianVoteParser> {
        match poll {
            Poll::Median(poll) => Ok(self.with_max_value(poll.value)),
            other => Err(PollError::kind_mismatch(format!(
                "can't customize a median vote parser for a {}",
                other.kind()
            ))),
        }
    }
}

impl std::fmt::Debug for MedianVoteParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MedianVoteParser")
            .field("max_value", &self.max_value)
            .finish()
    }
}

fn parse_ranking_string(s: &str) -> PollResult<SchulzeRanking> {
    s.split(['/', ','])
        .map(|part| {
            let part = part.trim();
            part.parse::<i64>().map_err(|_| {
                PollError::syntax(format!("ranking component \"{}\" is not an integer", part))
            })
        })
        .collect()
}

/// Parses votes for Schulze polls.
///
/// The string is split on commas or slashes, every component is parsed as
/// an integer. If an expected length is set (a parser customized for a
/// poll expects exactly the poll's option count) a ranking of any other
/// length is rejected.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
pub struct SchulzeVoteParser {
    pub expected_length: Option<usize>,
}

impl SchulzeVoteParser {
    pub fn new() -> SchulzeVoteParser {
        SchulzeVoteParser::default()
    }

    pub fn with_length(&self, length: usize) -> SchulzeVoteParser {
        SchulzeVoteParser {
            expected_length: Some(length),
        }
    }

    pub fn parse(&self, s: &str, voter: &Arc<Voter>) -> PollResult<Vote> {
        let ranking = parse_ranking_string(s)?;
        if let Some(expected) = self.expected_length {
            if ranking.len() != expected {
                return Err(PollError::semantic(format!(
                    "expected a ranking with {} entries, got {}",
                    expected,
                    ranking.len()
                )));
            }
        }
        Ok(Vote::Schulze(SchulzeVote::new(Arc::clone(voter), ranking)))
    }

    pub fn customize_for(&self, poll: &Poll) -> PollResult<SchulzeVoteParser> {
        match poll {
            Poll::Schulze(poll) => Ok(self.with_length(poll.num_options)),
            other => Err(PollError::kind_mismatch(format!(
                "can't customize a schulze vote parser for a {}",
                other.kind()
            ))),
        }
    }
}

/// A vote parser of any kind.
#[derive(Debug, Clone)]
pub enum VoteParser {
    Basic(BasicVoteParser),
    Median(MedianVoteParser),
    Schulze(SchulzeVoteParser),
}

impl VoteParser {
    pub fn parse(&self, s: &str, voter: &Arc<Voter>) -> PollResult<Vote> {
        match self {
            VoteParser::Basic(parser) => parser.parse(s, voter),
            VoteParser::Median(parser) => parser.parse(s, voter),
            VoteParser::Schulze(parser) => parser.parse(s, voter),
        }
    }

    /// Returns a parser with the poll-specific bounds (median ceiling,
    /// ranking length) picked up from the poll. Fails with a kind error if
    /// the parser kind does not match the poll kind.
    pub fn customize_for(&self, poll: &Poll) -> PollResult<VoteParser> {
        match self {
            VoteParser::Basic(parser) => parser.customize_for(poll).map(VoteParser::Basic),
            VoteParser::Median(parser) => parser.customize_for(poll).map(VoteParser::Median),
            VoteParser::Schulze(parser) => parser.customize_for(poll).map(VoteParser::Schulze),
        }
    }
}

/// One parser template per poll kind; produces a ready, customized parser
/// for any poll in one call.
///
/// The factory is plain configuration: construct it once (or take
/// [`ParserFactory::default`], which parses Euro-style currency values and
/// leaves the basic answer sets at their defaults) and hand it to the
/// ingestion.
#[derive(Debug, Clone)]
pub struct ParserFactory {
    pub basic: BasicVoteParser,
    pub median: MedianVoteParser,
    pub schulze: SchulzeVoteParser,
}

impl Default for ParserFactory {
    fn default() -> Self {
        ParserFactory {
            basic: BasicVoteParser::default(),
            median: MedianVoteParser::new(Arc::new(SimpleEuroHandler::new())),
            schulze: SchulzeVoteParser::new(),
        }
    }
}

impl ParserFactory {
    pub fn new(
        basic: BasicVoteParser,
        median: MedianVoteParser,
        schulze: SchulzeVoteParser,
    ) -> ParserFactory {
        ParserFactory {
            basic,
            median,
            schulze,
        }
    }

    /// The customized parser for this poll.
    pub fn for_poll(&self, poll: &Poll) -> VoteParser {
        match poll {
            Poll::Basic(_) => VoteParser::Basic(self.basic.clone()),
            Poll::Median(poll) => VoteParser::Median(self.median.with_max_value(poll.value)),
            Poll::Schulze(poll) => {
                VoteParser::Schulze(self.schulze.with_length(poll.num_options))
            }
        }
    }
}
