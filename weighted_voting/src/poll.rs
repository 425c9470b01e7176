use crate::basic::{BasicChoice, BasicPoll, BasicVote};
use crate::error::{PollError, PollKind, PollResult};
use crate::median::{MedianPoll, MedianUnit, MedianVote};
use crate::schulze::{SchulzePoll, SchulzeVote};
use crate::skeleton::{Skeleton, SkeletonCollection};
use crate::voter::Voter;

use std::collections::BTreeMap;
use std::sync::Arc;

/// A vote of any kind. Each poll kind has a matching vote kind; adding a
/// vote of the wrong kind to a poll is a kind error.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum Vote {
    Basic(BasicVote),
    Median(MedianVote),
    Schulze(SchulzeVote),
}

impl Vote {
    pub fn voter(&self) -> &Arc<Voter> {
        match self {
            Vote::Basic(vote) => &vote.voter,
            Vote::Median(vote) => &vote.voter,
            Vote::Schulze(vote) => &vote.voter,
        }
    }

    pub fn kind(&self) -> PollKind {
        match self {
            Vote::Basic(_) => PollKind::Basic,
            Vote::Median(_) => PollKind::Median,
            Vote::Schulze(_) => PollKind::Schulze,
        }
    }
}

/// A poll of any kind.
///
/// Operations that only make sense for one kind live on the wrapped
/// structs ([`BasicPoll`], [`MedianPoll`], [`SchulzePoll`]); everything a
/// caller needs without knowing the kind is dispatched here.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum Poll {
    Basic(BasicPoll),
    Median(MedianPoll),
    Schulze(SchulzePoll),
}

/// Mapping from poll name to the poll with that name. Ordered, which makes
/// everything that iterates over polls deterministic.
pub type PollMap = BTreeMap<String, Poll>;

/// The votes a truncation pass removed or rewrote, per poll kind.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum TruncateReport {
    Basic(Vec<BasicVote>),
    Median(Vec<MedianVote>),
    Schulze(Vec<SchulzeVote>),
}

impl TruncateReport {
    pub fn len(&self) -> usize {
        match self {
            TruncateReport::Basic(v) => v.len(),
            TruncateReport::Median(v) => v.len(),
            TruncateReport::Schulze(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Poll {
    pub fn kind(&self) -> PollKind {
        match self {
            Poll::Basic(_) => PollKind::Basic,
            Poll::Median(_) => PollKind::Median,
            Poll::Schulze(_) => PollKind::Schulze,
        }
    }

    /// Appends a vote to the poll.
    ///
    /// The vote is not validated beyond its kind: a median vote above the
    /// ceiling or a Schulze ranking of the wrong length is accepted here
    /// and handled by [`truncate`](Poll::truncate) / the tally.
    pub fn add_vote(&mut self, vote: Vote) -> PollResult<()> {
        match (self, vote) {
            (Poll::Basic(poll), Vote::Basic(vote)) => {
                poll.add_vote(vote);
                Ok(())
            }
            (Poll::Median(poll), Vote::Median(vote)) => {
                poll.add_vote(vote);
                Ok(())
            }
            (Poll::Schulze(poll), Vote::Schulze(vote)) => {
                poll.add_vote(vote);
                Ok(())
            }
            (poll, vote) => Err(PollError::kind_mismatch(format!(
                "can't add a {} vote to a {}",
                vote.kind(),
                poll.kind()
            ))),
        }
    }

    /// Removes or rewrites structurally invalid votes and returns them for
    /// auditing. See the per-kind `truncate` methods for what "invalid"
    /// means for each kind.
    pub fn truncate(&mut self) -> TruncateReport {
        match self {
            Poll::Basic(poll) => TruncateReport::Basic(poll.truncate()),
            Poll::Median(poll) => TruncateReport::Median(poll.truncate()),
            Poll::Schulze(poll) => TruncateReport::Schulze(poll.truncate()),
        }
    }

    /// Produces a vote of this poll's kind for a plain Aye/No/Abstain
    /// answer.
    ///
    /// For a Schulze poll with `n` options Aye ranks the last option below
    /// all others, No ranks it above all others and Abstain ties
    /// everything. Median polls translate Aye to the ceiling and No to
    /// zero; they have no notion of abstention, which is a kind error, as
    /// is an invalid answer.
    pub fn generate_from_basic_answer(
        &self,
        voter: &Arc<Voter>,
        answer: BasicChoice,
    ) -> PollResult<Vote> {
        match self {
            Poll::Basic(_) => match answer {
                BasicChoice::Invalid(code) => Err(PollError::kind_mismatch(format!(
                    "invalid poll answer {}",
                    code
                ))),
                choice => Ok(Vote::Basic(BasicVote::new(Arc::clone(voter), choice))),
            },
            Poll::Median(poll) => match answer {
                BasicChoice::No => Ok(Vote::Median(MedianVote::new(Arc::clone(voter), 0))),
                BasicChoice::Aye => {
                    Ok(Vote::Median(MedianVote::new(Arc::clone(voter), poll.value)))
                }
                BasicChoice::Abstain => Err(PollError::kind_mismatch(
                    "abstention is not supported for median polls",
                )),
                BasicChoice::Invalid(code) => Err(PollError::kind_mismatch(format!(
                    "invalid poll answer {}",
                    code
                ))),
            },
            Poll::Schulze(poll) => {
                let n = poll.num_options;
                let ranking = match answer {
                    BasicChoice::Aye => {
                        let mut ranking = vec![0; n];
                        if n > 0 {
                            ranking[n - 1] = 1;
                        }
                        ranking
                    }
                    BasicChoice::No => {
                        let mut ranking = vec![1; n];
                        if n > 0 {
                            ranking[n - 1] = 0;
                        }
                        ranking
                    }
                    BasicChoice::Abstain => vec![0; n],
                    BasicChoice::Invalid(code) => {
                        return Err(PollError::kind_mismatch(format!(
                            "invalid poll answer {}",
                            code
                        )))
                    }
                };
                Ok(Vote::Schulze(SchulzeVote::new(Arc::clone(voter), ranking)))
            }
        }
    }
}

/// What to do when a voter simply did not fill in a ballot cell for a poll.
///
/// Most of the time an empty cell means the voter was absent and the vote
/// is skipped (`Ignore`). Polls where everyone must vote use `Error`. For
/// polls with absolute majorities even the absent voters should count,
/// then an empty cell is turned into a generated Aye, No or Abstain vote.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum EmptyVotePolicy {
    Ignore,
    Error,
    AddAsAye,
    AddAsNo,
    AddAsAbstain,
}

impl EmptyVotePolicy {
    /// Applies the policy for one empty cell. Returns `Ok(None)` when the
    /// cell is to be skipped, a generated vote for the `AddAs*` policies
    /// and an [`PollError::EmptyVote`] error for `Error`.
    pub fn generate_empty_vote(
        &self,
        voter: &Arc<Voter>,
        poll: &Poll,
    ) -> PollResult<Option<Vote>> {
        let answer = match self {
            EmptyVotePolicy::Ignore => return Ok(None),
            EmptyVotePolicy::Error => {
                return Err(PollError::EmptyVote {
                    voter: voter.name.clone(),
                    kind: poll.kind(),
                })
            }
            EmptyVotePolicy::AddAsAye => BasicChoice::Aye,
            EmptyVotePolicy::AddAsNo => BasicChoice::No,
            EmptyVotePolicy::AddAsAbstain => BasicChoice::Abstain,
        };
        poll.generate_from_basic_answer(voter, answer).map(Some)
    }
}

/// Converts skeletons into empty polls.
///
/// - A money skeleton becomes a median poll over its cent value; negative
///   values are rejected.
/// - A choice skeleton with exactly two options becomes a two-choice poll
///   if `flatten_binary` is set (the first option is read as Aye, the
///   second as No, independent of their actual text), otherwise a Schulze
///   poll.
/// - A choice skeleton with more than two options always becomes a Schulze
///   poll; fewer than two options are rejected.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct SkeletonConverter {
    pub flatten_binary: bool,
}

impl Default for SkeletonConverter {
    fn default() -> Self {
        SkeletonConverter {
            flatten_binary: true,
        }
    }
}

impl SkeletonConverter {
    pub fn new(flatten_binary: bool) -> SkeletonConverter {
        SkeletonConverter { flatten_binary }
    }

    pub fn convert(&self, skeleton: &Skeleton) -> PollResult<Poll> {
        match skeleton {
            Skeleton::Money { name, value } => {
                if value.value_cents < 0 {
                    return Err(PollError::kind_mismatch(format!(
                        "value for median poll is not allowed to be < 0, got {} for poll \"{}\"",
                        value.value_cents, name
                    )));
                }
                Ok(Poll::Median(MedianPoll::new(
                    value.value_cents as MedianUnit,
                    Vec::new(),
                )))
            }
            Skeleton::Choice { name, options } => match options.len() {
                0 | 1 => Err(PollError::kind_mismatch(format!(
                    "got only {} options, but at least two options are required, poll is \"{}\"",
                    options.len(),
                    name
                ))),
                2 if self.flatten_binary => Ok(Poll::Basic(BasicPoll::default())),
                n => Ok(Poll::Schulze(SchulzePoll::new(n, Vec::new()))),
            },
        }
    }
}

/// Converts every skeleton of a collection into an empty poll, stopping at
/// the first failure. Duplicate skeleton names are rejected since the poll
/// map requires unique names.
pub fn convert_collection(
    collection: &SkeletonCollection,
    converter: &SkeletonConverter,
) -> PollResult<PollMap> {
    let mut res = PollMap::new();
    for skeleton in collection.collect_skeletons() {
        let poll = converter.convert(skeleton)?;
        if res.insert(skeleton.name().to_string(), poll).is_some() {
            return Err(PollError::duplicate("poll", skeleton.name()));
        }
    }
    Ok(res)
}
