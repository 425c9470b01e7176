use crate::voter::Voter;
use crate::weight::Weight;

use std::fmt;
use std::sync::Arc;

/// The answer of a two-choice vote.
///
/// `Invalid` carries the raw out-of-range code it was created from; invalid
/// votes never count towards No, Aye or Abstain, the tally reports them
/// separately.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum BasicChoice {
    No,
    Aye,
    Abstain,
    Invalid(i8),
}

impl BasicChoice {
    pub fn is_valid(&self) -> bool {
        !matches!(self, BasicChoice::Invalid(_))
    }
}

impl fmt::Display for BasicChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BasicChoice::No => write!(f, "no"),
            BasicChoice::Aye => write!(f, "aye"),
            BasicChoice::Abstain => write!(f, "abstention"),
            BasicChoice::Invalid(code) => write!(f, "unknown poll answer {}", code),
        }
    }
}

/// A vote for a [`BasicPoll`].
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct BasicVote {
    pub voter: Arc<Voter>,
    pub choice: BasicChoice,
}

impl BasicVote {
    pub fn new(voter: Arc<Voter>, choice: BasicChoice) -> BasicVote {
        BasicVote { voter, choice }
    }
}

/// A two-choice poll (Aye / No / Abstain).
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct BasicPoll {
    pub votes: Vec<BasicVote>,
}

/// One bucket of counters per answer, used twice in the result: once
/// counting votes and once summing weights.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
pub struct BasicCounter {
    pub noes: Weight,
    pub ayes: Weight,
    pub abstentions: Weight,
    pub invalid: Weight,
}

impl BasicCounter {
    fn increase(&mut self, choice: BasicChoice, inc: Weight) {
        match choice {
            BasicChoice::No => self.noes += inc,
            BasicChoice::Aye => self.ayes += inc,
            BasicChoice::Abstain => self.abstentions += inc,
            BasicChoice::Invalid(_) => self.invalid += inc,
        }
    }
}

/// The result of tallying a [`BasicPoll`].
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct BasicResult {
    /// Every vote counts one.
    pub by_count: BasicCounter,
    /// Every vote counts the weight of its voter.
    pub by_weight: BasicCounter,
}

impl BasicPoll {
    pub fn new(votes: Vec<BasicVote>) -> BasicPoll {
        BasicPoll { votes }
    }

    pub fn add_vote(&mut self, vote: BasicVote) {
        self.votes.push(vote);
    }

    /// Counts all votes, once plain and once weighted. Invalid votes go to
    /// their own bucket and never contribute to the three answers.
    pub fn tally(&self) -> BasicResult {
        let mut res = BasicResult::default();
        for vote in &self.votes {
            res.by_count.increase(vote.choice, 1);
            res.by_weight.increase(vote.choice, vote.voter.weight);
        }
        res
    }

    /// Removes all invalid votes from the poll and returns them in input
    /// order.
    pub fn truncate(&mut self) -> Vec<BasicVote> {
        // most polls have no culprits, then the vote list stays untouched
        let culprits: Vec<BasicVote> = self
            .votes
            .iter()
            .filter(|vote| !vote.choice.is_valid())
            .cloned()
            .collect();
        if !culprits.is_empty() {
            self.votes.retain(|vote| vote.choice.is_valid());
        }
        culprits
    }
}
