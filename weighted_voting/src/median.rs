use crate::error::{PollError, PollResult};
use crate::voter::Voter;
use crate::weight::{compute_majority, Weight, FIFTY_PERCENT_MAJORITY};

use std::collections::BTreeMap;
use std::sync::Arc;

/// The unit median polls are about (a money value in cents, or any other
/// non-negative amount).
pub type MedianUnit = u64;

/// Sentinel signalling "no value", for example the majority value of a poll
/// where no value reached a majority.
pub const NO_MEDIAN_UNIT: MedianUnit = MedianUnit::MAX;

/// Parses a [`MedianUnit`] from a string of decimal digits.
///
/// Rejects everything `u64` parsing rejects plus the [`NO_MEDIAN_UNIT`]
/// sentinel.
pub fn parse_median_unit(s: &str) -> PollResult<MedianUnit> {
    let res: MedianUnit = s
        .parse()
        .map_err(|_| PollError::syntax(format!("not a valid median value: \"{}\"", s)))?;
    if res == NO_MEDIAN_UNIT {
        return Err(PollError::syntax(format!(
            "integer value {} is too big for a median value",
            NO_MEDIAN_UNIT
        )));
    }
    Ok(res)
}

/// A vote for a [`MedianPoll`]: the voter (weight counts) and the value the
/// voter is willing to agree to.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct MedianVote {
    pub voter: Arc<Voter>,
    pub value: MedianUnit,
}

impl MedianVote {
    pub fn new(voter: Arc<Voter>, value: MedianUnit) -> MedianVote {
        MedianVote { voter, value }
    }
}

/// A poll evaluated with the weighted-median procedure.
///
/// The winning value is the highest value that accumulates strictly more
/// weight than the required majority, walking the votes from the highest
/// value down. Everyone who voted for some value is assumed to also agree
/// to every smaller value.
///
/// `value` is the ceiling the poll is about. A vote above the ceiling could
/// still win the walk, which rarely makes sense, so [`truncate`]
/// rewrites such votes to the ceiling first.
///
/// `sorted` memoizes whether `votes` is already ordered by value,
/// descending. [`tally`] sorts on demand and records that fact; the
/// flag can be set by a caller whose votes arrive pre-sorted (for example
/// from a database query).
///
/// [`truncate`]: MedianPoll::truncate
/// [`tally`]: MedianPoll::tally
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct MedianPoll {
    pub value: MedianUnit,
    pub votes: Vec<MedianVote>,
    pub sorted: bool,
}

/// The result of tallying a [`MedianPoll`].
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct MedianResult {
    /// Sum of all voter weights in the poll.
    pub weight_sum: Weight,
    /// The majority the winning value had to beat (strictly).
    pub required_majority: Weight,
    /// The highest value with the required majority, or [`NO_MEDIAN_UNIT`]
    /// if no value reached it.
    pub majority_value: MedianUnit,
    /// Every value that occurs in a vote, mapped to the voters that voted
    /// for it (in sorted walk order).
    pub value_details: BTreeMap<MedianUnit, Vec<Arc<Voter>>>,
}

impl MedianResult {
    /// All voters that voted for a value of at least `reference`.
    ///
    /// Runs in the number of voters.
    pub fn voters_for(&self, reference: MedianUnit) -> Vec<Arc<Voter>> {
        self.value_details
            .range(reference..)
            .flat_map(|(_, voters)| voters.iter().cloned())
            .collect()
    }
}

impl MedianPoll {
    /// A new poll; the votes are assumed unsorted and not truncated.
    pub fn new(value: MedianUnit, votes: Vec<MedianVote>) -> MedianPoll {
        MedianPoll {
            value,
            votes,
            sorted: false,
        }
    }

    pub fn add_vote(&mut self, vote: MedianVote) {
        self.votes.push(vote);
        self.sorted = false;
    }

    /// Stable in-place sort by value, highest first. Ties keep their
    /// insertion order.
    pub fn sort_votes(&mut self) {
        self.votes.sort_by(|a, b| b.value.cmp(&a.value));
        self.sorted = true;
    }

    fn assure_sorted(&mut self) {
        if !self.sorted {
            self.sort_votes();
        }
    }

    /// Sum of all voter weights.
    pub fn weight_sum(&self) -> Weight {
        self.votes.iter().map(|vote| vote.voter.weight).sum()
    }

    /// Rewrites every vote with a value above the poll ceiling to the
    /// ceiling and returns records of the offenders (pre-truncation value,
    /// shared voter handle) for auditing.
    ///
    /// If the votes were sorted before they stay sorted: all offenders sit
    /// at the front and become the ceiling, which is still at least as
    /// large as everything behind them.
    pub fn truncate(&mut self) -> Vec<MedianVote> {
        let mut culprits = Vec::new();
        for vote in &mut self.votes {
            if vote.value > self.value {
                culprits.push(MedianVote::new(Arc::clone(&vote.voter), vote.value));
                vote.value = self.value;
            }
        }
        culprits
    }

    /// Computes the poll result.
    ///
    /// `majority` is the weight the winning value must exceed strictly; if
    /// `None` it defaults to half of the weight sum, rounded down. With ten
    /// voters of weight one the highest value reaching more than five votes
    /// wins.
    ///
    /// Zero should normally reach a majority since it is the smallest value
    /// anyone can vote for; if there are no votes at all, or the majority
    /// is out of reach (larger than the weight sum), the majority value is
    /// [`NO_MEDIAN_UNIT`].
    ///
    /// Sorts the votes first if necessary: linear if already sorted,
    /// `O(n log n)` otherwise.
    pub fn tally(&mut self, majority: Option<Weight>) -> MedianResult {
        self.assure_sorted();
        let weight_sum = self.weight_sum();
        let required_majority =
            majority.unwrap_or_else(|| compute_majority(FIFTY_PERCENT_MAJORITY, weight_sum));

        let mut res = MedianResult {
            weight_sum,
            required_majority,
            majority_value: NO_MEDIAN_UNIT,
            value_details: BTreeMap::new(),
        };

        let mut current_weight: Weight = 0;
        let mut found_majority = false;
        for vote in &self.votes {
            res.value_details
                .entry(vote.value)
                .or_default()
                .push(Arc::clone(&vote.voter));
            current_weight += vote.voter.weight;
            if !found_majority && current_weight > required_majority {
                res.majority_value = vote.value;
                found_majority = true;
            }
        }

        res
    }
}
