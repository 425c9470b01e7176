use crate::voter::Voter;
use crate::weight::Weight;

use std::sync::Arc;

/// A ranking over the options of a Schulze poll.
///
/// One entry per option; a smaller number means the option is preferred,
/// equal numbers mean the options are tied. The absolute numbers carry no
/// meaning.
pub type SchulzeRanking = Vec<i64>;

/// A square matrix of weights, indexed `[row][column]`.
pub type SchulzeMatrix = Vec<Vec<Weight>>;

pub fn new_schulze_matrix(dimension: usize) -> SchulzeMatrix {
    vec![vec![0; dimension]; dimension]
}

/// A vote for a [`SchulzePoll`].
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct SchulzeVote {
    pub voter: Arc<Voter>,
    pub ranking: SchulzeRanking,
}

impl SchulzeVote {
    pub fn new(voter: Arc<Voter>, ranking: SchulzeRanking) -> SchulzeVote {
        SchulzeVote { voter, ranking }
    }
}

/// A poll evaluated with the Schulze (strongest path) method.
///
/// A vote is valid for the poll iff its ranking has exactly `num_options`
/// entries. Invalid votes are skipped silently by [`tally`]; call
/// [`truncate`] first to remove them and learn who cast them.
///
/// By convention of the callers in this crate the last option is the
/// reserved "No" option, see [`SchulzeResult::strictly_better_than_no`].
///
/// [`tally`]: SchulzePoll::tally
/// [`truncate`]: SchulzePoll::truncate
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct SchulzePoll {
    pub num_options: usize,
    pub votes: Vec<SchulzeVote>,
}

/// The result of tallying a [`SchulzePoll`].
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct SchulzeResult {
    /// `d[i][j]` is the weight of voters strictly preferring option `i`
    /// over option `j`.
    pub d: SchulzeMatrix,
    /// `d_non_strict[i][j]` additionally counts voters that rank `i` and
    /// `j` equal (in both directions). Diagnostic output, the strongest
    /// path uses only `d`.
    pub d_non_strict: SchulzeMatrix,
    /// `p[a][b]` is the weight of the strongest beatpath from `a` to `b`.
    pub p: SchulzeMatrix,
    /// Option indices grouped by wins, best group first. Every option
    /// appears in exactly one group; within a group indices are ascending.
    pub ranked_groups: Vec<Vec<usize>>,
    /// Sum of the weights of all ballots, including ballots with an
    /// invalid ranking length (which the matrices skip).
    pub weight_sum: Weight,
}

impl SchulzeResult {
    /// For each option the weight strictly preferring it over the last
    /// option. The entry for the last option itself is zero.
    pub fn strictly_better_than_no(&self) -> Vec<Weight> {
        column_against_last(&self.d)
    }

    /// For each option the weight ranking it at least as good as the last
    /// option. The entry for the last option itself is zero.
    pub fn better_or_equal_no(&self) -> Vec<Weight> {
        column_against_last(&self.d_non_strict)
    }
}

fn column_against_last(m: &SchulzeMatrix) -> Vec<Weight> {
    let n = m.len();
    if n == 0 {
        return Vec::new();
    }
    m.iter().map(|row| row[n - 1]).collect()
}

impl SchulzePoll {
    pub fn new(num_options: usize, votes: Vec<SchulzeVote>) -> SchulzePoll {
        SchulzePoll { num_options, votes }
    }

    pub fn add_vote(&mut self, vote: SchulzeVote) {
        self.votes.push(vote);
    }

    /// Removes all votes whose ranking length does not match the poll and
    /// returns them in input order.
    pub fn truncate(&mut self) -> Vec<SchulzeVote> {
        let culprits: Vec<SchulzeVote> = self
            .votes
            .iter()
            .filter(|vote| vote.ranking.len() != self.num_options)
            .cloned()
            .collect();
        if !culprits.is_empty() {
            let num_options = self.num_options;
            self.votes.retain(|vote| vote.ranking.len() == num_options);
        }
        culprits
    }

    /// Computes the pairwise matrices and the ballot weight sum.
    ///
    /// The weight sum is accumulated before the ranking length check, so
    /// it includes ballots that the matrices skip as invalid.
    fn compute_d(&self) -> (SchulzeMatrix, SchulzeMatrix, Weight) {
        let n = self.num_options;
        let mut strict = new_schulze_matrix(n);
        let mut non_strict = new_schulze_matrix(n);
        let mut weight_sum: Weight = 0;

        for vote in &self.votes {
            let w = vote.voter.weight;
            weight_sum += w;
            if vote.ranking.len() != n {
                continue;
            }
            let ranking = &vote.ranking;
            for i in 0..n {
                for j in (i + 1)..n {
                    if ranking[i] < ranking[j] {
                        strict[i][j] += w;
                        non_strict[i][j] += w;
                    } else if ranking[j] < ranking[i] {
                        strict[j][i] += w;
                        non_strict[j][i] += w;
                    } else {
                        non_strict[i][j] += w;
                        non_strict[j][i] += w;
                    }
                }
            }
        }

        (strict, non_strict, weight_sum)
    }

    /// Computes the strongest-path matrix from the strict pairwise matrix:
    /// a Floyd–Warshall style widening where path strength is the minimum
    /// edge along the path and competing paths take the maximum.
    fn compute_p(&self, d: &SchulzeMatrix) -> SchulzeMatrix {
        let n = self.num_options;
        let mut p = new_schulze_matrix(n);

        for i in 0..n {
            for j in 0..n {
                if i != j && d[i][j] > d[j][i] {
                    p[i][j] = d[i][j];
                }
            }
        }

        for i in 0..n {
            for j in 0..n {
                if i == j {
                    continue;
                }
                for k in 0..n {
                    if i != k && j != k {
                        p[j][k] = p[j][k].max(p[j][i].min(p[i][k]));
                    }
                }
            }
        }

        p
    }

    /// Groups the options by the number of pairwise strongest-path wins,
    /// best group first.
    fn rank(&self, p: &SchulzeMatrix) -> Vec<Vec<usize>> {
        let n = self.num_options;
        let wins: Vec<usize> = (0..n)
            .map(|i| (0..n).filter(|&j| j != i && p[i][j] > p[j][i]).count())
            .collect();

        let mut order: Vec<usize> = (0..n).collect();
        // stable sort keeps indices ascending inside a group
        order.sort_by(|&a, &b| wins[b].cmp(&wins[a]));

        let mut groups: Vec<Vec<usize>> = Vec::new();
        for option in order {
            match groups.last_mut() {
                Some(group) if wins[group[0]] == wins[option] => group.push(option),
                _ => groups.push(vec![option]),
            }
        }
        groups
    }

    /// Runs the full Schulze evaluation: pairwise matrices, strongest
    /// paths, ranking. `Θ(n³)` in the number of options plus `O(votes·n²)`.
    pub fn tally(&self) -> SchulzeResult {
        let (d, d_non_strict, weight_sum) = self.compute_d();
        let p = self.compute_p(&d);
        let ranked_groups = self.rank(&p);
        SchulzeResult {
            d,
            d_non_strict,
            p,
            ranked_groups,
            weight_sum,
        }
    }
}
