use log::debug;

use crate::error::{PollError, PollResult};
use crate::parsers::{ParserFactory, VoteParser};
use crate::poll::{EmptyVotePolicy, Poll, PollMap};
use crate::voter::{voters_to_map, Voter};

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::thread;

/// A ballot grid as it came out of the CSV framing: a head of the form
/// `["voter", <poll 1>, ..., <poll M>]` and body rows of the form
/// `[<voter name>, <vote for poll 1>, ..., <vote for poll M>]`.
///
/// The grid carries only strings; [`ingest_ballots`] verifies it against
/// declared voters and polls and turns the cells into typed votes.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct BallotMatrix {
    pub head: Vec<String>,
    pub body: Vec<Vec<String>>,
}

/// Whether the grid may omit declared voters (rows) or polls (columns).
///
/// Omissions in the other direction, a grid voter or poll that was never
/// declared, are always an error.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
pub struct IngestOptions {
    pub allow_missing_voters: bool,
    pub allow_missing_polls: bool,
}

/// The empty-vote policy per poll: one default plus per-poll overrides.
#[derive(Debug, Clone)]
pub struct EmptyVotePolicies {
    default_policy: EmptyVotePolicy,
    overrides: BTreeMap<String, EmptyVotePolicy>,
}

impl EmptyVotePolicies {
    /// The same policy for every poll.
    pub fn uniform(policy: EmptyVotePolicy) -> EmptyVotePolicies {
        EmptyVotePolicies {
            default_policy: policy,
            overrides: BTreeMap::new(),
        }
    }

    pub fn with_policy(
        mut self,
        poll_name: impl Into<String>,
        policy: EmptyVotePolicy,
    ) -> EmptyVotePolicies {
        self.overrides.insert(poll_name.into(), policy);
        self
    }

    pub fn policy_for(&self, poll_name: &str) -> EmptyVotePolicy {
        self.overrides
            .get(poll_name)
            .copied()
            .unwrap_or(self.default_policy)
    }
}

impl Default for EmptyVotePolicies {
    fn default() -> Self {
        EmptyVotePolicies::uniform(EmptyVotePolicy::Ignore)
    }
}

/// What the match phase resolved: the grid voters in body order and the
/// grid polls in head order.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct IngestReport {
    pub matched_voters: Vec<Arc<Voter>>,
    pub matched_polls: Vec<String>,
}

/// Verifies a ballot grid against a roster and a poll map and fills the
/// polls with the parsed votes.
///
/// The match phase checks shape and names: rectangular body, no duplicate
/// voters or polls, every grid voter in the roster, every grid poll in the
/// map and, unless `options` allows the omission, every roster voter and
/// every poll present in the grid.
///
/// The fill phase then runs one task per poll: empty cells go through the
/// poll's [`EmptyVotePolicy`], everything else through the poll's
/// customized parser from `factory`, and the produced votes are appended
/// in body order. If several polls fail the error of the poll with the
/// smallest column index is reported. On failure polls may be left
/// partially filled; callers discard the map in that case.
pub fn ingest_ballots(
    matrix: &BallotMatrix,
    roster: &[Arc<Voter>],
    polls: &mut PollMap,
    factory: &ParserFactory,
    policies: &EmptyVotePolicies,
    options: IngestOptions,
) -> PollResult<IngestReport> {
    let report = match_matrix(matrix, roster, polls, options)?;
    fill_polls(matrix, polls, factory, policies, &report)?;
    Ok(report)
}

fn match_matrix(
    matrix: &BallotMatrix,
    roster: &[Arc<Voter>],
    polls: &PollMap,
    options: IngestOptions,
) -> PollResult<IngestReport> {
    if matrix.head.is_empty() {
        return Err(PollError::semantic(
            "ballot matrix must contain at least the voter column",
        ));
    }
    for row in &matrix.body {
        if row.len() != matrix.head.len() {
            return Err(PollError::syntax(format!(
                "every ballot matrix row must have {} columns, got a row with {}",
                matrix.head.len(),
                row.len()
            )));
        }
    }

    let voters_by_name = voters_to_map(roster)?;
    let mut matched_voters = Vec::with_capacity(matrix.body.len());
    let mut seen_voters = BTreeSet::new();
    for row in &matrix.body {
        let name = row[0].as_str();
        if !seen_voters.insert(name) {
            return Err(PollError::duplicate("voter", name));
        }
        match voters_by_name.get(name) {
            Some(voter) => matched_voters.push(Arc::clone(voter)),
            None => {
                return Err(PollError::semantic(format!(
                    "voter \"{}\" from the ballot matrix is not in the roster",
                    name
                )))
            }
        }
    }

    let mut matched_polls = Vec::with_capacity(matrix.head.len() - 1);
    let mut seen_polls = BTreeSet::new();
    for name in &matrix.head[1..] {
        if !seen_polls.insert(name.as_str()) {
            return Err(PollError::duplicate("poll", name.clone()));
        }
        if !polls.contains_key(name) {
            return Err(PollError::semantic(format!(
                "poll \"{}\" from the ballot matrix is not in the poll map",
                name
            )));
        }
        matched_polls.push(name.clone());
    }

    if !options.allow_missing_voters && matched_voters.len() < roster.len() {
        let missing: Vec<&str> = roster
            .iter()
            .map(|voter| voter.name.as_str())
            .filter(|name| !seen_voters.contains(name))
            .collect();
        return Err(PollError::semantic(format!(
            "ballot matrix misses votes for the following voters: {}",
            missing.join(", ")
        )));
    }
    if !options.allow_missing_polls && matched_polls.len() < polls.len() {
        let missing: Vec<&str> = polls
            .keys()
            .map(String::as_str)
            .filter(|name| !seen_polls.contains(name))
            .collect();
        return Err(PollError::semantic(format!(
            "ballot matrix misses columns for the following polls: {}",
            missing.join(", ")
        )));
    }

    Ok(IngestReport {
        matched_voters,
        matched_polls,
    })
}

struct PollTask {
    name: String,
    poll: Poll,
    column: usize,
    parser: VoteParser,
    policy: EmptyVotePolicy,
}

fn fill_polls(
    matrix: &BallotMatrix,
    polls: &mut PollMap,
    factory: &ParserFactory,
    policies: &EmptyVotePolicies,
    report: &IngestReport,
) -> PollResult<()> {
    // take the matched polls out of the map so every task exclusively owns
    // its poll; they are put back below, filled or not
    let mut tasks: Vec<PollTask> = report
        .matched_polls
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let poll = polls
                .remove(name)
                .expect("matched poll must be in the poll map");
            let parser = factory.for_poll(&poll);
            let policy = policies.policy_for(name);
            PollTask {
                name: name.clone(),
                poll,
                // the first body column holds the voter names
                column: idx + 1,
                parser,
                policy,
            }
        })
        .collect();

    let voters = &report.matched_voters;
    let body = &matrix.body;
    // one task per poll; the handles are in column order, so picking the
    // first error below reports the smallest failing column
    let results: Vec<PollResult<()>> = thread::scope(|scope| {
        let handles: Vec<_> = tasks
            .iter_mut()
            .map(|task| {
                scope.spawn(move || {
                    debug!("filling poll \"{}\" from column {}", task.name, task.column);
                    fill_single_poll(task, voters, body)
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("poll fill task panicked"))
            .collect()
    });

    for task in tasks {
        polls.insert(task.name, task.poll);
    }
    results.into_iter().collect()
}

fn fill_single_poll(
    task: &mut PollTask,
    voters: &[Arc<Voter>],
    body: &[Vec<String>],
) -> PollResult<()> {
    for (row, voter) in voters.iter().enumerate() {
        let cell = body[row][task.column].trim();
        let vote = if cell.is_empty() {
            match task.policy.generate_empty_vote(voter, &task.poll)? {
                Some(vote) => vote,
                None => continue,
            }
        } else {
            task.parser.parse(cell, voter)?
        };
        task.poll.add_vote(vote)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basic::BasicChoice;
    use crate::poll::{convert_collection, SkeletonConverter};
    use crate::skeleton::{Skeleton, SkeletonCollection, SkeletonGroup};

    use crate::currency::CurrencyValue;

    fn grid(head: &[&str], body: &[&[&str]]) -> BallotMatrix {
        BallotMatrix {
            head: head.iter().map(|s| s.to_string()).collect(),
            body: body
                .iter()
                .map(|row| row.iter().map(|s| s.to_string()).collect())
                .collect(),
        }
    }

    fn roster() -> Vec<Arc<Voter>> {
        vec![
            Voter::new("ada", 4),
            Voter::new("grace", 3),
            Voter::new("linus", 2),
        ]
    }

    // one poll of every kind: a binary choice, a money value and a
    // three-option election
    fn poll_map() -> PollMap {
        let mut coll = SkeletonCollection::new("Assembly");
        let mut group = SkeletonGroup::new("All");
        group.skeletons.push(Skeleton::new_choice(
            "accept",
            vec!["Yes".to_string(), "No".to_string()],
        ));
        group.skeletons.push(Skeleton::new_money(
            "budget",
            CurrencyValue::new(1000, "€"),
        ));
        group.skeletons.push(Skeleton::new_choice(
            "board",
            vec!["a".to_string(), "b".to_string(), "No".to_string()],
        ));
        coll.groups.push(group);
        convert_collection(&coll, &SkeletonConverter::default()).unwrap()
    }

    fn ingest(
        matrix: &BallotMatrix,
        polls: &mut PollMap,
        policies: &EmptyVotePolicies,
        options: IngestOptions,
    ) -> PollResult<IngestReport> {
        ingest_ballots(
            matrix,
            &roster(),
            polls,
            &ParserFactory::default(),
            policies,
            options,
        )
    }

    #[test]
    fn full_grid_fills_all_polls() {
        let matrix = grid(
            &["voter", "accept", "budget", "board"],
            &[
                &["ada", "aye", "10.00 €", "1,2,3"],
                &["grace", "no", "0.50 €", "2,1,3"],
                &["linus", "a", "2,13 €", "1,1,2"],
            ],
        );
        let mut polls = poll_map();
        let report = ingest(
            &matrix,
            &mut polls,
            &EmptyVotePolicies::default(),
            IngestOptions::default(),
        )
        .unwrap();

        let roster_names: BTreeSet<String> =
            roster().iter().map(|v| v.name.clone()).collect();
        let matched_names: BTreeSet<String> = report
            .matched_voters
            .iter()
            .map(|v| v.name.clone())
            .collect();
        assert_eq!(matched_names, roster_names);
        assert_eq!(report.matched_polls, vec!["accept", "budget", "board"]);

        match &polls["accept"] {
            Poll::Basic(poll) => {
                assert_eq!(poll.votes.len(), 3);
                // votes are appended in body order
                assert_eq!(poll.votes[0].voter.name, "ada");
                assert_eq!(poll.votes[0].choice, BasicChoice::Aye);
                assert_eq!(poll.votes[2].choice, BasicChoice::Abstain);
            }
            other => panic!("expected basic poll, got {:?}", other),
        }
        match &polls["budget"] {
            Poll::Median(poll) => {
                let values: Vec<u64> = poll.votes.iter().map(|v| v.value).collect();
                assert_eq!(values, vec![1000, 50, 213]);
            }
            other => panic!("expected median poll, got {:?}", other),
        }
        match &polls["board"] {
            Poll::Schulze(poll) => {
                assert_eq!(poll.votes.len(), 3);
                assert_eq!(poll.votes[2].ranking, vec![1, 1, 2]);
            }
            other => panic!("expected schulze poll, got {:?}", other),
        }
    }

    #[test]
    fn rejects_malformed_grids() {
        let mut polls = poll_map();
        let policies = EmptyVotePolicies::default();

        let empty_head = BallotMatrix::default();
        assert!(matches!(
            ingest(&empty_head, &mut polls, &policies, IngestOptions::default()).unwrap_err(),
            PollError::Semantic { .. }
        ));

        let ragged = grid(
            &["voter", "accept", "budget", "board"],
            &[&["ada", "aye", "1.00 €"]],
        );
        assert!(matches!(
            ingest(&ragged, &mut polls, &policies, IngestOptions::default()).unwrap_err(),
            PollError::Syntax { .. }
        ));
    }

    #[test]
    fn rejects_unknown_and_duplicate_names() {
        let policies = EmptyVotePolicies::default();
        let options = IngestOptions {
            allow_missing_voters: true,
            allow_missing_polls: true,
        };

        let duplicate_voter = grid(
            &["voter", "accept"],
            &[&["ada", "aye"], &["ada", "no"]],
        );
        assert_eq!(
            ingest(&duplicate_voter, &mut poll_map(), &policies, options).unwrap_err(),
            PollError::duplicate("voter", "ada")
        );

        let unknown_voter = grid(&["voter", "accept"], &[&["nobody", "aye"]]);
        assert!(matches!(
            ingest(&unknown_voter, &mut poll_map(), &policies, options).unwrap_err(),
            PollError::Semantic { .. }
        ));

        let duplicate_poll = grid(&["voter", "accept", "accept"], &[]);
        assert_eq!(
            ingest(&duplicate_poll, &mut poll_map(), &policies, options).unwrap_err(),
            PollError::duplicate("poll", "accept")
        );

        let unknown_poll = grid(&["voter", "no-such-poll"], &[]);
        assert!(matches!(
            ingest(&unknown_poll, &mut poll_map(), &policies, options).unwrap_err(),
            PollError::Semantic { .. }
        ));
    }

    #[test]
    fn missing_voters_and_polls_depend_on_options() {
        let matrix = grid(&["voter", "accept"], &[&["ada", "aye"]]);
        let policies = EmptyVotePolicies::default();

        let err = ingest(
            &matrix,
            &mut poll_map(),
            &policies,
            IngestOptions::default(),
        )
        .unwrap_err();
        match &err {
            PollError::Semantic { msg } => {
                assert!(msg.contains("grace"), "unexpected message: {}", msg);
                assert!(msg.contains("linus"), "unexpected message: {}", msg);
            }
            other => panic!("expected semantic error, got {:?}", other),
        }

        let relaxed_voters = IngestOptions {
            allow_missing_voters: true,
            allow_missing_polls: false,
        };
        let err = ingest(&matrix, &mut poll_map(), &policies, relaxed_voters).unwrap_err();
        match &err {
            PollError::Semantic { msg } => {
                assert!(msg.contains("budget"), "unexpected message: {}", msg);
                assert!(msg.contains("board"), "unexpected message: {}", msg);
            }
            other => panic!("expected semantic error, got {:?}", other),
        }

        let relaxed = IngestOptions {
            allow_missing_voters: true,
            allow_missing_polls: true,
        };
        let mut polls = poll_map();
        let report = ingest(&matrix, &mut polls, &policies, relaxed).unwrap();
        assert_eq!(report.matched_voters.len(), 1);
        assert_eq!(report.matched_polls, vec!["accept"]);
        match &polls["accept"] {
            Poll::Basic(poll) => assert_eq!(poll.votes.len(), 1),
            _ => unreachable!(),
        }
    }

    #[test]
    fn empty_cells_follow_the_policy() {
        let matrix = grid(
            &["voter", "accept"],
            &[&["ada", ""], &["grace", "  "], &["linus", "aye"]],
        );
        let options = IngestOptions {
            allow_missing_voters: false,
            allow_missing_polls: true,
        };

        let mut polls = poll_map();
        ingest(
            &matrix,
            &mut polls,
            &EmptyVotePolicies::uniform(EmptyVotePolicy::Ignore),
            options,
        )
        .unwrap();
        match &polls["accept"] {
            Poll::Basic(poll) => assert_eq!(poll.votes.len(), 1),
            _ => unreachable!(),
        }

        let mut polls = poll_map();
        ingest(
            &matrix,
            &mut polls,
            &EmptyVotePolicies::uniform(EmptyVotePolicy::AddAsNo),
            options,
        )
        .unwrap();
        match &polls["accept"] {
            Poll::Basic(poll) => {
                assert_eq!(poll.votes.len(), 3);
                assert_eq!(poll.votes[0].choice, BasicChoice::No);
                assert_eq!(poll.votes[1].choice, BasicChoice::No);
                assert_eq!(poll.votes[2].choice, BasicChoice::Aye);
            }
            _ => unreachable!(),
        }

        let mut polls = poll_map();
        let err = ingest(
            &matrix,
            &mut polls,
            &EmptyVotePolicies::uniform(EmptyVotePolicy::Error),
            options,
        )
        .unwrap_err();
        assert!(matches!(err, PollError::EmptyVote { .. }));

        // per-poll override beats the default
        let mut polls = poll_map();
        let policies = EmptyVotePolicies::uniform(EmptyVotePolicy::Error)
            .with_policy("accept", EmptyVotePolicy::Ignore);
        ingest(&matrix, &mut polls, &policies, options).unwrap();
    }

    #[test]
    fn parse_failures_report_the_smallest_column() {
        // budget (column 2) and board (column 3) both fail; the budget
        // error must win no matter how the tasks interleave
        let matrix = grid(
            &["voter", "accept", "budget", "board"],
            &[
                &["ada", "aye", "-1.00 €", "1,2,3"],
                &["grace", "no", "1.00 €", "1,2"],
                &["linus", "aye", "1.00 €", "1,2,3"],
            ],
        );
        for _ in 0..16 {
            let mut polls = poll_map();
            let err = ingest(
                &matrix,
                &mut polls,
                &EmptyVotePolicies::default(),
                IngestOptions::default(),
            )
            .unwrap_err();
            match &err {
                PollError::Semantic { msg } => {
                    assert!(msg.contains("negative value"), "unexpected: {}", msg)
                }
                other => panic!("expected the negative-budget error, got {:?}", other),
            }
        }
    }
}
