use log::debug;

use crate::basic::BasicResult;
use crate::median::MedianResult;
use crate::poll::{Poll, PollMap, TruncateReport};
use crate::schulze::SchulzeResult;
use crate::weight::{compute_majority, Fraction};

use std::collections::BTreeMap;
use std::thread;

/// The typed tally result of one poll.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum PollOutcome {
    Basic(BasicResult),
    Median(MedianResult),
    Schulze(SchulzeResult),
}

/// Settings for evaluating a whole poll map.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
pub struct TallySettings {
    /// The majority fraction for median polls. `None` keeps the default of
    /// half the weight sum; a fraction is applied to each poll's own
    /// weight sum.
    pub median_majority: Option<Fraction>,
}

/// Runs `truncate` on every poll and returns the non-empty reports, keyed
/// by poll name.
///
/// After a successful ingestion all votes are structurally valid, so a
/// non-empty report here means votes were attached some other way; most
/// callers treat that as fatal.
pub fn truncate_all(polls: &mut PollMap) -> BTreeMap<String, TruncateReport> {
    let mut res = BTreeMap::new();
    for (name, poll) in polls.iter_mut() {
        let report = poll.truncate();
        if !report.is_empty() {
            debug!("truncated {} invalid votes from poll \"{}\"", report.len(), name);
            res.insert(name.clone(), report);
        }
    }
    res
}

fn tally_poll(poll: &mut Poll, settings: TallySettings) -> PollOutcome {
    match poll {
        Poll::Basic(poll) => PollOutcome::Basic(poll.tally()),
        Poll::Median(poll) => {
            let majority = settings
                .median_majority
                .map(|fraction| compute_majority(fraction, poll.weight_sum()));
            PollOutcome::Median(poll.tally(majority))
        }
        Poll::Schulze(poll) => PollOutcome::Schulze(poll.tally()),
    }
}

/// Tallies every poll of the map, one task per poll, and collects the
/// typed results keyed by poll name.
///
/// Median polls are sorted in place by their tally, hence the mutable
/// map. The result map is ordered by name like the input map; task
/// completion order never shows.
pub fn tally_all(polls: &mut PollMap, settings: TallySettings) -> BTreeMap<String, PollOutcome> {
    let mut results = BTreeMap::new();
    thread::scope(|scope| {
        let handles: Vec<_> = polls
            .iter_mut()
            .map(|(name, poll)| {
                debug!("tallying poll \"{}\"", name);
                (name.clone(), scope.spawn(move || tally_poll(poll, settings)))
            })
            .collect();
        for (name, handle) in handles {
            let outcome = handle.join().expect("tally task panicked");
            results.insert(name, outcome);
        }
    });
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basic::{BasicChoice, BasicPoll, BasicVote};
    use crate::median::{MedianPoll, MedianVote};
    use crate::schulze::{SchulzePoll, SchulzeVote};
    use crate::voter::Voter;
    use crate::weight::TWO_THIRDS_MAJORITY;

    fn mixed_polls() -> PollMap {
        let ada = Voter::new("ada", 4);
        let grace = Voter::new("grace", 3);
        let linus = Voter::new("linus", 2);
        let ken = Voter::new("ken", 2);

        let basic = BasicPoll::new(vec![
            BasicVote::new(ada.clone(), BasicChoice::Aye),
            BasicVote::new(grace.clone(), BasicChoice::No),
            BasicVote::new(linus.clone(), BasicChoice::Abstain),
        ]);
        let median = MedianPoll::new(
            1000,
            vec![
                MedianVote::new(ada.clone(), 200),
                MedianVote::new(grace.clone(), 1000),
                MedianVote::new(linus.clone(), 700),
                MedianVote::new(ken.clone(), 500),
            ],
        );
        let schulze = SchulzePoll::new(
            2,
            vec![
                SchulzeVote::new(ada, vec![0, 1]),
                SchulzeVote::new(grace, vec![1, 0]),
            ],
        );

        let mut polls = PollMap::new();
        polls.insert("accept".to_string(), Poll::Basic(basic));
        polls.insert("budget".to_string(), Poll::Median(median));
        polls.insert("board".to_string(), Poll::Schulze(schulze));
        polls
    }

    #[test]
    fn tallies_every_poll_into_typed_outcomes() {
        let mut polls = mixed_polls();
        let results = tally_all(&mut polls, TallySettings::default());
        assert_eq!(results.len(), 3);

        match &results["accept"] {
            PollOutcome::Basic(res) => {
                assert_eq!(res.by_weight.ayes, 4);
                assert_eq!(res.by_weight.noes, 3);
            }
            other => panic!("expected basic outcome, got {:?}", other),
        }
        match &results["budget"] {
            PollOutcome::Median(res) => {
                assert_eq!(res.weight_sum, 11);
                assert_eq!(res.majority_value, 500);
            }
            other => panic!("expected median outcome, got {:?}", other),
        }
        match &results["board"] {
            PollOutcome::Schulze(res) => {
                assert_eq!(res.d[0][1], 4);
                assert_eq!(res.d[1][0], 3);
                assert_eq!(res.ranked_groups, vec![vec![0], vec![1]]);
            }
            other => panic!("expected schulze outcome, got {:?}", other),
        }

        // the median poll was sorted as a side effect
        match &polls["budget"] {
            Poll::Median(poll) => assert!(poll.sorted),
            _ => unreachable!(),
        }
    }

    #[test]
    fn median_majority_setting_applies_per_poll() {
        let mut polls = mixed_polls();
        let settings = TallySettings {
            median_majority: Some(TWO_THIRDS_MAJORITY),
        };
        let results = tally_all(&mut polls, settings);
        match &results["budget"] {
            PollOutcome::Median(res) => {
                // two thirds of 11 is 7, so more than 7 is required; the
                // walk only crosses that at the lowest value
                assert_eq!(res.required_majority, 7);
                assert_eq!(res.majority_value, 200);
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn truncate_all_reports_only_offenders() {
        let mut polls = mixed_polls();
        match polls.get_mut("budget").unwrap() {
            Poll::Median(poll) => poll.add_vote(MedianVote::new(Voter::new("late", 1), 4000)),
            _ => unreachable!(),
        }
        match polls.get_mut("board").unwrap() {
            Poll::Schulze(poll) => {
                poll.add_vote(SchulzeVote::new(Voter::new("late", 1), vec![1, 2, 3]))
            }
            _ => unreachable!(),
        }

        let reports = truncate_all(&mut polls);
        assert_eq!(reports.len(), 2);
        assert_eq!(reports["budget"].len(), 1);
        assert_eq!(reports["board"].len(), 1);
        assert!(!reports.contains_key("accept"));

        // idempotent: a second pass reports nothing
        assert!(truncate_all(&mut polls).is_empty());
    }
}
