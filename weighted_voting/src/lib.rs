/*!

Tally engine for weighted group decisions.

Three procedures over a shared roster of weighted voters:

* two-choice polls (Aye / No / Abstain), counted plain and weighted,
* weighted-median polls for money or other numeric ranges,
* Schulze (strongest path) polls for ranked options.

Polls start out as declarative [`Skeleton`]s, are converted into empty
[`Poll`]s and are then filled either directly via [`Poll::add_vote`] or from
a rectangular ballot grid via [`ingest_ballots`], which verifies the grid
against the declared voters and polls and parses every cell with a
poll-specific parser. [`tally_all`] evaluates a whole poll map
concurrently.

```
use weighted_voting::{MedianPoll, MedianVote, Voter};

let mut poll = MedianPoll::new(
    1000,
    vec![
        MedianVote::new(Voter::new("ada", 4), 200),
        MedianVote::new(Voter::new("grace", 3), 1000),
        MedianVote::new(Voter::new("linus", 2), 700),
        MedianVote::new(Voter::new("ken", 2), 500),
    ],
);
let result = poll.tally(None);
assert_eq!(result.weight_sum, 11);
assert_eq!(result.required_majority, 5);
assert_eq!(result.majority_value, 500);
```

*/

mod basic;
mod currency;
mod error;
mod eval;
mod matrix;
mod median;
mod parsers;
mod poll;
mod schulze;
mod skeleton;
mod voter;
mod weight;

pub use basic::{BasicChoice, BasicCounter, BasicPoll, BasicResult, BasicVote};
pub use currency::{CurrencyHandler, CurrencyValue, RawCentHandler, SimpleEuroHandler};
pub use error::{PollError, PollKind, PollResult};
pub use eval::{tally_all, truncate_all, PollOutcome, TallySettings};
pub use matrix::{
    ingest_ballots, BallotMatrix, EmptyVotePolicies, IngestOptions, IngestReport,
};
pub use median::{
    parse_median_unit, MedianPoll, MedianResult, MedianUnit, MedianVote, NO_MEDIAN_UNIT,
};
pub use parsers::{
    BasicVoteParser, MedianVoteParser, ParserFactory, SchulzeVoteParser, VoteParser,
};
pub use poll::{
    convert_collection, EmptyVotePolicy, Poll, PollMap, SkeletonConverter, TruncateReport, Vote,
};
pub use schulze::{
    new_schulze_matrix, SchulzeMatrix, SchulzePoll, SchulzeRanking, SchulzeResult, SchulzeVote,
};
pub use skeleton::{Skeleton, SkeletonCollection, SkeletonGroup};
pub use voter::{has_duplicate_voter, voters_to_map, Voter};
pub use weight::{
    compute_majority, compute_percentage, format_percentage, parse_weight, Fraction, Weight,
    FIFTY_PERCENT_MAJORITY, NO_WEIGHT, TWO_THIRDS_MAJORITY,
};
