pub mod io_csv;
pub mod outline;
pub mod voters;

use log::{info, warn};

use snafu::{whatever, ResultExt, Snafu};

use serde::{Deserialize, Serialize};
use serde_json::json;
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use weighted_voting::{
    compute_percentage, convert_collection, format_percentage, ingest_ballots, tally_all,
    truncate_all, BasicCounter, EmptyVotePolicies, EmptyVotePolicy, Fraction, IngestOptions,
    IngestReport, ParserFactory, PollError, PollOutcome, SimpleEuroHandler, SkeletonCollection,
    SkeletonConverter, TallySettings, Voter, FIFTY_PERCENT_MAJORITY, NO_MEDIAN_UNIT,
    TWO_THIRDS_MAJORITY,
};

use crate::args::Args;
use crate::polltab::outline::OutlineParser;
use crate::polltab::voters::VotersParser;

use std::collections::BTreeMap;
use std::fs;
use std::sync::Arc;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum PolltabError {
    #[snafu(display("failed to open file {}: {}", path, source))]
    OpeningFile {
        path: String,
        source: std::io::Error,
    },
    #[snafu(display("failed to write file {}: {}", path, source))]
    WritingFile {
        path: String,
        source: std::io::Error,
    },
    #[snafu(display("failed to write csv record: {}", source))]
    CsvWrite { source: csv::Error },
    #[snafu(display("failed to flush csv output: {}", source))]
    CsvFlush { source: std::io::Error },
    /// An error from the poll core (as opposed to I/O trouble).
    #[snafu(display("poll error: {}", source))]
    Poll { source: PollError },
    #[snafu(whatever, display("{}", message))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type PolltabResult<T> = Result<T, PolltabError>;

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
struct OutputConfig {
    title: String,
    #[serde(rename = "numVoters")]
    num_voters: usize,
    #[serde(rename = "numPolls")]
    num_polls: usize,
}

fn parse_separator(separator: &Option<String>) -> PolltabResult<u8> {
    match separator {
        None => Ok(io_csv::DEFAULT_SEPARATOR),
        Some(s) if s.as_bytes().len() == 1 => Ok(s.as_bytes()[0]),
        Some(s) => whatever!("the csv separator must be a single byte, got {:?}", s),
    }
}

fn parse_empty_policy(policy: &Option<String>) -> PolltabResult<EmptyVotePolicy> {
    match policy.as_deref() {
        None | Some("ignore") => Ok(EmptyVotePolicy::Ignore),
        Some("error") => Ok(EmptyVotePolicy::Error),
        Some("aye") => Ok(EmptyVotePolicy::AddAsAye),
        Some("no") => Ok(EmptyVotePolicy::AddAsNo),
        Some("abstain") => Ok(EmptyVotePolicy::AddAsAbstain),
        Some(other) => whatever!(
            "unknown empty-vote policy {:?}, allowed are ignore, error, aye, no and abstain",
            other
        ),
    }
}

fn parse_majority(majority: &Option<String>) -> PolltabResult<Option<Fraction>> {
    match majority.as_deref() {
        None | Some("half") => Ok(Some(FIFTY_PERCENT_MAJORITY)),
        Some("two-thirds") => Ok(Some(TWO_THIRDS_MAJORITY)),
        Some(other) => whatever!(
            "unknown majority {:?}, allowed are half and two-thirds",
            other
        ),
    }
}

fn read_file(path: &str) -> PolltabResult<String> {
    fs::read_to_string(path).context(OpeningFileSnafu { path })
}

fn counter_to_json(counter: &BasicCounter) -> JSValue {
    json!({
        "noes": counter.noes,
        "ayes": counter.ayes,
        "abstentions": counter.abstentions,
        "invalid": counter.invalid,
    })
}

fn outcome_to_json(outcome: &PollOutcome) -> JSValue {
    match outcome {
        PollOutcome::Basic(res) => {
            let total = res.by_weight.noes
                + res.by_weight.ayes
                + res.by_weight.abstentions
                + res.by_weight.invalid;
            json!({
                "type": "basic-poll",
                "byCount": counter_to_json(&res.by_count),
                "byWeight": counter_to_json(&res.by_weight),
                "ayePercent": format_percentage(compute_percentage(res.by_weight.ayes, total)),
            })
        }
        PollOutcome::Median(res) => {
            let mut details = JSMap::new();
            for (value, voters) in &res.value_details {
                let names: Vec<&str> = voters.iter().map(|v| v.name.as_str()).collect();
                details.insert(value.to_string(), json!(names));
            }
            let majority_value = if res.majority_value == NO_MEDIAN_UNIT {
                JSValue::Null
            } else {
                json!(res.majority_value)
            };
            json!({
                "type": "median-poll",
                "weightSum": res.weight_sum,
                "requiredMajority": res.required_majority,
                "majorityValue": majority_value,
                "details": details,
            })
        }
        PollOutcome::Schulze(res) => json!({
            "type": "schulze-poll",
            "weightSum": res.weight_sum,
            "d": res.d,
            "dNonStrict": res.d_non_strict,
            "p": res.p,
            "rankedGroups": res.ranked_groups,
            "strictlyBetterThanNo": res.strictly_better_than_no(),
            "betterOrEqualNo": res.better_or_equal_no(),
        }),
    }
}

fn build_summary(
    collection: &SkeletonCollection,
    report: &IngestReport,
    outcomes: &BTreeMap<String, PollOutcome>,
) -> JSValue {
    let config = OutputConfig {
        title: collection.title.clone(),
        num_voters: report.matched_voters.len(),
        num_polls: report.matched_polls.len(),
    };
    let mut polls_js = JSMap::new();
    for (name, outcome) in outcomes {
        polls_js.insert(name.clone(), outcome_to_json(outcome));
    }
    json!({
        "config": config,
        "polls": polls_js,
    })
}

fn write_template(
    path: &str,
    voters: &[Arc<Voter>],
    collection: &SkeletonCollection,
    separator: u8,
) -> PolltabResult<()> {
    let file = fs::File::create(path).context(WritingFileSnafu { path })?;
    io_csv::write_empty_template(file, voters, &collection.collect_skeletons(), separator)?;
    info!("wrote an empty ballot template to {}", path);
    Ok(())
}

/// Runs the whole tabulation: parse the roster and the poll outline, read
/// the ballot grid, ingest, tally and write the JSON summary.
pub fn run_poll(args: &Args) -> PolltabResult<()> {
    let separator = parse_separator(&args.separator)?;

    let voters_content = read_file(&args.voters)?;
    let voters = VotersParser::new()
        .parse_voters(&voters_content)
        .context(PollSnafu)?;
    info!("parsed {} voters from {}", voters.len(), args.voters);

    let polls_content = read_file(&args.polls)?;
    let currency = SimpleEuroHandler::new();
    let collection = OutlineParser::new()
        .parse(&polls_content, &currency)
        .context(PollSnafu)?;
    info!(
        "parsed poll collection \"{}\" with {} polls in {} groups",
        collection.title,
        collection.num_skeletons(),
        collection.num_groups()
    );

    if let Some(template_path) = &args.template {
        return write_template(template_path, &voters, &collection, separator);
    }

    let votes_path = match &args.votes {
        Some(path) => path,
        None => whatever!("either --votes or --template must be given"),
    };

    let converter = SkeletonConverter::new(!args.no_flatten_binary);
    let mut polls = convert_collection(&collection, &converter).context(PollSnafu)?;

    let votes_content = read_file(votes_path)?;
    let matrix = io_csv::read_ballot_matrix(votes_content.as_bytes(), separator)?;

    let policies = EmptyVotePolicies::uniform(parse_empty_policy(&args.empty_policy)?);
    let options = IngestOptions {
        allow_missing_voters: args.allow_missing_voters,
        allow_missing_polls: args.allow_missing_polls,
    };
    let factory = ParserFactory::default();
    let report = ingest_ballots(&matrix, &voters, &mut polls, &factory, &policies, options)
        .context(PollSnafu)?;
    info!(
        "ingested ballots of {} voters for {} polls",
        report.matched_voters.len(),
        report.matched_polls.len()
    );

    // after a clean ingestion nothing should be left to truncate; if
    // something is, the input pipeline has a bug and we stop here
    let truncated = truncate_all(&mut polls);
    if !truncated.is_empty() {
        let names: Vec<&str> = truncated.keys().map(String::as_str).collect();
        whatever!(
            "polls still contained invalid votes after ingestion: {}",
            names.join(", ")
        );
    }

    let settings = TallySettings {
        median_majority: parse_majority(&args.majority)?,
    };
    let outcomes = tally_all(&mut polls, settings);
    let summary = build_summary(&collection, &report, &outcomes);
    let pretty = serde_json::to_string_pretty(&summary)
        .whatever_context("failed to serialize the summary")?;

    if let Some(reference_path) = &args.reference {
        let reference_content = read_file(reference_path)?;
        let reference: JSValue = serde_json::from_str(&reference_content)
            .whatever_context("failed to parse the reference summary")?;
        let reference_pretty = serde_json::to_string_pretty(&reference)
            .whatever_context("failed to serialize the reference summary")?;
        if reference_pretty != pretty {
            warn!("found differences to the reference summary");
            print_diff(reference_pretty.as_str(), pretty.as_str(), "\n");
            whatever!("difference detected between the tallied summary and the reference summary");
        }
    }

    match args.out.as_deref() {
        None | Some("stdout") => println!("{}", pretty),
        Some(path) => {
            fs::write(path, format!("{}\n", pretty)).context(WritingFileSnafu { path })?
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const OUTLINE: &str = "\
# Assembly

## All

### accept
* Yes
* No

### budget
- 10.00 €

### board
* ada
* grace
* No
";

    const ROSTER: &str = "* ada: 4\n* grace: 3\n* linus: 2\n";

    // semicolons keep the schulze rankings inside single cells
    const BALLOTS: &str = "\
voter;accept;budget;board
ada;aye;10.00 €;1,2,3
grace;no;0.50 €;2,1,3
linus;;2.13 €;1,1,2
";

    fn tally_everything() -> (SkeletonCollection, IngestReport, BTreeMap<String, PollOutcome>) {
        let voters = VotersParser::new().parse_voters(ROSTER).unwrap();
        let collection = OutlineParser::new()
            .parse(OUTLINE, &SimpleEuroHandler::new())
            .unwrap();
        let mut polls =
            convert_collection(&collection, &SkeletonConverter::default()).unwrap();
        let matrix = io_csv::read_ballot_matrix(BALLOTS.as_bytes(), b';').unwrap();
        let report = ingest_ballots(
            &matrix,
            &voters,
            &mut polls,
            &ParserFactory::default(),
            &EmptyVotePolicies::uniform(EmptyVotePolicy::Ignore),
            IngestOptions::default(),
        )
        .unwrap();
        assert!(truncate_all(&mut polls).is_empty());
        let outcomes = tally_all(&mut polls, TallySettings::default());
        (collection, report, outcomes)
    }

    #[test]
    fn summary_covers_every_poll() {
        let (collection, report, outcomes) = tally_everything();
        let summary = build_summary(&collection, &report, &outcomes);
        assert_eq!(summary["config"]["title"], "Assembly");
        assert_eq!(summary["config"]["numVoters"], 3);
        assert_eq!(summary["config"]["numPolls"], 3);

        let accept = &summary["polls"]["accept"];
        assert_eq!(accept["type"], "basic-poll");
        assert_eq!(accept["byWeight"]["ayes"], 4);
        assert_eq!(accept["byWeight"]["noes"], 3);
        // linus left the cell empty and is ignored
        assert_eq!(accept["byCount"]["abstentions"], 0);
        assert_eq!(accept["ayePercent"], "57.143");

        let budget = &summary["polls"]["budget"];
        assert_eq!(budget["type"], "median-poll");
        assert_eq!(budget["weightSum"], 9);
        assert_eq!(budget["requiredMajority"], 4);
        assert_eq!(budget["majorityValue"], 213);
        assert_eq!(budget["details"]["1000"][0], "ada");

        let board = &summary["polls"]["board"];
        assert_eq!(board["type"], "schulze-poll");
        assert_eq!(board["weightSum"], 9);
        assert_eq!(board["rankedGroups"][0][0], 0);
    }

    #[test]
    fn cli_option_parsing() {
        assert_eq!(parse_separator(&None).unwrap(), b',');
        assert_eq!(parse_separator(&Some(";".to_string())).unwrap(), b';');
        assert!(parse_separator(&Some(";;".to_string())).is_err());

        assert_eq!(
            parse_empty_policy(&Some("abstain".to_string())).unwrap(),
            EmptyVotePolicy::AddAsAbstain
        );
        assert!(parse_empty_policy(&Some("skip".to_string())).is_err());

        assert_eq!(
            parse_majority(&Some("two-thirds".to_string())).unwrap(),
            Some(TWO_THIRDS_MAJORITY)
        );
        assert!(parse_majority(&Some("most".to_string())).is_err());
    }
}
