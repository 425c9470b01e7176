use clap::Parser;

/// Tabulates weighted group decisions: two-choice polls, weighted-median
/// polls and Schulze (ranked) polls.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path) The poll outline file describing the polls, see the
    /// documentation for the format.
    #[clap(short, long, value_parser)]
    pub polls: String,

    /// (file path) The voter roster, one "* <name>[: <weight>]" per line.
    #[clap(long, value_parser)]
    pub voters: String,

    /// (file path) The ballot grid as CSV: a voter column followed by one
    /// column per poll. Required unless --template is given.
    #[clap(long, value_parser)]
    pub votes: Option<String>,

    /// (file path) Instead of tallying, write an empty ballot grid for the
    /// parsed polls and voters to this location.
    #[clap(short, long, value_parser)]
    pub template: Option<String>,

    /// (file path, 'stdout' or empty) Where to write the JSON summary.
    /// Defaults to stdout.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path) A reference summary in JSON format. If provided, polltab
    /// checks that the tallied output matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (single character, default ',') The CSV cell separator.
    #[clap(long, value_parser)]
    pub separator: Option<String>,

    /// Evaluate two-option polls with the Schulze method instead of
    /// flattening them to Aye/No polls.
    #[clap(long, takes_value = false)]
    pub no_flatten_binary: bool,

    /// (ignore, error, aye, no or abstain; default ignore) What to do with
    /// empty ballot cells.
    #[clap(long, value_parser)]
    pub empty_policy: Option<String>,

    /// (half or two-thirds; default half) The majority required in median
    /// polls.
    #[clap(long, value_parser)]
    pub majority: Option<String>,

    /// Accept ballot grids that omit some voters of the roster.
    #[clap(long, takes_value = false)]
    pub allow_missing_voters: bool,

    /// Accept ballot grids that omit some polls of the outline.
    #[clap(long, takes_value = false)]
    pub allow_missing_polls: bool,

    /// If passed as an argument, will turn on verbose logging to the
    /// standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
