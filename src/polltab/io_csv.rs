// CSV framing for the ballot grid.
//
// The grid is read into plain strings only; turning cells into votes is
// the job of the ingestion in weighted_voting. Malformed CSV is reported
// as a poll syntax error so callers can distinguish it from I/O trouble.

use csv::{ReaderBuilder, WriterBuilder};
use snafu::ResultExt;

use weighted_voting::{BallotMatrix, PollError, Skeleton, Voter};

use crate::polltab::{CsvFlushSnafu, CsvWriteSnafu, PolltabError, PolltabResult};

use std::io;
use std::sync::Arc;

/// The separator used when none is configured.
pub const DEFAULT_SEPARATOR: u8 = b',';

/// Reads a ballot grid: the first record is the head (`voter` column plus
/// one column per poll), every further record one voter row.
///
/// Rows of differing lengths are accepted here; the ingestion rejects
/// them with a proper error message.
pub fn read_ballot_matrix<R: io::Read>(reader: R, separator: u8) -> PolltabResult<BallotMatrix> {
    let mut csv_reader = ReaderBuilder::new()
        .delimiter(separator)
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut records = csv_reader.records();
    let head: Vec<String> = match records.next() {
        None => {
            return Err(PolltabError::Poll {
                source: PollError::syntax("no header found in csv file"),
            })
        }
        Some(record) => record
            .map_err(csv_syntax_error)?
            .iter()
            .map(|s| s.to_string())
            .collect(),
    };
    if head.is_empty() {
        return Err(PolltabError::Poll {
            source: PollError::syntax("expected at least the voter column in csv file"),
        });
    }

    let mut body = Vec::new();
    for record in records {
        let record = record.map_err(csv_syntax_error)?;
        body.push(record.iter().map(|s| s.to_string()).collect());
    }

    Ok(BallotMatrix { head, body })
}

// the csv error text is copied so callers never depend on csv internals
fn csv_syntax_error(err: csv::Error) -> PolltabError {
    PolltabError::Poll {
        source: PollError::syntax(err.to_string()),
    }
}

/// Writes an empty ballot grid template: the head names all polls, then
/// one row per voter with empty vote cells.
pub fn write_empty_template<W: io::Write>(
    writer: W,
    voters: &[Arc<Voter>],
    skeletons: &[&Skeleton],
    separator: u8,
) -> PolltabResult<()> {
    let mut csv_writer = WriterBuilder::new().delimiter(separator).from_writer(writer);

    let mut head = Vec::with_capacity(skeletons.len() + 1);
    head.push("voter");
    head.extend(skeletons.iter().map(|skeleton| skeleton.name()));
    csv_writer.write_record(&head).context(CsvWriteSnafu)?;

    for voter in voters {
        let mut row = Vec::with_capacity(skeletons.len() + 1);
        row.push(voter.name.as_str());
        row.extend(std::iter::repeat("").take(skeletons.len()));
        csv_writer.write_record(&row).context(CsvWriteSnafu)?;
    }
    csv_writer.flush().context(CsvFlushSnafu)?;
    Ok(())
}
