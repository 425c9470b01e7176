use crate::error::{PollError, PollResult};

/// The type used for voter weights.
pub type Weight = u32;

/// Sentinel signalling "no weight", for example as a default argument.
pub const NO_WEIGHT: Weight = Weight::MAX;

/// Parses a [`Weight`] from a string.
///
/// Only plain decimal digits are accepted; the empty string, signs,
/// surrounding whitespace and the [`NO_WEIGHT`] sentinel are rejected with a
/// syntax error.
pub fn parse_weight(s: &str) -> PollResult<Weight> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(PollError::syntax(format!(
            "weight must be a plain decimal integer, got \"{}\"",
            s
        )));
    }
    let res: Weight = s
        .parse()
        .map_err(|_| PollError::syntax(format!("weight \"{}\" does not fit in 32 bits", s)))?;
    if res == NO_WEIGHT {
        return Err(PollError::syntax(format!(
            "integer value {} is too big for a weight",
            NO_WEIGHT
        )));
    }
    Ok(res)
}

/// An exact non-negative rational, used for majority fractions.
///
/// The denominator is never zero. All arithmetic on fractions happens in
/// `u64`, which is exact for every product of a fraction part with a
/// [`Weight`] sum.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct Fraction {
    pub num: u32,
    pub den: u32,
}

/// One half, the default majority.
pub const FIFTY_PERCENT_MAJORITY: Fraction = Fraction { num: 1, den: 2 };

/// Two thirds, for qualified majorities.
pub const TWO_THIRDS_MAJORITY: Fraction = Fraction { num: 2, den: 3 };

impl Fraction {
    pub fn new(num: u32, den: u32) -> Fraction {
        assert!(den != 0, "fraction denominator must not be zero");
        Fraction { num, den }
    }
}

/// Computes the required majority for a fraction and a sum of weights.
///
/// The result is `⌊fraction · votes_sum⌋`; a result of `m` means that
/// strictly more than `m` weight is required to have the majority. For
/// example with ten voters of weight one, a majority of one half returns
/// `5`, so at least six votes are needed; two thirds returns `6`, so at
/// least seven.
pub fn compute_majority(fraction: Fraction, votes_sum: Weight) -> Weight {
    let scaled = u64::from(fraction.num) * u64::from(votes_sum) / u64::from(fraction.den);
    // fraction <= 1 keeps this in Weight range
    scaled as Weight
}

/// The share `votes / votes_sum` as an exact fraction, zero if the sum is
/// zero.
pub fn compute_percentage(votes: Weight, votes_sum: Weight) -> Fraction {
    if votes_sum == 0 {
        return Fraction { num: 0, den: 1 };
    }
    Fraction {
        num: votes,
        den: votes_sum,
    }
}

/// Formats a share (usually between zero and one) as a percentage with
/// three decimal places, so one half becomes `"50.000"`.
///
/// This is for display only, the tallies never use it.
pub fn format_percentage(share: Fraction) -> String {
    // share * 100 with three decimals, rounded half up
    let scaled = u64::from(share.num) * 100_000;
    let den = u64::from(share.den);
    let mut q = scaled / den;
    let r = scaled % den;
    if 2 * r >= den {
        q += 1;
    }
    format!("{}.{:03}", q / 1000, q % 1000)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_weight_accepts_digits_only() {
        assert_eq!(parse_weight("0").unwrap(), 0);
        assert_eq!(parse_weight("42").unwrap(), 42);
        assert!(parse_weight("").is_err());
        assert!(parse_weight("-1").is_err());
        assert!(parse_weight("+1").is_err());
        assert!(parse_weight(" 1").is_err());
        assert!(parse_weight("12a").is_err());
        // one above u32::MAX
        assert!(parse_weight("4294967296").is_err());
        // the sentinel itself is rejected
        assert!(parse_weight(&NO_WEIGHT.to_string()).is_err());
    }

    #[test]
    fn majority_rounding() {
        let cases = [
            (FIFTY_PERCENT_MAJORITY, 10, 5),
            (TWO_THIRDS_MAJORITY, 10, 6),
            (Fraction::new(50, 100), 10, 5),
            (FIFTY_PERCENT_MAJORITY, 0, 0),
            (Fraction::new(0, 1), 42, 0),
            (FIFTY_PERCENT_MAJORITY, 42, 21),
            (TWO_THIRDS_MAJORITY, 42, 28),
            (Fraction::new(1, 3), 42, 14),
            (Fraction::new(2, 2), NO_WEIGHT, NO_WEIGHT),
        ];
        for (fraction, votes_sum, expected) in cases {
            assert_eq!(
                compute_majority(fraction, votes_sum),
                expected,
                "majority for {:?} of {}",
                fraction,
                votes_sum
            );
        }
    }

    #[test]
    fn percentage_formatting() {
        assert_eq!(format_percentage(compute_percentage(1, 2)), "50.000");
        assert_eq!(format_percentage(compute_percentage(2, 3)), "66.667");
        assert_eq!(format_percentage(compute_percentage(0, 0)), "0.000");
        assert_eq!(format_percentage(compute_percentage(7, 7)), "100.000");
        assert_eq!(format_percentage(compute_percentage(1, 8)), "12.500");
    }
}
