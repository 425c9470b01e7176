use crate::error::{PollError, PollResult};
use crate::weight::Weight;

use std::collections::BTreeMap;
use std::sync::Arc;

/// Everyone who is allowed to participate in polls.
///
/// A voter has a name and a weight; the weight says how much the vote of
/// this voter counts (in normal elections this is one). Voters are passed
/// around as shared [`Arc`] handles: votes, polls and tally results all
/// reference the same voter objects.
///
/// Uniqueness of names is a property of a roster, not of the voter itself,
/// see [`voters_to_map`].
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Voter {
    pub name: String,
    pub weight: Weight,
}

impl Voter {
    pub fn new(name: impl Into<String>, weight: Weight) -> Arc<Voter> {
        Arc::new(Voter {
            name: name.into(),
            weight,
        })
    }
}

/// Returns the first voter name that appears more than once in the roster,
/// or `None` if all names are unique.
pub fn has_duplicate_voter(voters: &[Arc<Voter>]) -> Option<&str> {
    let mut seen: BTreeMap<&str, ()> = BTreeMap::new();
    for voter in voters {
        if seen.insert(voter.name.as_str(), ()).is_some() {
            return Some(voter.name.as_str());
        }
    }
    None
}

/// Builds the name → voter mapping for a roster.
///
/// Fails with [`PollError::DuplicateName`] if two voters share a name.
pub fn voters_to_map(voters: &[Arc<Voter>]) -> PollResult<BTreeMap<String, Arc<Voter>>> {
    let mut res = BTreeMap::new();
    for voter in voters {
        if res.insert(voter.name.clone(), Arc::clone(voter)).is_some() {
            return Err(PollError::duplicate("voter", voter.name.clone()));
        }
    }
    Ok(res)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_detection() {
        let roster = vec![
            Voter::new("ada", 1),
            Voter::new("grace", 2),
            Voter::new("ada", 3),
        ];
        assert_eq!(has_duplicate_voter(&roster), Some("ada"));
        let err = voters_to_map(&roster).unwrap_err();
        assert_eq!(err, PollError::duplicate("voter", "ada"));
    }

    #[test]
    fn map_of_unique_roster() {
        let roster = vec![Voter::new("ada", 1), Voter::new("grace", 2)];
        assert_eq!(has_duplicate_voter(&roster), None);
        let map = voters_to_map(&roster).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map["grace"].weight, 2);
        // structural equality on name and weight
        assert_eq!(*map["ada"], Voter { name: "ada".to_string(), weight: 1 });
    }
}
