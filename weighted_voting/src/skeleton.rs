use crate::currency::{CurrencyHandler, CurrencyValue};
use crate::error::{PollError, PollResult};

use std::collections::BTreeMap;
use std::io;

/// A declarative poll description, before any votes exist.
///
/// Skeletons are what the outline format describes; a
/// [`SkeletonConverter`](crate::SkeletonConverter) turns them into empty
/// polls. The split exists because one description can be evaluated with
/// different procedures: a choice skeleton becomes a two-choice poll or a
/// Schulze poll depending on configuration.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum Skeleton {
    /// A poll about a money value, usually evaluated with the median
    /// procedure. The value may be negative here; the converter rejects it.
    Money {
        name: String,
        value: CurrencyValue,
    },
    /// A poll over a list of options.
    Choice {
        name: String,
        options: Vec<String>,
    },
}

impl Skeleton {
    pub fn new_money(name: impl Into<String>, value: CurrencyValue) -> Skeleton {
        Skeleton::Money {
            name: name.into(),
            value,
        }
    }

    pub fn new_choice(name: impl Into<String>, options: Vec<String>) -> Skeleton {
        Skeleton::Choice {
            name: name.into(),
            options,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Skeleton::Money { .. } => "money",
            Skeleton::Choice { .. } => "choice",
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Skeleton::Money { name, .. } => name,
            Skeleton::Choice { name, .. } => name,
        }
    }

    /// Writes the skeleton in the textual outline format.
    ///
    /// Money values are rendered through the currency formatter.
    pub fn dump<W: io::Write>(
        &self,
        w: &mut W,
        formatter: &dyn CurrencyHandler,
    ) -> io::Result<()> {
        match self {
            Skeleton::Money { name, value } => {
                writeln!(w, "### {}", name)?;
                writeln!(w, "- {}", formatter.format(value))?;
                writeln!(w)
            }
            Skeleton::Choice { name, options } => {
                writeln!(w, "### {}", name)?;
                for option in options {
                    writeln!(w, "* {}", option)?;
                }
                writeln!(w)
            }
        }
    }
}

/// A titled group of skeletons.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct SkeletonGroup {
    pub title: String,
    pub skeletons: Vec<Skeleton>,
}

impl SkeletonGroup {
    pub fn new(title: impl Into<String>) -> SkeletonGroup {
        SkeletonGroup {
            title: title.into(),
            skeletons: Vec::new(),
        }
    }

    pub fn num_skeletons(&self) -> usize {
        self.skeletons.len()
    }

    pub fn dump<W: io::Write>(
        &self,
        w: &mut W,
        formatter: &dyn CurrencyHandler,
    ) -> io::Result<()> {
        writeln!(w, "## {}\n", self.title)?;
        for skeleton in &self.skeletons {
            skeleton.dump(w, formatter)?;
        }
        Ok(())
    }
}

/// A titled collection of skeleton groups, the unit the outline format
/// describes.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct SkeletonCollection {
    pub title: String,
    pub groups: Vec<SkeletonGroup>,
}

impl SkeletonCollection {
    pub fn new(title: impl Into<String>) -> SkeletonCollection {
        SkeletonCollection {
            title: title.into(),
            groups: Vec::new(),
        }
    }

    pub fn num_groups(&self) -> usize {
        self.groups.len()
    }

    pub fn num_skeletons(&self) -> usize {
        self.groups.iter().map(SkeletonGroup::num_skeletons).sum()
    }

    /// All skeletons in one flat list, group order first, in-group order
    /// second.
    pub fn collect_skeletons(&self) -> Vec<&Skeleton> {
        self.groups
            .iter()
            .flat_map(|group| group.skeletons.iter())
            .collect()
    }

    /// Returns the first skeleton name that appears twice across all
    /// groups, or `None`.
    pub fn has_duplicate_skeleton(&self) -> Option<&str> {
        let mut seen: BTreeMap<&str, ()> = BTreeMap::new();
        for group in &self.groups {
            for skeleton in &group.skeletons {
                if seen.insert(skeleton.name(), ()).is_some() {
                    return Some(skeleton.name());
                }
            }
        }
        None
    }

    /// The name → skeleton mapping, failing with
    /// [`PollError::DuplicateName`] on a name clash.
    pub fn to_map(&self) -> PollResult<BTreeMap<&str, &Skeleton>> {
        let mut res = BTreeMap::new();
        for group in &self.groups {
            for skeleton in &group.skeletons {
                if res.insert(skeleton.name(), skeleton).is_some() {
                    return Err(PollError::duplicate("skeleton", skeleton.name()));
                }
            }
        }
        Ok(res)
    }

    pub fn dump<W: io::Write>(
        &self,
        w: &mut W,
        formatter: &dyn CurrencyHandler,
    ) -> io::Result<()> {
        writeln!(w, "# {}\n", self.title)?;
        for group in &self.groups {
            group.dump(w, formatter)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::currency::SimpleEuroHandler;

    fn sample_collection() -> SkeletonCollection {
        let mut coll = SkeletonCollection::new("General assembly 2021");
        let mut finance = SkeletonGroup::new("Finance");
        finance.skeletons.push(Skeleton::new_money(
            "New server",
            CurrencyValue::new(50000, "€"),
        ));
        let mut elections = SkeletonGroup::new("Elections");
        elections.skeletons.push(Skeleton::new_choice(
            "Board",
            vec!["ada".to_string(), "grace".to_string(), "None".to_string()],
        ));
        elections.skeletons.push(Skeleton::new_choice(
            "Accept minutes",
            vec!["Yes".to_string(), "No".to_string()],
        ));
        coll.groups.push(finance);
        coll.groups.push(elections);
        coll
    }

    #[test]
    fn counts_and_order() {
        let coll = sample_collection();
        assert_eq!(coll.num_groups(), 2);
        assert_eq!(coll.num_skeletons(), 3);
        let names: Vec<&str> = coll.collect_skeletons().iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["New server", "Board", "Accept minutes"]);
        assert_eq!(coll.has_duplicate_skeleton(), None);
        assert_eq!(coll.to_map().unwrap().len(), 3);
    }

    #[test]
    fn duplicate_names_across_groups() {
        let mut coll = sample_collection();
        coll.groups[1]
            .skeletons
            .push(Skeleton::new_choice("New server", vec![]));
        assert_eq!(coll.has_duplicate_skeleton(), Some("New server"));
        assert_eq!(
            coll.to_map().unwrap_err(),
            PollError::duplicate("skeleton", "New server")
        );
    }

    #[test]
    fn dump_outline_format() {
        let coll = sample_collection();
        let mut out = Vec::new();
        coll.dump(&mut out, &SimpleEuroHandler::new()).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("# General assembly 2021\n\n## Finance\n"));
        assert!(text.contains("### New server\n- 500.00 €\n"));
        assert!(text.contains("### Board\n* ada\n* grace\n* None\n"));
    }
}
