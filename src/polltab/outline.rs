// Parsing of the poll outline format:
//
//   # Assembly 2021
//
//   ## Finance
//
//   ### New server
//   - 500.00 €
//
//   ## Elections
//
//   ### Board
//   * ada
//   * grace
//   * No
//
// One title, then groups, then polls. A poll is either a money poll (one
// "-" line) or a choice poll (two or more "*" lines). Empty lines are
// skipped everywhere.

use regex::Regex;

use weighted_voting::{
    CurrencyHandler, PollError, PollResult, Skeleton, SkeletonCollection, SkeletonGroup,
};

/// Which construct the parser expects next.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
enum State {
    /// The title (`#`).
    Head,
    /// A group (`##`).
    Group,
    /// A poll name (`###`).
    Poll,
    /// The first option line of a poll (`*` or `-`).
    Option,
    /// Either a new group or a new poll.
    GroupOrPoll,
    /// Another option line, or a new group or poll.
    OptionalOption,
}

/// Parses a [`SkeletonCollection`] from the outline format.
///
/// The optional limits reject oversized input with a validation error; by
/// default everything is unlimited.
#[derive(Debug, Clone)]
pub struct OutlineParser {
    pub max_num_lines: Option<usize>,
    pub max_num_polls: Option<usize>,
    pub max_line_length: Option<usize>,
    pub max_title_length: Option<usize>,
    pub max_group_name_length: Option<usize>,
    pub max_poll_name_length: Option<usize>,
    pub max_num_options: Option<usize>,
    pub max_option_length: Option<usize>,
    pub max_currency_cents: Option<i64>,
    head_rx: Regex,
    group_rx: Regex,
    poll_rx: Regex,
    option_rx: Regex,
    money_rx: Regex,
}

struct ParseContext {
    collection: SkeletonCollection,
    last_poll_name: String,
    num_skeletons: usize,
}

impl OutlineParser {
    pub fn new() -> OutlineParser {
        OutlineParser {
            max_num_lines: None,
            max_num_polls: None,
            max_line_length: None,
            max_title_length: None,
            max_group_name_length: None,
            max_poll_name_length: None,
            max_num_options: None,
            max_option_length: None,
            max_currency_cents: None,
            head_rx: Regex::new(r"^\s*#\s+(.+?)\s*$").expect("head pattern is valid"),
            group_rx: Regex::new(r"^\s*##\s+(.+?)\s*$").expect("group pattern is valid"),
            poll_rx: Regex::new(r"^\s*###\s+(.+?)\s*$").expect("poll pattern is valid"),
            option_rx: Regex::new(r"^\s*[*]\s+(.+?)\s*$").expect("option pattern is valid"),
            money_rx: Regex::new(r"^\s*[-]\s+(.+?)\s*$").expect("money pattern is valid"),
        }
    }

    /// Parses a whole outline; money values go through the currency
    /// collaborator. Syntax errors carry the line number.
    pub fn parse(
        &self,
        s: &str,
        currency: &dyn CurrencyHandler,
    ) -> PollResult<SkeletonCollection> {
        let mut context = ParseContext {
            collection: SkeletonCollection::new(""),
            last_poll_name: String::new(),
            num_skeletons: 0,
        };
        let mut state = State::Head;

        for (idx, raw_line) in s.lines().enumerate() {
            let line_num = idx + 1;
            self.validate_line(raw_line, line_num)?;
            let line = raw_line.trim();
            if line.is_empty() {
                continue;
            }
            state = self
                .handle_line(state, line, &mut context, currency)
                .map_err(|err| err.with_line(line_num))?;
        }

        // every choice poll needs at least two options, everything else
        // makes no sense to evaluate
        for group in &context.collection.groups {
            for skeleton in &group.skeletons {
                if let Skeleton::Choice { name, options } = skeleton {
                    if options.len() < 2 {
                        return Err(PollError::syntax(format!(
                            "poll \"{}\" contains only {} options, at least two are required",
                            name,
                            options.len()
                        )));
                    }
                }
            }
        }

        match state {
            State::Head => Err(PollError::syntax("no title found \"# <TITLE>\"")),
            State::Option => Err(PollError::syntax(
                "found beginning of a poll but no option was given",
            )),
            _ => Ok(context.collection),
        }
    }

    fn handle_line(
        &self,
        state: State,
        line: &str,
        context: &mut ParseContext,
        currency: &dyn CurrencyHandler,
    ) -> PollResult<State> {
        match state {
            State::Head => self.handle_head(line, context),
            State::Group => self.handle_group(line, context),
            State::Poll => self.handle_poll(line, context),
            State::Option => self.handle_option(line, context, currency),
            State::GroupOrPoll => self.handle_group_or_poll(line, context),
            State::OptionalOption => self.handle_optional_option(line, context),
        }
    }

    fn handle_head(&self, line: &str, context: &mut ParseContext) -> PollResult<State> {
        let caps = self.head_rx.captures(line).ok_or_else(|| {
            PollError::syntax("invalid head line, must be of the form \"# <TITLE>\"")
        })?;
        let title = caps[1].to_string();
        if let Some(max_title) = self.max_title_length {
            if title.len() > max_title {
                return Err(PollError::validation(format!(
                    "title is too long: got length {}, allowed max length is {}",
                    title.len(),
                    max_title
                )));
            }
        }
        context.collection.title = title;
        Ok(State::Group)
    }

    fn handle_group(&self, line: &str, context: &mut ParseContext) -> PollResult<State> {
        let caps = self.group_rx.captures(line).ok_or_else(|| {
            PollError::syntax("invalid group line, must be of the form \"## <GROUP>\"")
        })?;
        let name = caps[1].to_string();
        if let Some(max_group) = self.max_group_name_length {
            if name.len() > max_group {
                return Err(PollError::validation(format!(
                    "group name is too long: got length {}, allowed max length is {}",
                    name.len(),
                    max_group
                )));
            }
        }
        context.collection.groups.push(SkeletonGroup::new(name));
        Ok(State::Poll)
    }

    fn handle_poll(&self, line: &str, context: &mut ParseContext) -> PollResult<State> {
        let caps = self.poll_rx.captures(line).ok_or_else(|| {
            PollError::syntax("invalid poll line, must be of the form \"### <POLL>\"")
        })?;
        let name = caps[1].to_string();
        if let Some(max_poll) = self.max_poll_name_length {
            if name.len() > max_poll {
                return Err(PollError::validation(format!(
                    "poll name is too long: got length {}, allowed max length is {}",
                    name.len(),
                    max_poll
                )));
            }
        }
        context.last_poll_name = name;
        Ok(State::Option)
    }

    fn handle_option(
        &self,
        line: &str,
        context: &mut ParseContext,
        currency: &dyn CurrencyHandler,
    ) -> PollResult<State> {
        if let Some(caps) = self.option_rx.captures(line) {
            let option = caps[1].to_string();
            self.validate_option(&option, 1)?;
            let skeleton = Skeleton::new_choice(context.last_poll_name.clone(), vec![option]);
            self.push_skeleton(context, skeleton)?;
            return Ok(State::OptionalOption);
        }
        if let Some(caps) = self.money_rx.captures(line) {
            let value = currency.parse(&caps[1])?;
            if value.value_cents < 0 {
                return Err(PollError::semantic(format!(
                    "string \"{}\" describes a negative value, can't be used in a median poll",
                    &caps[1]
                )));
            }
            if let Some(max_cents) = self.max_currency_cents {
                if value.value_cents > max_cents {
                    return Err(PollError::validation(format!(
                        "value for money poll is too big: got {} cents, allowed max is {}",
                        value.value_cents, max_cents
                    )));
                }
            }
            let skeleton = Skeleton::new_money(context.last_poll_name.clone(), value);
            self.push_skeleton(context, skeleton)?;
            return Ok(State::GroupOrPoll);
        }
        Err(PollError::syntax(
            "invalid option line, must either be a standard option \"*\" or a money value \"-\"",
        ))
    }

    fn handle_group_or_poll(&self, line: &str, context: &mut ParseContext) -> PollResult<State> {
        if self.group_rx.is_match(line) {
            return self.handle_group(line, context);
        }
        if self.poll_rx.is_match(line) {
            return self.handle_poll(line, context);
        }
        Err(PollError::syntax("expected either group or poll"))
    }

    fn handle_optional_option(
        &self,
        line: &str,
        context: &mut ParseContext,
    ) -> PollResult<State> {
        if let Some(caps) = self.option_rx.captures(line) {
            let option = caps[1].to_string();
            let group = context
                .collection
                .groups
                .last_mut()
                .expect("a poll option is only parsed after a group");
            let skeleton = group
                .skeletons
                .last_mut()
                .expect("a poll option is only parsed after a poll");
            match skeleton {
                Skeleton::Choice { options, .. } => {
                    self.validate_option(&option, options.len() + 1)?;
                    options.push(option);
                }
                Skeleton::Money { .. } => {
                    unreachable!("money polls never reach the optional option state")
                }
            }
            return Ok(State::OptionalOption);
        }
        self.handle_group_or_poll(line, context)
            .map_err(|err| match err {
                PollError::Syntax { .. } => {
                    PollError::syntax("expected either poll option, group or poll")
                }
                other => other,
            })
    }

    fn push_skeleton(&self, context: &mut ParseContext, skeleton: Skeleton) -> PollResult<()> {
        let group = context
            .collection
            .groups
            .last_mut()
            .expect("a poll is only parsed after a group");
        group.skeletons.push(skeleton);
        context.num_skeletons += 1;
        if let Some(max_polls) = self.max_num_polls {
            if context.num_skeletons > max_polls {
                return Err(PollError::validation(format!(
                    "there are too many polls: only {} polls are allowed",
                    max_polls
                )));
            }
        }
        Ok(())
    }

    fn validate_option(&self, option: &str, num_options: usize) -> PollResult<()> {
        if let Some(max_option) = self.max_option_length {
            if option.len() > max_option {
                return Err(PollError::validation(format!(
                    "poll option is too long: got length {}, allowed max length is {}",
                    option.len(),
                    max_option
                )));
            }
        }
        if let Some(max_options) = self.max_num_options {
            if num_options > max_options {
                return Err(PollError::validation(format!(
                    "there are too many options in a poll: only {} options are allowed",
                    max_options
                )));
            }
        }
        Ok(())
    }

    fn validate_line(&self, line: &str, line_num: usize) -> PollResult<()> {
        if let Some(max_lines) = self.max_num_lines {
            if line_num > max_lines {
                return Err(PollError::validation(format!(
                    "there are too many lines: only {} lines are allowed in a polls file",
                    max_lines
                )));
            }
        }
        if let Some(max_len) = self.max_line_length {
            if line.len() > max_len {
                return Err(PollError::validation(format!(
                    "line is too long: got line of length {}, allowed max length is {}",
                    line.len(),
                    max_len
                )));
            }
        }
        Ok(())
    }
}

impl Default for OutlineParser {
    fn default() -> Self {
        OutlineParser::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weighted_voting::SimpleEuroHandler;

    fn parse(s: &str) -> PollResult<SkeletonCollection> {
        OutlineParser::new().parse(s, &SimpleEuroHandler::new())
    }

    const SAMPLE: &str = "\
# Assembly 2021

## Finance

### New server
- 500.00 €

## Elections

### Board
* ada
* grace
* No

### Accept minutes
* Yes
* No
";

    #[test]
    fn parses_the_sample_outline() {
        let coll = parse(SAMPLE).unwrap();
        assert_eq!(coll.title, "Assembly 2021");
        assert_eq!(coll.num_groups(), 2);
        assert_eq!(coll.num_skeletons(), 3);

        let skeletons = coll.collect_skeletons();
        match skeletons[0] {
            Skeleton::Money { name, value } => {
                assert_eq!(name, "New server");
                assert_eq!(value.value_cents, 50000);
            }
            other => panic!("expected money skeleton, got {:?}", other),
        }
        match skeletons[1] {
            Skeleton::Choice { name, options } => {
                assert_eq!(name, "Board");
                assert_eq!(options, &["ada", "grace", "No"]);
            }
            other => panic!("expected choice skeleton, got {:?}", other),
        }
        assert_eq!(skeletons[2].name(), "Accept minutes");
    }

    #[test]
    fn round_trips_through_dump() {
        let coll = parse(SAMPLE).unwrap();
        let mut out = Vec::new();
        coll.dump(&mut out, &SimpleEuroHandler::new()).unwrap();
        let dumped = String::from_utf8(out).unwrap();
        let again = parse(&dumped).unwrap();
        assert_eq!(again, coll);
    }

    #[test]
    fn rejects_structural_errors() {
        // no title
        assert!(parse("## group\n").is_err());
        // empty input never saw a title
        assert!(parse("").is_err());
        // poll without any option
        assert!(parse("# t\n## g\n### p\n").is_err());
        // choice poll with a single option
        let err = parse("# t\n## g\n### p\n* only\n").unwrap_err();
        assert!(matches!(err, PollError::Syntax { .. }));
        // option before any poll
        assert!(parse("# t\n## g\n* early\n").is_err());
        // money poll with a second money line
        assert!(parse("# t\n## g\n### p\n- 1 €\n- 2 €\n").is_err());
    }

    #[test]
    fn negative_money_is_a_semantic_error() {
        let err = parse("# t\n## g\n### p\n- -5 €\n").unwrap_err();
        assert!(matches!(err, PollError::Semantic { .. }));
    }

    #[test]
    fn syntax_errors_carry_the_line_number() {
        let err = parse("# t\n## g\nnot a poll\n").unwrap_err();
        assert_eq!(err.line(), Some(3));
    }

    #[test]
    fn limits_raise_validation_errors() {
        let mut parser = OutlineParser::new();
        parser.max_num_polls = Some(1);
        let err = parser.parse(SAMPLE, &SimpleEuroHandler::new()).unwrap_err();
        assert!(matches!(err, PollError::Validation { .. }));

        let mut parser = OutlineParser::new();
        parser.max_currency_cents = Some(10000);
        let err = parser.parse(SAMPLE, &SimpleEuroHandler::new()).unwrap_err();
        assert!(matches!(err, PollError::Validation { .. }));

        let mut parser = OutlineParser::new();
        parser.max_num_options = Some(2);
        let err = parser.parse(SAMPLE, &SimpleEuroHandler::new()).unwrap_err();
        assert!(matches!(err, PollError::Validation { .. }));

        let mut parser = OutlineParser::new();
        parser.max_line_length = Some(8);
        let err = parser.parse(SAMPLE, &SimpleEuroHandler::new()).unwrap_err();
        assert!(matches!(err, PollError::Validation { .. }));
    }
}
