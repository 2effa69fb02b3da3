//! Ordered command list of one extension.

use super::definition::{Command, CommandDef};
use super::matcher::{CommandArgs, MatchOutcome, Matcher};
use crate::error::RegistrationError;
use crate::permission::PermissionLevel;
use crate::tenant::TenantState;
use std::collections::HashSet;

/// Result of scanning the command list for a message body.
pub enum Scan<'a, S> {
    /// A command matched; run it with `args`.
    Handled {
        command: &'a Command<S>,
        args: CommandArgs,
    },
    /// A command's keyword matched but its parameters did not. The scan
    /// stopped here.
    ParameterError(&'a Command<S>),
    /// No command visible at the caller's level claimed the message.
    Unhandled,
}

/// Commands of one extension, sorted most specific first.
pub struct CommandSet<S> {
    commands: Vec<Command<S>>,
}

fn validate_keyword(keyword: &str) -> Result<(), RegistrationError> {
    let invalid = keyword.is_empty()
        || keyword.trim() != keyword
        || keyword.chars().any(char::is_control);
    if invalid {
        return Err(RegistrationError::InvalidKeyword(keyword.to_string()));
    }
    Ok(())
}

impl<S: TenantState> CommandSet<S> {
    /// Compile and order a list of definitions.
    ///
    /// Longer keywords (by character count) come first; at equal length,
    /// commands with a parameter pattern precede those without. Commands
    /// equal on both keys keep their declaration order.
    pub fn register(defs: Vec<CommandDef<S>>) -> Result<Self, RegistrationError> {
        let mut seen = HashSet::with_capacity(defs.len());
        let mut commands = Vec::with_capacity(defs.len());

        for def in defs {
            validate_keyword(&def.keyword)?;
            if !seen.insert(def.keyword.clone()) {
                return Err(RegistrationError::DuplicateKeyword(def.keyword));
            }
            let matcher = Matcher::new(&def.keyword, def.params.as_deref()).map_err(|source| {
                RegistrationError::InvalidPattern {
                    keyword: def.keyword.clone(),
                    source,
                }
            })?;
            commands.push(Command::new(def, matcher));
        }

        commands.sort_by_key(|cmd| {
            (
                std::cmp::Reverse(cmd.keyword().chars().count()),
                !cmd.takes_params(),
            )
        });

        Ok(Self { commands })
    }

    /// Find the command that claims `body` for a caller at `level`.
    ///
    /// Commands above the caller's level are skipped as if absent, so a
    /// restricted command and an unknown one look the same to the caller.
    pub fn scan(&self, body: &str, level: PermissionLevel) -> Scan<'_, S> {
        for command in self.visible(level) {
            match command.matcher().try_match(body) {
                MatchOutcome::Unhandled => continue,
                MatchOutcome::Handled(args) => return Scan::Handled { command, args },
                MatchOutcome::ParameterError => return Scan::ParameterError(command),
            }
        }
        Scan::Unhandled
    }

    /// Commands a caller at `level` may use, in scan order.
    pub fn visible(&self, level: PermissionLevel) -> impl Iterator<Item = &Command<S>> {
        self.commands.iter().filter(move |cmd| cmd.level() <= level)
    }

    pub fn get(&self, keyword: &str) -> Option<&Command<S>> {
        self.commands.iter().find(|cmd| cmd.keyword() == keyword)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Command<S>> {
        self.commands.iter()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandHandler;
    use crate::error::HandlerResult;
    use crate::extension::CommandContext;
    use async_trait::async_trait;

    struct Noop;

    #[async_trait]
    impl CommandHandler<()> for Noop {
        async fn handle(&self, _ctx: &CommandContext<'_, ()>) -> HandlerResult {
            Ok(())
        }
    }

    fn def(keyword: &str) -> CommandDef<()> {
        CommandDef::new(keyword, Noop)
    }

    fn keywords(set: &CommandSet<()>) -> Vec<&str> {
        set.iter().map(|c| c.keyword()).collect()
    }

    fn handled_keyword<'a>(scan: Scan<'a, ()>) -> Option<&'a str> {
        match scan {
            Scan::Handled { command, .. } => Some(command.keyword()),
            _ => None,
        }
    }

    #[test]
    fn longer_keywords_first_then_parameterised() {
        let set = CommandSet::register(vec![
            def("set"),
            def("sets").params(r"\d+"),
            def("set emoji points").params(r"(?P<emoji>\S+)\s+(?P<points>-?\d+)"),
            def("abcd"),
            def("set points").params(r"\d+"),
        ])
        .unwrap();
        assert_eq!(
            keywords(&set),
            vec!["set emoji points", "set points", "sets", "abcd", "set"]
        );
    }

    #[test]
    fn equal_keys_keep_declaration_order() {
        let set = CommandSet::register(vec![def("bbb"), def("aaa"), def("ccc")]).unwrap();
        assert_eq!(keywords(&set), vec!["bbb", "aaa", "ccc"]);
    }

    #[test]
    fn ordering_holds_for_any_declaration_order() {
        let words = ["a", "ab", "abc", "b", "bc", "set", "set x", "xyz"];
        for rotation in 0..words.len() {
            let mut defs = Vec::new();
            for (i, word) in words.iter().cycle().skip(rotation).take(words.len()).enumerate() {
                let d = def(word);
                defs.push(if i % 2 == 0 { d.params(r"\w*") } else { d });
            }
            let set = CommandSet::register(defs).unwrap();
            let cmds: Vec<_> = set.iter().collect();
            for pair in cmds.windows(2) {
                let (a, b) = (pair[0], pair[1]);
                let (la, lb) = (a.keyword().chars().count(), b.keyword().chars().count());
                assert!(la >= lb, "{} before {}", a.keyword(), b.keyword());
                if la == lb {
                    assert!(a.takes_params() || !b.takes_params());
                }
            }
        }
    }

    #[test]
    fn keyword_length_counts_characters() {
        let set = CommandSet::register(vec![def("abcd"), def("ñññ")]).unwrap();
        assert_eq!(keywords(&set), vec!["abcd", "ñññ"]);
    }

    #[test]
    fn duplicate_keyword_is_rejected() {
        let err = CommandSet::register(vec![def("help"), def("help").params(r"\d+")])
            .err()
            .unwrap();
        assert!(matches!(err, RegistrationError::DuplicateKeyword(k) if k == "help"));
    }

    #[test]
    fn bad_keywords_are_rejected() {
        for bad in ["", " help", "help ", "he\nlp"] {
            let err = CommandSet::register(vec![def(bad)]).err().unwrap();
            assert!(matches!(err, RegistrationError::InvalidKeyword(_)), "{:?}", bad);
        }
    }

    #[test]
    fn bad_pattern_is_rejected() {
        let err = CommandSet::register(vec![def("give").params("(unclosed")])
            .err()
            .unwrap();
        assert!(matches!(err, RegistrationError::InvalidPattern { keyword, .. } if keyword == "give"));
    }

    #[test]
    fn most_specific_command_wins() {
        let set = CommandSet::register(vec![
            def("set"),
            def("set emoji points").params(r"(?P<emoji>\S+)\s+(?P<points>-?\d+)"),
        ])
        .unwrap();
        let scan = set.scan("set emoji points :x: 5", PermissionLevel::Owner);
        assert_eq!(handled_keyword(scan), Some("set emoji points"));
        assert_eq!(
            handled_keyword(set.scan("set", PermissionLevel::Owner)),
            Some("set")
        );
    }

    #[test]
    fn parameter_error_stops_the_scan() {
        let set = CommandSet::register(vec![def("count").params(r"(?P<n>\d+)"), def("c")]).unwrap();
        match set.scan("count abc", PermissionLevel::Unrestricted) {
            Scan::ParameterError(cmd) => assert_eq!(cmd.keyword(), "count"),
            _ => panic!("expected a parameter error"),
        }
    }

    #[test]
    fn restricted_commands_are_invisible() {
        let set = CommandSet::register(vec![
            def("purge").params(r"\d+").level(PermissionLevel::Admin),
            def("p"),
        ])
        .unwrap();
        // Without the level, "purge x" falls through to the shorter command.
        assert_eq!(
            handled_keyword(set.scan("purge x", PermissionLevel::Unrestricted)),
            Some("p")
        );
        assert!(matches!(
            set.scan("purge x", PermissionLevel::Admin),
            Scan::ParameterError(_)
        ));
        assert_eq!(set.visible(PermissionLevel::Unrestricted).count(), 1);
        assert_eq!(set.visible(PermissionLevel::Owner).count(), 2);
    }

    #[test]
    fn nothing_matches() {
        let set = CommandSet::register(vec![def("points")]).unwrap();
        assert!(matches!(
            set.scan("leaderboard", PermissionLevel::Owner),
            Scan::Unhandled
        ));
    }

    #[test]
    fn usage_hint_falls_back_to_group_names() {
        let set = CommandSet::register(vec![
            def("set emoji points").params(r"(?P<emoji>\S+)\s+(?P<points>-?\d+)"),
            def("purge").params(r"(?P<count>\d+)").usage("<how many>"),
            def("help"),
        ])
        .unwrap();
        assert_eq!(
            set.get("set emoji points").unwrap().usage_hint('!'),
            "Usage: `!set emoji points <emoji> <points>`"
        );
        assert_eq!(
            set.get("purge").unwrap().usage_hint('~'),
            "Usage: `~purge <how many>`"
        );
        assert_eq!(set.get("help").unwrap().usage_hint('!'), "Usage: `!help`");
    }
}
