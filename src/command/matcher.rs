//! Two-stage command matching.
//!
//! Stage one tests the keyword against the message body (the text after the
//! tenant indicator) and captures everything after it. Stage two, when the
//! command declares a parameter pattern, tests that pattern against the
//! captured rest. A keyword hit with a parameter miss is a
//! [`MatchOutcome::ParameterError`], not a miss.

use crate::error::HandlerError;
use regex::Regex;
use std::collections::HashMap;
use std::str::FromStr;

/// Arguments captured from a matched command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandArgs {
    rest: String,
    named: HashMap<String, String>,
}

impl CommandArgs {
    pub fn new(rest: impl Into<String>) -> Self {
        Self {
            rest: rest.into(),
            named: HashMap::new(),
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.named.insert(name.into(), value.into());
        self
    }

    /// Text after the keyword, untrimmed.
    pub fn rest(&self) -> &str {
        &self.rest
    }

    /// A named capture, `None` if the group did not participate.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.named.get(name).map(String::as_str)
    }

    /// A named capture that must be present.
    pub fn require(&self, name: &str) -> Result<&str, HandlerError> {
        self.get(name)
            .ok_or_else(|| HandlerError::InvalidArgument(format!("Missing `{}`.", name)))
    }

    /// Parse a named capture, reporting a user-facing error on failure.
    pub fn parse<T: FromStr>(&self, name: &str) -> Result<T, HandlerError> {
        let raw = self.require(name)?;
        raw.parse()
            .map_err(|_| HandlerError::InvalidArgument(format!("`{}` is not a valid {}.", raw, name)))
    }
}

/// Result of testing one command against a message body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    /// The keyword did not match; try the next command.
    Unhandled,
    /// Keyword and parameters matched.
    Handled(CommandArgs),
    /// The keyword matched but the parameters did not.
    ParameterError,
}

/// Compiled keyword and parameter expressions of one command.
#[derive(Debug, Clone)]
pub struct Matcher {
    keyword: Regex,
    params: Option<Regex>,
}

impl Matcher {
    /// Compile the two stages. The keyword is matched literally and
    /// case-sensitively and the rest may not span lines; the parameter
    /// pattern must match the whole rest, surrounding whitespace aside.
    pub fn new(keyword: &str, params: Option<&str>) -> Result<Self, regex::Error> {
        let keyword = Regex::new(&format!(
            r"^{}(?P<rest>.*)$",
            regex::escape(keyword)
        ))?;
        let params = params
            .map(|pattern| Regex::new(&format!(r"^\s*(?:{})\s*$", pattern)))
            .transpose()?;
        Ok(Self { keyword, params })
    }

    pub fn takes_params(&self) -> bool {
        self.params.is_some()
    }

    /// Named capture groups of the parameter pattern, in pattern order.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.params
            .iter()
            .flat_map(|re| re.capture_names().flatten())
    }

    /// Test `body`, the message text with the indicator already removed.
    pub fn try_match(&self, body: &str) -> MatchOutcome {
        let Some(caps) = self.keyword.captures(body) else {
            return MatchOutcome::Unhandled;
        };
        let rest = caps.name("rest").map_or("", |m| m.as_str());

        let Some(params) = &self.params else {
            return MatchOutcome::Handled(CommandArgs::new(rest));
        };

        let Some(param_caps) = params.captures(rest) else {
            return MatchOutcome::ParameterError;
        };

        let mut args = CommandArgs::new(rest);
        for name in params.capture_names().flatten() {
            if let Some(value) = param_caps.name(name) {
                args.named.insert(name.to_string(), value.as_str().to_string());
            }
        }
        MatchOutcome::Handled(args)
    }
}
