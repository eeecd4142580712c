//! Flag declaration and parsing.
//!
//! A [`FlagSet`] collects typed flag declarations and parses a token sequence
//! against them. Parsing stops at the first positional token or at `--`;
//! everything after that is exposed through [`FlagSet::args`].
//!
//! Single-character names bind the short form (`-f`), longer names bind the
//! long form (`--force`). Values are given as `--name value`, `--name=value`,
//! `-n value` or `-n=value`. Boolean flags never consume the next token: use
//! `--force` or `--force=false`.
//!
//! `-h` and `--help` are always recognized unless a flag with that name is
//! declared, and surface as [`FlagError::HelpRequested`].

use std::collections::BTreeMap;
use std::fmt;

use clap::builder::BoolishValueParser;
use clap::{Arg, ArgAction, ColorChoice, value_parser};
use thiserror::Error;
use tracing::{debug, warn};

const ARGS_ID: &str = "__cmdroute_args";
const HELP_ID: &str = "__cmdroute_help";

/// Errors produced while parsing flags.
#[derive(Debug, Error)]
pub enum FlagError {
    /// `-h` or `--help` was given.
    #[error("help requested")]
    HelpRequested,

    /// The tokens do not match the declared flags.
    #[error("{message}")]
    Invalid {
        /// Name of the flag set that rejected the tokens.
        set: String,
        /// Human-readable reason.
        message: String,
    },
}

/// Kind of value a flag holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagKind {
    String,
    Bool,
    Int,
}

/// A flag value, either a default or one given on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlagValue {
    String(String),
    Bool(bool),
    Int(i64),
}

impl FlagValue {
    /// Kind of this value.
    pub fn kind(&self) -> FlagKind {
        match self {
            Self::String(_) => FlagKind::String,
            Self::Bool(_) => FlagKind::Bool,
            Self::Int(_) => FlagKind::Int,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for FlagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "{s}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
        }
    }
}

/// A declared flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flag {
    /// Flag name without dashes.
    pub name: String,
    /// One-line description shown in usage output.
    pub usage: String,
    /// Value used when the flag is not given.
    pub default: FlagValue,
}

impl Flag {
    /// Kind of value this flag accepts.
    pub fn kind(&self) -> FlagKind {
        self.default.kind()
    }

    /// Whether the flag is spelled with a single dash.
    pub fn is_short(&self) -> bool {
        self.name.chars().count() == 1
    }

    /// The flag as typed on the command line (`-f` or `--force`).
    pub fn display_name(&self) -> String {
        if self.is_short() {
            format!("-{}", self.name)
        } else {
            format!("--{}", self.name)
        }
    }
}

/// A named set of flag declarations plus the result of parsing against them.
#[derive(Debug, Clone, Default)]
pub struct FlagSet {
    name: String,
    flags: BTreeMap<String, Flag>,
    values: BTreeMap<String, FlagValue>,
    args: Vec<String>,
}

impl FlagSet {
    /// Create an empty flag set. The name is used in error messages.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Name of this flag set.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declare a string flag.
    pub fn string(&mut self, name: &str, default: &str, usage: &str) -> &mut Self {
        self.define(name, FlagValue::String(default.to_string()), usage)
    }

    /// Declare a boolean flag.
    pub fn bool(&mut self, name: &str, default: bool, usage: &str) -> &mut Self {
        self.define(name, FlagValue::Bool(default), usage)
    }

    /// Declare an integer flag.
    pub fn int(&mut self, name: &str, default: i64, usage: &str) -> &mut Self {
        self.define(name, FlagValue::Int(default), usage)
    }

    fn define(&mut self, name: &str, default: FlagValue, usage: &str) -> &mut Self {
        if name.is_empty() || name.starts_with('-') || name.contains('=') {
            warn!("Ignoring invalid flag name {:?} in flag set '{}'", name, self.name);
            return self;
        }
        if self.flags.contains_key(name) {
            warn!(
                "Flag '{}' redefined in flag set '{}', keeping the last declaration",
                name, self.name
            );
        }
        self.flags.insert(
            name.to_string(),
            Flag {
                name: name.to_string(),
                usage: usage.to_string(),
                default,
            },
        );
        self
    }

    /// Look up a declared flag.
    pub fn lookup(&self, name: &str) -> Option<&Flag> {
        self.flags.get(name)
    }

    /// Call `visit` for every declared flag, in lexicographic order.
    pub fn visit_all(&self, mut visit: impl FnMut(&Flag)) {
        for flag in self.flags.values() {
            visit(flag);
        }
    }

    /// Iterate over declared flags in lexicographic order.
    pub fn flags(&self) -> impl Iterator<Item = &Flag> {
        self.flags.values()
    }

    /// Number of declared flags.
    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    /// Parse `tokens` against the declared flags.
    ///
    /// On success the explicitly given values and the leftover positional
    /// arguments replace those of any previous parse.
    pub fn parse<S: AsRef<str>>(&mut self, tokens: &[S]) -> Result<(), FlagError> {
        let (command, has_help) = self.clap_command();
        let matches = command
            .try_get_matches_from(tokens.iter().map(|t| t.as_ref().to_string()))
            .map_err(|err| FlagError::Invalid {
                set: self.name.clone(),
                message: summarize(&err),
            })?;

        if has_help && matches.get_flag(HELP_ID) {
            return Err(FlagError::HelpRequested);
        }

        let mut values = BTreeMap::new();
        for flag in self.flags.values() {
            let id = flag.name.as_str();
            let value = match flag.kind() {
                FlagKind::String => matches
                    .get_one::<String>(id)
                    .map(|s| FlagValue::String(s.clone())),
                FlagKind::Bool => matches.get_one::<bool>(id).map(|b| FlagValue::Bool(*b)),
                FlagKind::Int => matches.get_one::<i64>(id).map(|n| FlagValue::Int(*n)),
            };
            if let Some(value) = value {
                values.insert(flag.name.clone(), value);
            }
        }

        self.values = values;
        self.args = matches
            .get_many::<String>(ARGS_ID)
            .map(|args| args.cloned().collect())
            .unwrap_or_default();

        debug!(
            "Parsed flag set '{}': {} flag(s) set, {} positional arg(s)",
            self.name,
            self.values.len(),
            self.args.len()
        );
        Ok(())
    }

    /// Positional arguments left over by the last parse.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Whether the flag was given on the command line (or inherited).
    pub fn is_set(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Effective value: the parsed one, else the declared default.
    pub fn value(&self, name: &str) -> Option<&FlagValue> {
        self.values
            .get(name)
            .or_else(|| self.flags.get(name).map(|flag| &flag.default))
    }

    pub fn get_string(&self, name: &str) -> Option<&str> {
        self.value(name).and_then(FlagValue::as_str)
    }

    /// Effective boolean value; `false` when the flag is not a declared bool.
    pub fn get_bool(&self, name: &str) -> bool {
        self.value(name).and_then(FlagValue::as_bool).unwrap_or(false)
    }

    pub fn get_int(&self, name: &str) -> Option<i64> {
        self.value(name).and_then(FlagValue::as_int)
    }

    /// Copy explicitly set values from `other` for flags that are declared
    /// here with the same kind and not set here.
    pub fn inherit_from(&mut self, other: &FlagSet) {
        for (name, value) in &other.values {
            let declared_same_kind = self
                .flags
                .get(name)
                .is_some_and(|flag| flag.kind() == value.kind());
            if declared_same_kind && !self.values.contains_key(name) {
                self.values.insert(name.clone(), value.clone());
            }
        }
    }

    fn clap_command(&self) -> (clap::Command, bool) {
        let mut command = clap::Command::new(self.name.clone())
            .no_binary_name(true)
            .disable_help_flag(true)
            .disable_version_flag(true)
            .args_override_self(true)
            .color(ColorChoice::Never);

        for flag in self.flags.values() {
            command = command.arg(clap_arg(flag));
        }

        let short_free = !self.flags.contains_key("h");
        let long_free = !self.flags.contains_key("help");
        let has_help = short_free || long_free;
        if has_help {
            let mut help = Arg::new(HELP_ID).action(ArgAction::SetTrue);
            if short_free {
                help = help.short('h');
            }
            if long_free {
                help = help.long("help");
            }
            command = command.arg(help);
        }

        let positional = Arg::new(ARGS_ID)
            .action(ArgAction::Append)
            .num_args(1..)
            .trailing_var_arg(true)
            .value_parser(value_parser!(String));

        (command.arg(positional), has_help)
    }
}

fn clap_arg(flag: &Flag) -> Arg {
    let arg = Arg::new(flag.name.clone());
    let mut chars = flag.name.chars();
    let arg = match (chars.next(), chars.next()) {
        (Some(short), None) => arg.short(short),
        _ => arg.long(flag.name.clone()),
    };

    match flag.kind() {
        FlagKind::Bool => arg
            .action(ArgAction::Set)
            .num_args(0..=1)
            .require_equals(true)
            .default_missing_value("true")
            .value_parser(BoolishValueParser::new()),
        FlagKind::String => arg
            .action(ArgAction::Set)
            .allow_hyphen_values(true)
            .value_parser(value_parser!(String)),
        FlagKind::Int => arg
            .action(ArgAction::Set)
            .allow_hyphen_values(true)
            .value_parser(value_parser!(i64)),
    }
}

/// First line of a clap error, without the `error: ` prefix.
fn summarize(err: &clap::Error) -> String {
    let rendered = err.to_string();
    let first = rendered.lines().next().unwrap_or_default().trim();
    first.strip_prefix("error: ").unwrap_or(first).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FlagSet {
        let mut flags = FlagSet::new("sample");
        flags
            .bool("force", false, "overwrite existing files")
            .string("name", "origin", "remote name")
            .int("n", 1, "repeat count");
        flags
    }

    #[test]
    fn test_defaults_without_tokens() {
        let mut flags = sample();
        flags.parse::<&str>(&[]).unwrap();

        assert!(!flags.get_bool("force"));
        assert_eq!(flags.get_string("name"), Some("origin"));
        assert_eq!(flags.get_int("n"), Some(1));
        assert!(!flags.is_set("name"));
        assert!(flags.args().is_empty());
    }

    #[test]
    fn test_long_and_short_values() {
        let mut flags = sample();
        flags
            .parse(&["--force", "--name=upstream", "-n", "3", "file.txt"])
            .unwrap();

        assert!(flags.get_bool("force"));
        assert_eq!(flags.get_string("name"), Some("upstream"));
        assert_eq!(flags.get_int("n"), Some(3));
        assert_eq!(flags.args(), ["file.txt"]);
    }

    #[test]
    fn test_bool_does_not_consume_next_token() {
        let mut flags = sample();
        flags.parse(&["--force", "false"]).unwrap();

        assert!(flags.get_bool("force"));
        assert_eq!(flags.args(), ["false"]);

        flags.parse(&["--force=false"]).unwrap();
        assert!(!flags.get_bool("force"));
        assert!(flags.is_set("force"));
    }

    #[test]
    fn test_parsing_stops_at_first_positional() {
        let mut flags = sample();
        flags.parse(&["one", "--force", "-n", "2"]).unwrap();

        assert!(!flags.get_bool("force"));
        assert_eq!(flags.args(), ["one", "--force", "-n", "2"]);
    }

    #[test]
    fn test_double_dash_ends_flags() {
        let mut flags = sample();
        flags.parse(&["--", "--force"]).unwrap();

        assert!(!flags.get_bool("force"));
        assert_eq!(flags.args(), ["--force"]);
    }

    #[test]
    fn test_unknown_flag_is_invalid() {
        let mut flags = sample();
        let err = flags.parse(&["--bogus"]).unwrap_err();

        match err {
            FlagError::Invalid { set, message } => {
                assert_eq!(set, "sample");
                assert!(message.contains("--bogus"), "message: {message}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_bad_int_value_is_invalid() {
        let mut flags = sample();
        let err = flags.parse(&["-n", "many"]).unwrap_err();
        assert!(matches!(err, FlagError::Invalid { .. }));
    }

    #[test]
    fn test_help_flags() {
        let mut flags = sample();
        assert!(matches!(
            flags.parse(&["-h"]),
            Err(FlagError::HelpRequested)
        ));
        assert!(matches!(
            flags.parse(&["--force", "--help"]),
            Err(FlagError::HelpRequested)
        ));
    }

    #[test]
    fn test_declared_h_shadows_short_help() {
        let mut flags = FlagSet::new("host");
        flags.string("h", "localhost", "host name");

        flags.parse(&["-h", "example.org"]).unwrap();
        assert_eq!(flags.get_string("h"), Some("example.org"));

        assert!(matches!(
            flags.parse(&["--help"]),
            Err(FlagError::HelpRequested)
        ));
    }

    #[test]
    fn test_last_occurrence_wins() {
        let mut flags = sample();
        flags.parse(&["--name", "a", "--name", "b"]).unwrap();
        assert_eq!(flags.get_string("name"), Some("b"));
    }

    #[test]
    fn test_string_value_may_start_with_dash() {
        let mut flags = sample();
        flags.parse(&["--name", "-weird-"]).unwrap();
        assert_eq!(flags.get_string("name"), Some("-weird-"));
    }

    #[test]
    fn test_visit_all_is_sorted() {
        let flags = sample();
        let mut names = Vec::new();
        flags.visit_all(|flag| names.push(flag.display_name()));
        assert_eq!(names, vec!["--force", "-n", "--name"]);
    }

    #[test]
    fn test_redefinition_keeps_last() {
        let mut flags = FlagSet::new("dup");
        flags.bool("force", false, "first").bool("force", true, "second");

        assert_eq!(flags.len(), 1);
        assert_eq!(flags.lookup("force").map(|f| f.usage.as_str()), Some("second"));
        assert!(flags.get_bool("force"));
    }

    #[test]
    fn test_invalid_names_are_ignored() {
        let mut flags = FlagSet::new("bad");
        flags.bool("", false, "empty").bool("--x", false, "dashed");
        assert!(flags.is_empty());
    }

    #[test]
    fn test_inherit_from_only_fills_unset_same_kind() {
        let mut global = FlagSet::new("global");
        global.bool("force", false, "").string("name", "", "");
        global.parse(&["--force", "--name", "upstream"]).unwrap();

        let mut local = FlagSet::new("local");
        local.bool("force", false, "").int("name", 0, "");
        local.parse::<&str>(&[]).unwrap();
        local.inherit_from(&global);

        assert!(local.get_bool("force"));
        assert_eq!(local.get_int("name"), Some(0));
        assert!(!local.is_set("name"));
    }

    #[test]
    fn test_getters_on_wrong_kind() {
        let flags = sample();
        assert_eq!(flags.get_string("force"), None);
        assert!(!flags.get_bool("name"));
        assert_eq!(flags.get_int("missing"), None);
    }
}
