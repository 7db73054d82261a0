//! `teleport` directive parsing.
//!
//! # Grammar
//! ```text
//! teleport <station> [ knock <url> [<count>] ]
//! ```
//!
//! # Design Decisions
//! - The first token is always the station identifier
//! - Remaining tokens form runs of up to three: a directive name plus up to
//!   two positional arguments. A recognized directive always opens a new run.
//! - Unknown directives are skipped (logged at warn), matching the host
//!   configuration language where unknown directives are no-ops
//! - Parsing has no side effects; the knock is scheduled at provisioning

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Keyword that may prefix the directive text.
pub const DIRECTIVE_NAME: &str = "teleport";

const KNOCK: &str = "knock";
const MAX_RUN: usize = 3;
const DEFAULT_KNOCK_COUNT: u32 = 1;

/// Errors raised while parsing a `teleport` directive.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DirectiveError {
    /// No station token was given.
    #[error("teleport directive requires a station")]
    MissingStation,

    /// `knock` appeared without its URL argument.
    #[error("knock requires a URL argument")]
    MissingKnockUrl,

    /// The knock URL is not an absolute http(s) URL.
    #[error("invalid knock URL {url:?}: {reason}")]
    InvalidKnockUrl { url: String, reason: String },
}

/// Knock settings: where to probe and how many times.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnockConfig {
    pub url: String,
    pub count: u32,
}

/// Parsed station configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StationConfig {
    /// Tunnel endpoint name/address.
    pub station: String,

    /// Optional knock sequence sent at provisioning.
    pub knock: Option<KnockConfig>,
}

impl StationConfig {
    /// Build a config from an already tokenized stream (station first).
    pub fn from_tokens<S: AsRef<str>>(tokens: &[S]) -> Result<Self, DirectiveError> {
        let (station, rest) = tokens.split_first().ok_or(DirectiveError::MissingStation)?;

        let mut config = Self {
            station: station.as_ref().to_string(),
            knock: None,
        };

        for run in runs(rest) {
            config.apply(run)?;
        }

        Ok(config)
    }

    pub fn knock_url(&self) -> Option<&str> {
        self.knock.as_ref().map(|k| k.url.as_str())
    }

    pub fn knock_count(&self) -> u32 {
        self.knock
            .as_ref()
            .map(|k| k.count)
            .unwrap_or(DEFAULT_KNOCK_COUNT)
    }

    fn apply<S: AsRef<str>>(&mut self, run: &[S]) -> Result<(), DirectiveError> {
        let Some((name, args)) = run.split_first() else {
            return Ok(());
        };

        match name.as_ref() {
            KNOCK => {
                let url = args
                    .first()
                    .map(|u| u.as_ref())
                    .ok_or(DirectiveError::MissingKnockUrl)?;
                validate_knock_url(url)?;

                let count = args
                    .get(1)
                    .map(|c| parse_count(c.as_ref()))
                    .unwrap_or(DEFAULT_KNOCK_COUNT);

                self.knock = Some(KnockConfig {
                    url: url.to_string(),
                    count,
                });
            }
            other => {
                tracing::warn!(
                    directive = %other,
                    args = args.len(),
                    station = %self.station,
                    "Ignoring unrecognized teleport directive"
                );
            }
        }

        Ok(())
    }
}

impl std::str::FromStr for StationConfig {
    type Err = DirectiveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_directive(s)
    }
}

/// Parse directive text, with or without the leading `teleport` keyword.
///
/// A leading `teleport` is the keyword only when a station token follows
/// it; otherwise it is the station itself (`teleport knock http://x` names
/// the station `teleport`).
pub fn parse_directive(text: &str) -> Result<StationConfig, DirectiveError> {
    let tokens = tokenize(text);
    let tokens = match tokens.split_first() {
        Some((first, rest))
            if first == DIRECTIVE_NAME && rest.first().is_some_and(|next| !is_directive(next)) =>
        {
            rest
        }
        _ => &tokens[..],
    };
    StationConfig::from_tokens(tokens)
}

/// Split directive text into whitespace/line delimited tokens.
/// `#` starts a comment that runs to the end of the line.
pub fn tokenize(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| line.split('#').next().unwrap_or_default())
        .flat_map(str::split_whitespace)
        .map(str::to_string)
        .collect()
}

fn is_directive(token: &str) -> bool {
    token == KNOCK
}

fn runs<S: AsRef<str>>(tokens: &[S]) -> Vec<&[S]> {
    let mut runs = Vec::new();
    let mut start = 0;

    for (i, token) in tokens.iter().enumerate() {
        if i > start && (i - start == MAX_RUN || is_directive(token.as_ref())) {
            runs.push(&tokens[start..i]);
            start = i;
        }
    }
    if start < tokens.len() {
        runs.push(&tokens[start..]);
    }

    runs
}

/// Zero, negative and unparsable counts all fall back to one probe.
fn parse_count(raw: &str) -> u32 {
    raw.parse::<i64>()
        .ok()
        .filter(|n| *n > 0)
        .map(|n| u32::try_from(n).unwrap_or(u32::MAX))
        .unwrap_or(DEFAULT_KNOCK_COUNT)
}

fn validate_knock_url(raw: &str) -> Result<(), DirectiveError> {
    let invalid = |reason: String| DirectiveError::InvalidKnockUrl {
        url: raw.to_string(),
        reason,
    };

    let url = url::Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(invalid(format!("unsupported scheme {other:?}"))),
    }
}
