//! Parsing of identifier lists such as `1-5,8 12`.

use std::collections::BTreeSet;

use thiserror::Error;

use super::types::Identifier;

/// Longest range accepted in a single token.
pub const DEFAULT_MAX_RANGE_LEN: u32 = 10_000;

/// Errors produced while parsing identifiers.
///
/// Each error is scoped to the single token that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    /// The token is not a positive integer or a valid range.
    #[error("invalid identifier '{token}': {reason}")]
    InvalidIdentifier { token: String, reason: String },
}

impl IdentifierError {
    fn invalid(token: &str, reason: impl Into<String>) -> Self {
        Self::InvalidIdentifier {
            token: token.to_string(),
            reason: reason.into(),
        }
    }

    /// The offending input token.
    pub fn token(&self) -> &str {
        match self {
            Self::InvalidIdentifier { token, .. } => token,
        }
    }
}

/// Result of parsing user input into identifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedIdentifiers {
    /// Valid identifiers, ascending and duplicate-free.
    pub identifiers: Vec<Identifier>,
    /// Tokens that were rejected.
    pub rejected: Vec<IdentifierError>,
}

impl ParsedIdentifiers {
    pub fn is_empty(&self) -> bool {
        self.identifiers.is_empty()
    }
}

/// Parses a single identifier token.
pub fn parse_identifier(token: &str) -> Result<Identifier, IdentifierError> {
    let value: i64 = token
        .parse()
        .map_err(|_| IdentifierError::invalid(token, "not a number"))?;
    if value <= 0 {
        return Err(IdentifierError::invalid(token, "must be positive"));
    }
    Identifier::try_from(value).map_err(|_| IdentifierError::invalid(token, "out of range"))
}

/// Parses identifier inputs.
///
/// Every input may hold several tokens separated by commas or whitespace.
/// A token is either a number (`12`) or an inclusive range (`10-20`).
/// Invalid tokens are collected in [`ParsedIdentifiers::rejected`] and do not
/// affect the remaining tokens.
pub fn parse_identifiers<I, S>(inputs: I, max_range_len: u32) -> ParsedIdentifiers
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut identifiers = BTreeSet::new();
    let mut rejected = Vec::new();

    for input in inputs {
        let tokens = input
            .as_ref()
            .split(|c: char| c == ',' || c.is_whitespace())
            .map(str::trim)
            .filter(|t| !t.is_empty());

        for token in tokens {
            match parse_token(token, max_range_len) {
                Ok((start, end)) => identifiers.extend(start..=end),
                Err(e) => rejected.push(e),
            }
        }
    }

    ParsedIdentifiers {
        identifiers: identifiers.into_iter().collect(),
        rejected,
    }
}

fn parse_token(token: &str, max_range_len: u32) -> Result<(Identifier, Identifier), IdentifierError> {
    // A leading '-' is a negative number, not a range.
    let range = token
        .split_once('-')
        .filter(|(start, _)| !start.is_empty());

    let Some((start, end)) = range else {
        let id = parse_identifier(token)?;
        return Ok((id, id));
    };

    let start = parse_identifier(start.trim())
        .map_err(|e| IdentifierError::invalid(token, format!("range start {}", reason_of(&e))))?;
    let end = parse_identifier(end.trim())
        .map_err(|e| IdentifierError::invalid(token, format!("range end {}", reason_of(&e))))?;

    if start > end {
        return Err(IdentifierError::invalid(token, "range start exceeds end"));
    }
    if end - start >= max_range_len {
        return Err(IdentifierError::invalid(
            token,
            format!("range longer than {} identifiers", max_range_len),
        ));
    }

    Ok((start, end))
}

fn reason_of(error: &IdentifierError) -> &str {
    match error {
        IdentifierError::InvalidIdentifier { reason, .. } => reason,
    }
}
