use lazy_static::lazy_static;
use regex::Regex;
use run_types::Lanes;
use thiserror::Error;

lazy_static! {
    static ref LANE_RANGE: Regex = Regex::new(r"^([1-9][0-9]*)(?:-([1-9][0-9]*))?$").unwrap();
}

/// Highest lane number accepted in a lane list.
pub const MAX_LANE: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LaneParseError {
    #[error("invalid lane '{0}': expected a lane number or a range such as 1-4")]
    Invalid(String),
    #[error("invalid lane range '{0}': the first lane is after the last")]
    Reversed(String),
    #[error("invalid lane '{0}': lanes above {max} are not supported", max = MAX_LANE)]
    OutOfRange(String),
}

fn parse_item(item: &str) -> Result<Vec<usize>, LaneParseError> {
    let cap = LANE_RANGE
        .captures(item)
        .ok_or_else(|| LaneParseError::Invalid(item.to_string()))?;
    let bound = |i: usize| -> Result<Option<usize>, LaneParseError> {
        cap.get(i)
            .map(|m| m.as_str().parse::<usize>())
            .transpose()
            .map_err(|_| LaneParseError::Invalid(item.to_string()))
    };
    let Some(start) = bound(1)? else {
        return Err(LaneParseError::Invalid(item.to_string()));
    };
    let end = bound(2)?.unwrap_or(start);
    if end < start {
        return Err(LaneParseError::Reversed(item.to_string()));
    }
    if end > MAX_LANE {
        return Err(LaneParseError::OutOfRange(item.to_string()));
    }
    Ok((start..=end).collect())
}

/// Parse a lane list such as `1|2`, `1,3-4` or `all`. Blank, `all` and `any`
/// mean every lane of the flowcell.
pub fn parse_lanes(text: &str) -> Result<Lanes, LaneParseError> {
    let text = text.trim();
    if text.is_empty() || text.eq_ignore_ascii_case("all") || text.eq_ignore_ascii_case("any") {
        return Ok(Lanes::Any);
    }
    let mut lanes = Vec::new();
    for item in text
        .split(|c: char| c == '|' || c == ',' || c == ';' || c.is_whitespace())
        .filter(|item| !item.is_empty())
    {
        lanes.extend(parse_item(item)?);
    }
    Ok(Lanes::from(lanes.as_slice()))
}
