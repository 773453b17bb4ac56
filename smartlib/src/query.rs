use core::fmt::{Display, Formatter};
use picoserve::url_encoded::UrlEncodedString;

const ON_KEY: &str = "on";
/// Longest decoded key or value that can still match anything we look for
const MAX_DECODED_LEN: usize = 8;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum QueryError {
    /// The request did not carry an `on` parameter at all
    MissingOn,
}

impl QueryError {
    /// Plain text body sent back with the 400 response
    pub const fn message(self) -> &'static str {
        match self {
            QueryError::MissingOn => "Missing 'on' query param",
        }
    }
}

impl Display for QueryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.message())
    }
}

/// Extracts the requested switch level from a url-encoded query string such as `on=1&x=y`.
/// Keys and values are decoded before matching.
/// Only `1`, `true` and `on` switch on; any other value, including an empty one, switches off.
pub fn parse_on(query: &str) -> Result<bool, QueryError> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| pair.split_once('=').unwrap_or((pair, "")))
        .find(|(key, _)| decode(key).is_some_and(|key| key == ON_KEY))
        .map(|(_, value)| decode(value).is_some_and(|value| is_truthy(&value)))
        .ok_or(QueryError::MissingOn)
}

/// `None` if `raw` is not valid url encoding or too long to match
fn decode(raw: &str) -> Option<heapless::String<MAX_DECODED_LEN>> {
    UrlEncodedString(raw).try_into_string().ok()
}

fn is_truthy(value: &str) -> bool {
    matches!(value, "1" | "true" | "on")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepted_on_values() {
        assert_eq!(parse_on("on=1"), Ok(true));
        assert_eq!(parse_on("on=true"), Ok(true));
        assert_eq!(parse_on("on=on"), Ok(true));
    }

    #[test]
    fn everything_else_is_off() {
        assert_eq!(parse_on("on=0"), Ok(false));
        assert_eq!(parse_on("on=false"), Ok(false));
        assert_eq!(parse_on("on=TRUE"), Ok(false));
        assert_eq!(parse_on("on=yes"), Ok(false));
        assert_eq!(parse_on("on="), Ok(false));
        assert_eq!(parse_on("on"), Ok(false));
    }

    #[test]
    fn missing_parameter() {
        assert_eq!(parse_on(""), Err(QueryError::MissingOn));
        assert_eq!(parse_on("off=1"), Err(QueryError::MissingOn));
        assert_eq!(parse_on("onn=1&x=on"), Err(QueryError::MissingOn));
    }

    #[test]
    fn other_parameters_are_ignored() {
        assert_eq!(parse_on("t=123&on=1"), Ok(true));
        assert_eq!(parse_on("on=1&on=0"), Ok(true));
    }

    #[test]
    fn percent_encoded_values_are_decoded() {
        assert_eq!(parse_on("on=tru%65"), Ok(true));
        assert_eq!(parse_on("on=%31"), Ok(true));
        assert_eq!(parse_on("on=%6F%6E"), Ok(true));
        assert_eq!(parse_on("on=%30"), Ok(false));
    }

    #[test]
    fn percent_encoded_keys_are_decoded() {
        assert_eq!(parse_on("o%6E=1"), Ok(true));
        assert_eq!(parse_on("x=1&%6f%6e=true"), Ok(true));
        assert_eq!(parse_on("o%6E"), Ok(false));
    }

    #[test]
    fn malformed_encoding_does_not_match() {
        assert_eq!(parse_on("on=tru%6"), Ok(false));
        assert_eq!(parse_on("o%zz=1"), Err(QueryError::MissingOn));
        assert_eq!(parse_on("on=a-very-long-value"), Ok(false));
    }

    #[test]
    fn error_message_matches_response_body() {
        assert_eq!(QueryError::MissingOn.to_string(), "Missing 'on' query param");
    }
}
