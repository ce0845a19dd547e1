//! Feed credentials.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Credentials needed to open the call feed and fetch recordings.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Feed access token.
    pub token: String,
    /// Feed user identifier.
    pub user: String,
    /// Browser cookie string (`name=value; name2=value2`).
    pub cookie: String,
}

impl Credentials {
    /// Create a credential set, trimming surrounding whitespace.
    #[must_use]
    pub fn new(token: impl Into<String>, user: impl Into<String>, cookie: impl Into<String>) -> Self {
        Self {
            token: token.into().trim().to_string(),
            user: user.into().trim().to_string(),
            cookie: cookie.into().trim().to_string(),
        }
    }

    /// Returns true when every field is non-empty.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.token.is_empty() && !self.user.is_empty() && !self.cookie.is_empty()
    }

    /// Parse the cookie string into name/value pairs.
    ///
    /// Pairs are separated by `"; "` and split on the first `=`. Entries
    /// without `=` are ignored.
    #[must_use]
    pub fn cookie_pairs(&self) -> Vec<CookiePair> {
        parse_cookie_string(&self.cookie)
    }

    /// Cookie pairs re-joined into a `Cookie` header value.
    #[must_use]
    pub fn cookie_header(&self) -> String {
        self.cookie_pairs()
            .iter()
            .map(|pair| format!("{}={}", pair.name, pair.value))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"<redacted>")
            .field("user", &self.user)
            .field("cookie", &format_args!("<{} cookies>", self.cookie_pairs().len()))
            .finish()
    }
}

/// One cookie from a cookie string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookiePair {
    /// Cookie name.
    pub name: String,
    /// Cookie value.
    pub value: String,
}

fn parse_cookie_string(raw: &str) -> Vec<CookiePair> {
    raw.split("; ")
        .filter_map(|pair| {
            let (name, value) = pair.split_once('=')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some(CookiePair {
                name: name.to_string(),
                value: value.trim().to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cookie_pairs_split_on_first_equals() {
        let creds = Credentials::new("t", "u", "session=abc=def; theme = dark; broken; x=");
        let pairs = creds.cookie_pairs();
        assert_eq!(pairs.len(), 3);
        assert_eq!(pairs[0].name, "session");
        assert_eq!(pairs[0].value, "abc=def");
        assert_eq!(pairs[1].name, "theme");
        assert_eq!(pairs[1].value, "dark");
        assert_eq!(pairs[2].name, "x");
        assert_eq!(pairs[2].value, "");
    }

    #[test]
    fn cookie_header_rejoins_pairs() {
        let creds = Credentials::new("t", "u", "a=1; b = 2");
        assert_eq!(creds.cookie_header(), "a=1; b=2");
    }

    #[test]
    fn completeness() {
        assert!(Credentials::new("t", "u", "c=1").is_complete());
        assert!(!Credentials::new("t", "  ", "c=1").is_complete());
        assert!(!Credentials::new("", "u", "c=1").is_complete());
    }

    #[test]
    fn debug_redacts_token_and_cookie_values() {
        let creds = Credentials::new("secret-token", "42", "sid=secret-cookie");
        let debug = format!("{creds:?}");
        assert!(!debug.contains("secret-token"));
        assert!(!debug.contains("secret-cookie"));
        assert!(debug.contains("<1 cookies>"));
    }
}
