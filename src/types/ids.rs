//! Newtype wrappers for domain identifiers.
//!
//! These types prevent accidental mixing of the different strings that flow
//! through the relay (a thread key where a message timestamp is expected, a
//! raw URL where a key is expected) and make the code more self-documenting.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix shared by every thread key.
pub const THREAD_KEY_PREFIX: &str = "github-";

/// A pull request or issue number within a repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrNumber(pub u64);

impl fmt::Display for PrNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A git commit SHA.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sha(pub String);

impl Sha {
    /// Creates a new Sha from a string.
    ///
    /// Note: This does not validate the format. Valid SHAs are 40 hex characters.
    pub fn new(s: impl Into<String>) -> Self {
        Sha(s.into())
    }

    /// Returns the SHA as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns a short (7-character) version of the SHA for display.
    pub fn short(&self) -> &str {
        // get() avoids a panic on non-ASCII input from Deserialize.
        self.0.get(..7).unwrap_or(&self.0)
    }
}

impl fmt::Display for Sha {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for Sha {
    fn from(s: String) -> Self {
        Sha(s)
    }
}

impl From<&str> for Sha {
    fn from(s: &str) -> Self {
        Sha(s.to_string())
    }
}

/// Stable identity of one conversation thread.
///
/// Always `github-<canonical url>` for pull requests and issues, or
/// `github-<sha>` for a commit that could not be tied to a pull request.
/// The same logical object yields the same key on every request.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThreadKey(String);

impl ThreadKey {
    /// Key for a pull request or issue, from its permanent `html_url`.
    pub fn for_url(html_url: &str) -> Self {
        ThreadKey(format!("{THREAD_KEY_PREFIX}{html_url}"))
    }

    /// Key for a bare commit with no known pull request.
    pub fn for_commit(sha: &Sha) -> Self {
        ThreadKey(format!("{THREAD_KEY_PREFIX}{}", sha.as_str()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ThreadKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Timestamp token the chat service assigns to a posted message.
///
/// Opaque to the relay; it is only stored and echoed back as a reply target.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageTs(pub String);

impl MessageTs {
    pub fn new(s: impl Into<String>) -> Self {
        MessageTs(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageTs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for MessageTs {
    fn from(s: &str) -> Self {
        MessageTs(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod pr_number {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn display_format(n: u64) {
                let pr = PrNumber(n);
                prop_assert_eq!(format!("{}", pr), format!("#{}", n));
            }

            #[test]
            fn ordering_matches_underlying(a: u64, b: u64) {
                prop_assert_eq!(PrNumber(a).cmp(&PrNumber(b)), a.cmp(&b));
            }
        }
    }

    mod sha {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn short_returns_7_chars(s in "[0-9a-f]{40}") {
                let sha = Sha::new(&s);
                prop_assert_eq!(sha.short().len(), 7);
                prop_assert_eq!(sha.short(), &s[..7]);
            }
        }

        #[test]
        fn short_handles_short_input() {
            let sha = Sha::new("abc");
            assert_eq!(sha.short(), "abc");
        }
    }

    mod thread_key {
        use super::*;
        use proptest::prelude::*;

        #[test]
        fn url_key_has_prefix() {
            let key = ThreadKey::for_url("https://github.com/octocat/hello/pull/42");
            assert_eq!(key.as_str(), "github-https://github.com/octocat/hello/pull/42");
        }

        #[test]
        fn commit_key_uses_full_sha() {
            let sha = Sha::new("a".repeat(40));
            let key = ThreadKey::for_commit(&sha);
            assert_eq!(key.as_str(), format!("github-{}", "a".repeat(40)));
        }

        #[test]
        fn serializes_as_plain_string() {
            let key = ThreadKey::for_url("https://x/pull/1");
            let json = serde_json::to_string(&key).unwrap();
            assert_eq!(json, "\"github-https://x/pull/1\"");
        }

        proptest! {
            #[test]
            fn same_url_same_key(url in "https://github\\.com/[a-z]{1,10}/[a-z]{1,10}/pull/[0-9]{1,5}") {
                prop_assert_eq!(ThreadKey::for_url(&url), ThreadKey::for_url(&url));
            }
        }
    }
}
