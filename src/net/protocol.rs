//! Query protocol vocabulary.
//!
//! One address per request line; one token per response line:
//!
//! ```text
//! → 10.1.2.3\n
//! ← FOUND\n
//! → not-an-ip\n
//! ← NOT_FOUND\n
//! ```
//!
//! The tokens are part of the external contract. Do not change them.

/// Longest request line accepted. Longer lines are answered `NOT_FOUND`.
pub const MAX_LINE_LEN: usize = 4096;

/// Answer to a single containment query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Response {
    Found,
    NotFound,
}

impl Response {
    /// Wire form including the trailing newline.
    pub fn as_line(self) -> &'static [u8] {
        match self {
            Response::Found => b"FOUND\n",
            Response::NotFound => b"NOT_FOUND\n",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Response::Found => "FOUND",
            Response::NotFound => "NOT_FOUND",
        }
    }
}

impl From<bool> for Response {
    fn from(found: bool) -> Self {
        if found {
            Response::Found
        } else {
            Response::NotFound
        }
    }
}

impl std::fmt::Display for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
