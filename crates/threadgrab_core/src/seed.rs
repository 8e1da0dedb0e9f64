use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

static SEED_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://[^\s/$.?#].[^\s]*$").expect("seed url pattern compiles")
});

/// A thread URL that passed validation and may enter the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SeedUrl(String);

impl SeedUrl {
    /// Validates `raw` as an absolute http(s) URL without embedded whitespace.
    pub fn parse(raw: &str) -> Option<Self> {
        is_seed_url(raw).then(|| Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SeedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SeedUrl {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

pub fn is_seed_url(raw: &str) -> bool {
    SEED_PATTERN.is_match(raw)
}

/// Result of validating the seed file: accepted seeds in file order plus the
/// lines that were rejected, so the caller can report them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedList {
    pub seeds: Vec<SeedUrl>,
    pub rejected: Vec<String>,
}

impl SeedList {
    pub fn is_empty(&self) -> bool {
        self.seeds.is_empty()
    }
}

/// Splits LF or CRLF separated input into seeds. Lines are trimmed and blank
/// lines are ignored; anything else that fails validation lands in `rejected`.
pub fn parse_seed_lines(raw: &str) -> SeedList {
    let mut list = SeedList::default();
    for line in raw.lines().map(str::trim).filter(|line| !line.is_empty()) {
        match SeedUrl::parse(line) {
            Some(seed) => list.seeds.push(seed),
            None => list.rejected.push(line.to_string()),
        }
    }
    list
}
