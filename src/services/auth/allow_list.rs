/*
 * Responsibility
 * - 認証を必要としないパスの集合 (exact match のみ)
 * - `{serviceid}` のような波括弧もリテラル文字列として扱う (ワイルドカードではない)
 */
use std::collections::BTreeSet;

/// Paths reachable without an Authorization token.
pub const DEFAULT_EXEMPT_PATHS: [&str; 4] = [
    "/api/v1/ping",
    "/api/v1/servicemgr/services",
    "/api/v1/servicemgr/services/notification/{serviceid}",
    "/api/v1/scoringmgr/score",
];

/// Immutable set of exempt request paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowList {
    paths: BTreeSet<String>,
}

impl Default for AllowList {
    fn default() -> Self {
        Self::new(DEFAULT_EXEMPT_PATHS)
    }
}

impl AllowList {
    pub fn new<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
        }
    }

    /// Append operator-configured paths (e.g. from `AUTH_EXEMPT_PATHS`).
    pub fn with_extra<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.paths.extend(paths.into_iter().map(Into::into));
        self
    }

    pub fn is_exempt(&self, path: &str) -> bool {
        self.paths.contains(path)
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.paths.iter().map(String::as_str)
    }
}
