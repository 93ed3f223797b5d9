//! Route authentication policies.
//!
//! Every route's authentication requirement is declared in one
//! [`PolicyTable`], built at router construction and resolved per request
//! by the gate middleware. Keeping the table explicit (rather than
//! scattering requirements across handlers) makes the auth surface
//! reviewable in one place.

use std::collections::{HashMap, HashSet};

use axum::http::Method;

/// How a request must authenticate before reaching its handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// A valid user access token referencing a live session.
    UserSession,
    /// A valid machine client API key.
    ClientKey,
    /// No authentication.
    None,
}

/// Resolved authentication requirements for the whole route surface.
///
/// Resolution precedence, most specific first:
///
/// 1. an exact method + path entry,
/// 2. the longest matching path-prefix entry,
/// 3. the configured public-path list (resolves to [`AuthMode::None`]),
/// 4. the default: [`AuthMode::UserSession`].
///
/// Defaulting to session auth means a route added without a policy entry
/// fails closed.
#[derive(Debug)]
pub struct PolicyTable {
    exact: HashMap<(Method, String), AuthMode>,
    /// Kept sorted by descending prefix length so the first match wins.
    prefixes: Vec<(String, AuthMode)>,
    public_paths: HashSet<String>,
}

impl PolicyTable {
    pub fn new(public_paths: &[String]) -> Self {
        Self {
            exact: HashMap::new(),
            prefixes: Vec::new(),
            public_paths: public_paths.iter().cloned().collect(),
        }
    }

    /// Declare the auth mode for one exact method + path.
    pub fn route(mut self, method: Method, path: &str, mode: AuthMode) -> Self {
        self.exact.insert((method, path.to_string()), mode);
        self
    }

    /// Declare the auth mode for every path under a prefix.
    pub fn prefix(mut self, path_prefix: &str, mode: AuthMode) -> Self {
        self.prefixes.push((path_prefix.to_string(), mode));
        self.prefixes
            .sort_by(|(a, _), (b, _)| b.len().cmp(&a.len()));
        self
    }

    /// Resolve the auth mode for a request.
    pub fn resolve(&self, method: &Method, path: &str) -> AuthMode {
        if let Some(mode) = self.exact.get(&(method.clone(), path.to_string())) {
            return *mode;
        }
        for (prefix, mode) in &self.prefixes {
            if path.starts_with(prefix.as_str()) {
                return *mode;
            }
        }
        if self.public_paths.contains(path) {
            return AuthMode::None;
        }
        AuthMode::UserSession
    }
}
