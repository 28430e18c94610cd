//! Proxy table lookup.
//!
//! # Responsibilities
//! - Store compiled proxy routes
//! - Look up the matching route for a request path
//! - Build the upstream URL and `Host` value for a matched route
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) path prefix scan (the table holds a handful of rules)
//! - Explicit `None` rather than a silent default route

use axum::http::{HeaderValue, Uri};
use url::Url;

use crate::config::validation::check_target;
use crate::config::ProxyRuleConfig;
use crate::routing::matcher::PathPrefixMatcher;

/// Error compiling a proxy rule.
#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    #[error("invalid target {target:?} for prefix {prefix:?}: {reason}")]
    InvalidTarget {
        prefix: String,
        target: String,
        reason: String,
    },
}

/// A compiled proxy rule.
#[derive(Debug, Clone)]
pub struct ProxyRoute {
    matcher: PathPrefixMatcher,
    target: Url,
    authority: HeaderValue,
    change_origin: bool,
    secure: bool,
}

impl ProxyRoute {
    fn compile(rule: &ProxyRuleConfig) -> Result<Self, RouteError> {
        let invalid = |reason: String| RouteError::InvalidTarget {
            prefix: rule.prefix.clone(),
            target: rule.target.clone(),
            reason,
        };

        let target = check_target(&rule.target).map_err(invalid)?;
        let host = target.host_str().unwrap_or_default();
        let authority = match target.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };
        let authority = HeaderValue::from_str(&authority).map_err(|e| invalid(e.to_string()))?;

        Ok(Self {
            matcher: PathPrefixMatcher::new(rule.prefix.clone()),
            target,
            authority,
            change_origin: rule.change_origin,
            secure: rule.secure,
        })
    }

    pub fn prefix(&self) -> &str {
        self.matcher.prefix()
    }

    pub fn target(&self) -> &Url {
        &self.target
    }

    /// `Host` value for the upstream: `host[:port]` of the target.
    pub fn authority(&self) -> &HeaderValue {
        &self.authority
    }

    pub fn change_origin(&self) -> bool {
        self.change_origin
    }

    pub fn secure(&self) -> bool {
        self.secure
    }

    /// Upstream URL for an inbound request URI.
    ///
    /// The inbound path is appended to the target's own path; the query is
    /// carried over untouched.
    pub fn upstream_url(&self, uri: &Uri) -> Url {
        self.join(uri.path(), uri.query())
    }

    fn join(&self, path: &str, query: Option<&str>) -> Url {
        let mut url = self.target.clone();
        let base = self.target.path().trim_end_matches('/');
        url.set_path(&format!("{base}{path}"));
        url.set_query(query);
        url
    }
}

/// Ordered set of proxy routes; first match wins.
#[derive(Debug, Clone, Default)]
pub struct ProxyTable {
    routes: Vec<ProxyRoute>,
}

impl ProxyTable {
    /// Compile rules in declaration order.
    pub fn from_config(rules: &[ProxyRuleConfig]) -> Result<Self, RouteError> {
        let routes = rules
            .iter()
            .map(ProxyRoute::compile)
            .collect::<Result<Vec<_>, _>>()?;

        for route in &routes {
            tracing::debug!(
                prefix = route.prefix(),
                target = %route.target,
                change_origin = route.change_origin,
                secure = route.secure,
                "Proxy route compiled"
            );
        }

        Ok(Self { routes })
    }

    /// Find the first route whose prefix matches `path`.
    pub fn match_path(&self, path: &str) -> Option<&ProxyRoute> {
        self.routes.iter().find(|route| route.matcher.matches(path))
    }

    /// Route an inbound request to its upstream URL.
    ///
    /// Matching runs on the path the upstream will receive, with `.` and `..`
    /// segments (plain or percent-encoded) already resolved, so a request can
    /// never climb out of the prefix it matched.
    pub fn resolve(&self, uri: &Uri) -> Option<(&ProxyRoute, Url)> {
        let mut scratch = self.routes.first()?.target.clone();
        scratch.set_path(uri.path());

        let route = self.match_path(scratch.path())?;
        Some((route, route.join(scratch.path(), uri.query())))
    }

    pub fn routes(&self) -> &[ProxyRoute] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
