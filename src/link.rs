//! In-page link activation.
//!
//! The host (a DOM binding, a webview bridge, a test) reports every anchor
//! activation as a [`LinkEvent`]. The router only cares about the resolved
//! href, and about being able to suppress the default navigation once it has
//! decided to handle the link itself.

use crate::error::RouterError;
use url::Url;

/// Origin used to resolve hrefs that arrive without scheme and host.
const PLACEHOLDER_BASE: &str = "http://localhost/";

/// An anchor activation reported by the host.
pub trait LinkEvent {
    /// Resolved href of the activated element, `None` if it has none.
    fn href(&self) -> Option<&str>;

    /// Suppress the host's default navigation.
    fn prevent_default(&mut self);

    /// Keep the event from reaching other listeners.
    fn stop_propagation(&mut self);
}

/// Plain [`LinkEvent`] that records what the router did with it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkActivation {
    href: Option<String>,
    default_prevented: bool,
    propagation_stopped: bool,
}

impl LinkActivation {
    /// Activation of a link pointing at `href`.
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            href: Some(href.into()),
            ..Self::default()
        }
    }

    /// Activation of an anchor without an href attribute.
    pub fn without_href() -> Self {
        Self::default()
    }

    /// Whether the router suppressed the default navigation.
    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented
    }

    /// Whether the router stopped propagation.
    pub fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }
}

impl LinkEvent for LinkActivation {
    fn href(&self) -> Option<&str> {
        self.href.as_deref()
    }

    fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }
}

/// The parts of an href the router uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedHref {
    /// Path, still percent-encoded. Empty for non-hierarchical URLs such as
    /// `mailto:`.
    pub pathname: String,
    /// Query string without the `?`.
    pub search: Option<String>,
    /// Host, if the href had one. Relative hrefs report the placeholder
    /// host `localhost`. Routing never looks at it.
    pub host: Option<String>,
}

impl ParsedHref {
    /// Path followed by `?query` when there is one.
    pub fn path_and_query(&self) -> String {
        match &self.search {
            Some(search) => format!("{}?{}", self.pathname, search),
            None => self.pathname.clone(),
        }
    }
}

/// Split `href` into path, query and host.
///
/// Relative hrefs are resolved against a placeholder origin.
pub fn parse_href(href: &str) -> Result<ParsedHref, RouterError> {
    let invalid = |err: url::ParseError| RouterError::InvalidHref {
        href: href.to_string(),
        reason: err.to_string(),
    };

    let url = match Url::parse(href) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(PLACEHOLDER_BASE)
            .and_then(|base| base.join(href))
            .map_err(invalid)?,
        Err(err) => return Err(invalid(err)),
    };

    let pathname = if url.cannot_be_a_base() {
        String::new()
    } else {
        url.path().to_string()
    };

    Ok(ParsedHref {
        pathname,
        search: url.query().map(str::to_string),
        host: url.host_str().map(str::to_string),
    })
}

/// Check whether `parsed` should be handled by a router listening under
/// `prefix`. Without a prefix every hierarchical path is routable.
pub fn is_routable(parsed: &ParsedHref, prefix: Option<&str>) -> bool {
    if !parsed.pathname.starts_with('/') {
        return false;
    }
    prefix.map_or(true, |prefix| parsed.pathname.starts_with(prefix))
}

/// Parse `href` and check it against `prefix`.
pub fn routable(href: &str, prefix: Option<&str>) -> Result<bool, RouterError> {
    parse_href(href).map(|parsed| is_routable(&parsed, prefix))
}
