//! HTTP reachability checks for source URLs.
//!
//! [`UrlChecker`] never fails: transport errors, timeouts and unsupported schemes all come back
//! as an unreachable [`UrlCheckResult`], so one bad link cannot abort a project pass. Network
//! access goes through the [`HttpProbe`] seam; [`ReqwestProbe`] is the production probe.

use crate::config::UrlCheckConfig;
use crate::error::{KbError, KbResult};
use crate::paths::is_http_url;
use reqwest::redirect::Policy;
use reqwest::StatusCode;
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Redirect hops followed before a probe gives up.
pub const MAX_REDIRECTS: usize = 10;

/// Outcome of probing one URL.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct UrlCheckResult {
    /// URL as cited.
    pub url: String,
    /// `status < 400`.
    pub reachable: bool,
    /// Final HTTP status, or `0` when no response was received.
    pub status: u16,
    /// Reason phrase for the status, or the transport error message.
    pub reason: String,
}

impl UrlCheckResult {
    fn from_status(url: &str, status: u16) -> Self {
        let reason = StatusCode::from_u16(status)
            .ok()
            .and_then(|code| code.canonical_reason())
            .map_or_else(|| format!("HTTP {status}"), str::to_string);
        Self {
            url: url.to_string(),
            reachable: status < 400,
            status,
            reason,
        }
    }

    fn unreachable(url: &str, reason: impl Into<String>) -> Self {
        Self {
            url: url.to_string(),
            reachable: false,
            status: 0,
            reason: reason.into(),
        }
    }
}

/// Minimal HTTP surface the checker needs.
///
/// Implementations return the final status code after redirects, or an error message when no
/// response was received. A GET must not download the body.
pub trait HttpProbe {
    /// Issue a HEAD request.
    fn head(&self, url: &str) -> Result<u16, String>;
    /// Issue a GET request without reading the body.
    fn get(&self, url: &str) -> Result<u16, String>;
}

impl<P: HttpProbe + ?Sized> HttpProbe for &P {
    fn head(&self, url: &str) -> Result<u16, String> {
        (**self).head(url)
    }

    fn get(&self, url: &str) -> Result<u16, String> {
        (**self).get(url)
    }
}

/// Blocking `reqwest` probe with a bounded timeout and a fixed user-agent.
#[derive(Clone, Debug)]
pub struct ReqwestProbe {
    client: reqwest::blocking::Client,
}

impl ReqwestProbe {
    /// Build the underlying client from `config`.
    pub fn new(config: &UrlCheckConfig) -> KbResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .redirect(Policy::limited(MAX_REDIRECTS))
            .build()
            .map_err(|err| KbError::HttpClient(err.to_string()))?;
        Ok(Self { client })
    }
}

impl HttpProbe for ReqwestProbe {
    fn head(&self, url: &str) -> Result<u16, String> {
        self.client
            .head(url)
            .send()
            .map(|response| response.status().as_u16())
            .map_err(|err| err.to_string())
    }

    fn get(&self, url: &str) -> Result<u16, String> {
        // The response is dropped unread, so only headers are transferred.
        self.client
            .get(url)
            .send()
            .map(|response| response.status().as_u16())
            .map_err(|err| err.to_string())
    }
}

/// Reachability checker over an [`HttpProbe`].
#[derive(Clone, Debug)]
pub struct UrlChecker<P = ReqwestProbe> {
    probe: P,
}

impl UrlChecker<ReqwestProbe> {
    /// Checker backed by a real HTTP client.
    pub fn from_config(config: &UrlCheckConfig) -> KbResult<Self> {
        Ok(Self::with_probe(ReqwestProbe::new(config)?))
    }
}

impl<P: HttpProbe> UrlChecker<P> {
    /// Checker backed by `probe`.
    pub fn with_probe(probe: P) -> Self {
        Self { probe }
    }

    /// Probe one URL: HEAD first, one GET when the server answers 405.
    pub fn check(&self, url: &str) -> UrlCheckResult {
        if !is_http_url(url) {
            return UrlCheckResult::unreachable(url, "unsupported scheme");
        }

        let outcome = match self.probe.head(url) {
            Ok(405) => {
                debug!(url, "HEAD not allowed, retrying with GET");
                self.probe.get(url)
            }
            other => other,
        };

        let result = match outcome {
            Ok(status) => UrlCheckResult::from_status(url, status),
            Err(reason) => UrlCheckResult::unreachable(url, reason),
        };
        if !result.reachable {
            warn!(url, status = result.status, reason = %result.reason, "source URL unreachable");
        }
        result
    }

    /// Check every distinct URL once, in order of first occurrence.
    pub fn check_all<'a, I>(&self, urls: I) -> Vec<UrlCheckResult>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut seen = HashSet::new();
        urls.into_iter()
            .filter(|url| seen.insert(*url))
            .map(|url| self.check(url))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::collections::HashMap;

    #[derive(Default)]
    struct FakeProbe {
        head: Script,
        get: Script,
        calls: RefCell<Vec<(&'static str, String)>>,
    }

    type Script = HashMap<&'static str, Result<u16, String>>;

    impl FakeProbe {
        fn respond(script: &Script, url: &str) -> Result<u16, String> {
            script.get(url).cloned().unwrap_or(Ok(200))
        }
    }

    impl HttpProbe for FakeProbe {
        fn head(&self, url: &str) -> Result<u16, String> {
            self.calls.borrow_mut().push(("HEAD", url.to_string()));
            Self::respond(&self.head, url)
        }

        fn get(&self, url: &str) -> Result<u16, String> {
            self.calls.borrow_mut().push(("GET", url.to_string()));
            Self::respond(&self.get, url)
        }
    }

    #[test]
    fn unsupported_scheme_makes_no_request() {
        let probe = FakeProbe::default();
        let result = UrlChecker::with_probe(&probe).check("ftp://files.example/a");
        assert!(!result.reachable);
        assert_eq!(result.status, 0);
        assert_eq!(result.reason, "unsupported scheme");
        assert!(probe.calls.borrow().is_empty());
    }

    #[test]
    fn reachable_below_400() {
        let mut probe = FakeProbe::default();
        probe.head.insert("https://a.example/moved", Ok(301));
        let checker = UrlChecker::with_probe(&probe);
        assert!(checker.check("https://a.example/").reachable);
        assert!(checker.check("https://a.example/moved").reachable);
    }

    #[test]
    fn not_found_carries_status_and_reason() {
        let mut probe = FakeProbe::default();
        probe.head.insert("https://a.example/gone", Ok(404));
        let result = UrlChecker::with_probe(&probe).check("https://a.example/gone");
        assert_eq!(
            result,
            UrlCheckResult {
                url: "https://a.example/gone".into(),
                reachable: false,
                status: 404,
                reason: "Not Found".into(),
            }
        );
    }

    #[test]
    fn method_not_allowed_falls_back_to_get_once() {
        let mut probe = FakeProbe::default();
        probe.head.insert("https://a.example/", Ok(405));
        probe.get.insert("https://a.example/", Ok(200));
        let result = UrlChecker::with_probe(&probe).check("https://a.example/");
        assert!(result.reachable);
        assert_eq!(
            *probe.calls.borrow(),
            vec![
                ("HEAD", "https://a.example/".to_string()),
                ("GET", "https://a.example/".to_string()),
            ]
        );
    }

    #[test]
    fn transport_errors_become_status_zero() {
        let mut probe = FakeProbe::default();
        probe
            .head
            .insert("https://down.example/", Err("connection refused".into()));
        let result = UrlChecker::with_probe(&probe).check("https://down.example/");
        assert!(!result.reachable);
        assert_eq!(result.status, 0);
        assert_eq!(result.reason, "connection refused");
    }

    #[test]
    fn check_all_deduplicates_in_first_occurrence_order() {
        let probe = FakeProbe::default();
        let checker = UrlChecker::with_probe(&probe);
        let u = "https://a.example/";
        let results = checker.check_all([u, u, u]);
        assert_eq!(results.len(), 1);
        assert_eq!(probe.calls.borrow().len(), 1);

        let results = checker.check_all(["https://b.example/", u, "https://b.example/"]);
        let urls: Vec<_> = results.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(urls, vec!["https://b.example/", u]);
    }

    #[test]
    fn unknown_status_gets_generic_reason() {
        let mut probe = FakeProbe::default();
        probe.head.insert("https://a.example/", Ok(599));
        let result = UrlChecker::with_probe(&probe).check("https://a.example/");
        assert_eq!(result.reason, "HTTP 599");
    }
}
