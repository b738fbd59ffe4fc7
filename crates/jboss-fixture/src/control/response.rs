//! Classification of management console responses.

use once_cell::sync::Lazy;
use regex::Regex;

/// Text the console renders when an invoked operation returned normally.
pub const SUCCESS_MARKER: &str = "Operation completed successfully";

/// Matches the value cell following the `Started` attribute on a bean page.
/// `s` lets `.` cross lines; `m` anchors `^` at each line start.
static STARTED_PATTERN: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"(?sm)>Started<.*?<pre>\s+^(\w+)").ok());

/// Raw body of a management call with derived classifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagementResponse {
    body: String,
}

impl ManagementResponse {
    /// Wraps a body returned by [`crate::ManagementClient::call`].
    #[must_use]
    pub const fn new(body: String) -> Self {
        Self { body }
    }

    /// Page as the console returned it.
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Whether an invoked operation completed. A body without the marker means
    /// the server answered but declined the operation.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.body.contains(SUCCESS_MARKER)
    }

    /// Whether the server reports itself started. Unparseable bodies read as
    /// not started.
    #[must_use]
    pub fn is_started(&self, parser: &dyn StatusParser) -> bool {
        parser.started(&self.body).unwrap_or(false)
    }
}

/// Extracts the server's started flag from a status page.
///
/// Management consoles differ between server versions; implementations
/// return `None` when the page does not carry a recognisable status.
pub trait StatusParser: Send + Sync {
    fn started(&self, body: &str) -> Option<bool>;
}

/// Parser for the HTML rendered by the legacy JMX console's `inspectMBean`
/// page.
#[derive(Debug, Default, Clone, Copy)]
pub struct JmxConsoleStatus;

impl StatusParser for JmxConsoleStatus {
    fn started(&self, body: &str) -> Option<bool> {
        let pattern = STARTED_PATTERN.as_ref()?;
        let captures = pattern.captures(body)?;
        let token = captures.get(1)?.as_str();
        Some(token == "True")
    }
}


#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::fixtures::{failure_page, status_page, success_page};
    use super::*;

    #[test]
    fn started_true_reads_as_ready() {
        let response = ManagementResponse::new(status_page("True"));
        assert!(response.is_started(&JmxConsoleStatus));
    }

    #[rstest]
    #[case::started_false(status_page("False"))]
    #[case::no_started_row(String::from("<html><pre>\nTrue\n</pre></html>"))]
    #[case::empty(String::new())]
    #[case::malformed(String::from(">Started<<pre>"))]
    fn other_pages_read_as_not_ready(#[case] body: String) {
        let response = ManagementResponse::new(body);
        assert!(!response.is_started(&JmxConsoleStatus));
    }

    #[test]
    fn parser_distinguishes_false_from_unrecognised() {
        assert_eq!(JmxConsoleStatus.started(&status_page("False")), Some(false));
        assert_eq!(JmxConsoleStatus.started("<html></html>"), None);
    }

    #[test]
    fn success_requires_marker() {
        assert!(ManagementResponse::new(success_page()).is_success());
        assert!(!ManagementResponse::new(failure_page()).is_success());
    }

    #[test]
    fn custom_parsers_plug_in() {
        struct Always;
        impl StatusParser for Always {
            fn started(&self, _body: &str) -> Option<bool> {
                Some(true)
            }
        }
        assert!(ManagementResponse::new(String::new()).is_started(&Always));
    }
}
