use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;

/// Marker the Gmail MX puts in its rejection text for unauthenticated mail.
pub const GMAIL_AUTH_MARKER: &str =
    "Gmail requires all senders to authenticate with either SPF or DKIM";

lazy_static! {
    static ref RECIPIENT_RE: Regex = Regex::new(r"to=<([^@]+)@([^>]+)>").unwrap();
    static ref STATUS_RE: Regex = Regex::new(r"status=(\w+)").unwrap();
    static ref GMAIL_AUTH_RE: Regex =
        Regex::new(r"from=<([^@]+@[^>]+)>,.*to=<([^@]+@gmail.com)>").unwrap();
}

/// Delivery status token taken from `status=...`.
///
/// The log format is not ours, so any token is accepted; the ones the
/// report knows about get their own variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Outcome {
    Sent,
    Deferred,
    Bounced,
    Rejected,
    Other(String),
}

impl Outcome {
    pub fn as_str(&self) -> &str {
        match self {
            Outcome::Sent => "sent",
            Outcome::Deferred => "deferred",
            Outcome::Bounced => "bounced",
            Outcome::Rejected => "rejected",
            Outcome::Other(token) => token,
        }
    }

    /// Whether lines with this outcome are kept verbatim for the report.
    pub fn keeps_raw_line(&self) -> bool {
        matches!(self, Outcome::Bounced | Outcome::Rejected)
    }
}

impl From<&str> for Outcome {
    fn from(token: &str) -> Self {
        match token {
            "sent" => Outcome::Sent,
            "deferred" => Outcome::Deferred,
            "bounced" => Outcome::Bounced,
            "rejected" => Outcome::Rejected,
            other => Outcome::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One recipient delivery attempt recognised in a log line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryEvent {
    pub recipient_local: String,
    pub recipient_domain: String,
    pub outcome: Outcome,
    /// Trimmed source line, only for bounced and rejected deliveries.
    pub raw_line: Option<String>,
}

impl DeliveryEvent {
    pub fn recipient(&self) -> String {
        format!("{}@{}", self.recipient_local, self.recipient_domain)
    }
}

/// Sender whose mail to a Gmail recipient was refused for missing SPF/DKIM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthFailureEvent {
    pub sender: String,
    pub recipient: String,
}

/// Turns raw log lines into delivery events.
///
/// Lines that do not look like delivery records are not errors; they
/// simply produce no event.
#[derive(Debug, Clone, Default)]
pub struct LineClassifier {
    domain_filter: Option<String>,
}

impl LineClassifier {
    /// `domain_filter` is matched case-insensitively against the whole
    /// recipient address. An empty filter disables filtering.
    pub fn new(domain_filter: Option<&str>) -> Self {
        Self {
            domain_filter: domain_filter
                .filter(|f| !f.is_empty())
                .map(|f| f.to_lowercase()),
        }
    }

    pub fn domain_filter(&self) -> Option<&str> {
        self.domain_filter.as_deref()
    }

    pub fn classify(&self, line: &str) -> Option<DeliveryEvent> {
        let recipient = RECIPIENT_RE.captures(line)?;
        let local = &recipient[1];
        let domain = &recipient[2];

        if let Some(filter) = &self.domain_filter {
            let address = format!("{local}@{domain}").to_lowercase();
            if !address.contains(filter.as_str()) {
                return None;
            }
        }

        let outcome = Outcome::from(&STATUS_RE.captures(line)?[1]);
        let raw_line = outcome.keeps_raw_line().then(|| line.trim().to_string());

        Some(DeliveryEvent {
            recipient_local: local.to_string(),
            recipient_domain: domain.to_string(),
            outcome,
            raw_line,
        })
    }

    /// Not subject to the domain filter.
    pub fn classify_auth_failure(&self, line: &str) -> Option<AuthFailureEvent> {
        if !line.contains(GMAIL_AUTH_MARKER) {
            return None;
        }

        let caps = GMAIL_AUTH_RE.captures(line)?;
        Some(AuthFailureEvent {
            sender: caps[1].to_string(),
            recipient: caps[2].to_string(),
        })
    }
}
