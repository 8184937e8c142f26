use crate::statistics::ReportAggregator;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::{self, Write};

const RULE: &str = "----------------------------------------";
const DOUBLE_RULE: &str = "========================================";

/// Optional sections requested on the command line.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportOptions {
    pub verbose: bool,
    pub bounce_errors: bool,
    pub dkim: bool,
}

/// Outcome of the mailbox listing; a failure is shown, never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MailboxListing {
    Ok(String),
    Error(String),
}

impl From<anyhow::Result<String>> for MailboxListing {
    fn from(result: anyhow::Result<String>) -> Self {
        match result {
            Ok(text) => MailboxListing::Ok(text),
            Err(e) => MailboxListing::Error(format!("{e:#}")),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DkimFailure<'a> {
    pub sender: &'a str,
    pub recipient: &'a str,
}

/// Serializable snapshot of a finished run.
#[derive(Debug, Serialize)]
pub struct Report<'a> {
    pub filter: Option<&'a str>,
    pub outcomes: BTreeMap<&'a str, u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejected_lines: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bounced_lines: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bounce_errors: Option<&'a BTreeMap<&'static str, u64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mailboxes: Option<&'a MailboxListing>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dkim_failures: Option<Vec<DkimFailure<'a>>>,
}

impl<'a> Report<'a> {
    pub fn build(
        stats: &'a ReportAggregator,
        options: ReportOptions,
        mailboxes: Option<&'a MailboxListing>,
        filter: Option<&'a str>,
    ) -> Self {
        Self {
            filter,
            outcomes: stats.outcome_counts(),
            rejected_lines: options.verbose.then(|| stats.rejected_lines()),
            bounced_lines: options.verbose.then(|| stats.bounced_lines()),
            bounce_errors: options.bounce_errors.then(|| stats.bounce_error_tally()),
            mailboxes,
            dkim_failures: options.dkim.then(|| {
                stats
                    .auth_failures()
                    .iter()
                    .map(|(sender, recipient)| DkimFailure {
                        sender: sender.as_str(),
                        recipient: recipient.as_str(),
                    })
                    .collect()
            }),
        }
    }
}

pub fn write_json<W: Write>(out: &mut W, report: &Report<'_>) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut *out, report)?;
    writeln!(out)?;
    Ok(())
}

/// Render the text report. The outcome summary always comes last.
pub fn write_text<W: Write>(
    out: &mut W,
    stats: &ReportAggregator,
    options: ReportOptions,
    mailboxes: Option<&MailboxListing>,
    filter: Option<&str>,
) -> io::Result<()> {
    if options.verbose {
        write_raw_lines(out, "❌ REJECTED LOGS", stats.rejected_lines())?;
        write_raw_lines(out, "💥  BOUNCED LOGS", stats.bounced_lines())?;
    }
    if options.bounce_errors {
        write_bounce_errors(out, stats)?;
    }
    if let Some(listing) = mailboxes {
        write_mailboxes(out, listing)?;
    }
    if options.dkim {
        write_dkim_failures(out, stats)?;
    }
    write_summary(out, stats, filter)
}

fn write_raw_lines<W: Write>(out: &mut W, title: &str, lines: &[String]) -> io::Result<()> {
    if lines.is_empty() {
        return Ok(());
    }
    writeln!(out, "{RULE}")?;
    writeln!(out, "{title}")?;
    writeln!(out, "{RULE}")?;
    for line in lines {
        writeln!(out, "{line}")?;
    }
    write!(out, "\n\n\n")
}

fn write_bounce_errors<W: Write>(out: &mut W, stats: &ReportAggregator) -> io::Result<()> {
    writeln!(out, "{DOUBLE_RULE}")?;
    writeln!(out, "BOUNCED ERROR STATISTICS")?;
    writeln!(out, "{DOUBLE_RULE}")?;
    writeln!(out)?;
    for (phrase, count) in stats.bounce_error_tally() {
        writeln!(out, "{phrase}: {count}")?;
    }
    write!(out, "\n\n")
}

fn write_mailboxes<W: Write>(out: &mut W, listing: &MailboxListing) -> io::Result<()> {
    match listing {
        MailboxListing::Ok(text) => {
            writeln!(out, "{RULE}")?;
            writeln!(out, "All mailboxes")?;
            writeln!(out, "{RULE}")?;
            writeln!(out, "{text}")?;
            write!(out, "\n\n\n\n")
        }
        MailboxListing::Error(message) => writeln!(out, "Failed to list mailboxes: {message}"),
    }
}

fn write_dkim_failures<W: Write>(out: &mut W, stats: &ReportAggregator) -> io::Result<()> {
    let failures = stats.auth_failures();
    if failures.is_empty() {
        return writeln!(
            out,
            "No emails to Gmail were rejected for missing SPF/DKIM authentication."
        );
    }
    writeln!(out, "Emails rejected by Gmail for missing SPF/DKIM authentication:")?;
    for (sender, recipient) in failures {
        writeln!(out, "Sender: {sender}, Recipient: {recipient}")?;
    }
    Ok(())
}

fn write_summary<W: Write>(
    out: &mut W,
    stats: &ReportAggregator,
    filter: Option<&str>,
) -> io::Result<()> {
    writeln!(out, "{RULE}")?;
    match filter {
        Some(domain) => writeln!(out, "mailog (Filtered: {domain})")?,
        None => writeln!(out, "mailog")?,
    }
    writeln!(out, "{RULE}")?;
    let rows = [
        ("✅ Sent (delivered):", "sent"),
        ("⏳ Deferred (temporarily delayed):", "deferred"),
        ("❌ Rejected (delivery refused):", "rejected"),
        ("💥 Bounced (delivery failed):", "bounced"),
    ];
    for (label, token) in rows {
        writeln!(out, "{label:<40} {}", stats.outcome_count(token))?;
    }
    write!(out, "\n\n\n")
}
