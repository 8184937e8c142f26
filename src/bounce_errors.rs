/// Known bounce reasons, matched as plain substrings of bounced log lines.
///
/// The list is kept byte-for-byte compatible with the reports operators
/// already compare against, including the joined
/// "Access deniedAddress rejected" entry.
pub const KNOWN_BOUNCE_ERRORS: &[&str] = &[
    "550-5.1.1 The email account that you tried to reach does not exist",
    "550-Unrouteable address 550 Sender verify failed",
    "550-5.7.26  DKIM = did not pass",
    "Access deniedAddress rejected",
    "Domain has exceeded the max emails per hour (250)",
    "Host not found",
    "Mail quota exceeded",
    "Mailbox full",
    "No such recipient",
    "No such user",
    "Recipient address rejected:",
    "Refused by local policy. No SPAM please!",
    "Relay access denied",
    "This mail has been blocked because the sender is unauthenticated",
    "Unable to deliver message to the following address(es)",
    "User mailbox exceeds allowed size",
    "User unknown in virtual alias table",
    "domain not found",
    "mailbox unavailable",
    "This address no longer accepts mail.",
];

/// Every known phrase contained in `line`. A line may match several.
pub fn matching_phrases(line: &str) -> impl Iterator<Item = &'static str> + '_ {
    KNOWN_BOUNCE_ERRORS
        .iter()
        .copied()
        .filter(move |phrase| line.contains(phrase))
}
