use std::path::Path;
use std::process::{Command, Output};

const LOG: &str = "\
Oct 19 04:01:02 mx postfix/smtp[101]: A1: to=<u@d.com>, status=sent (250 OK)
Oct 19 04:02:10 mx postfix/smtp[102]: B2: to=<v@d.com>, status=bounced (550 Mailbox full)
Oct 19 04:03:00 mx postfix/smtpd[57]: NOQUEUE: reject: to=<x@other.org>, status=rejected (Relay access denied)
";

const SUMMARY_HEADER: &str = "----------------------------------------\nmailog";

/// Runs the binary against `dir/mailog.yaml`, writing a quiet one if absent.
fn mailog(dir: &Path, args: &[&str]) -> Output {
    let config = dir.join("mailog.yaml");
    if !config.exists() {
        std::fs::write(&config, "logging:\n  level: error\n").unwrap();
    }
    Command::new(env!("CARGO_BIN_EXE_mailog"))
        .arg("-c")
        .arg(&config)
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8(output.stdout.clone()).unwrap()
}

fn summary_value(text: &str, label: &str) -> String {
    text.lines()
        .find(|l| l.starts_with(label))
        .unwrap_or_else(|| panic!("no summary line for {label}"))
        .split_whitespace()
        .last()
        .unwrap()
        .to_string()
}

#[test]
fn summary_only_by_default() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("maillog.processed");
    std::fs::write(&log, LOG).unwrap();

    let output = mailog(dir.path(), &["--file", log.to_str().unwrap()]);
    assert!(output.status.success());

    let text = stdout(&output);
    assert!(text.starts_with(SUMMARY_HEADER));
    assert!(!text.contains("REJECTED LOGS"));
    assert_eq!(summary_value(&text, "✅ Sent"), "1");
    assert_eq!(summary_value(&text, "💥 Bounced"), "1");
    assert_eq!(summary_value(&text, "❌ Rejected"), "1");
    assert_eq!(summary_value(&text, "⏳ Deferred"), "0");
}

#[test]
fn optional_sections_come_before_summary() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("maillog.processed");
    std::fs::write(&log, LOG).unwrap();

    for verbose in ["-v", "--verbose", "--log"] {
        for bounced in ["-b", "--Bounced"] {
            let output = mailog(
                dir.path(),
                &["--file", log.to_str().unwrap(), verbose, bounced, "--dkim"],
            );
            assert!(output.status.success());

            let text = stdout(&output);
            let rejected = text.find("❌ REJECTED LOGS").unwrap();
            let bounced_logs = text.find("💥  BOUNCED LOGS").unwrap();
            let tally = text.find("Mailbox full: 1").unwrap();
            let dkim = text.find("No emails to Gmail were rejected").unwrap();
            let summary = text.rfind(SUMMARY_HEADER).unwrap();
            assert!(rejected < bounced_logs && bounced_logs < tally);
            assert!(tally < dkim && dkim < summary);
        }
    }
}

#[test]
fn domain_filter_is_shown_and_applied() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("maillog.processed");
    std::fs::write(&log, LOG).unwrap();

    for flag in ["-d", "--domain"] {
        let output = mailog(
            dir.path(),
            &["--file", log.to_str().unwrap(), flag, "D.com"],
        );
        assert!(output.status.success());

        let text = stdout(&output);
        assert!(text.contains("mailog (Filtered: D.com)"));
        assert_eq!(summary_value(&text, "✅ Sent"), "1");
        assert_eq!(summary_value(&text, "❌ Rejected"), "0");
    }
}

#[test]
fn all_with_pattern_reads_every_match() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("maillog.processed"), LOG).unwrap();
    std::fs::write(
        dir.path().join("maillog.processed.1"),
        "to=<w@d.com>, status=sent (250 OK)\n",
    )
    .unwrap();
    let pattern = format!("{}/maillog.processed*", dir.path().display());

    let output = mailog(dir.path(), &["-a", "--pattern", &pattern]);
    assert!(output.status.success());
    assert_eq!(summary_value(&stdout(&output), "✅ Sent"), "2");

    let output = mailog(dir.path(), &["--pattern", &pattern]);
    assert!(!output.status.success());
}

#[test]
fn config_file_supplies_log_path() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("current.log");
    std::fs::write(&log, LOG).unwrap();
    std::fs::write(
        dir.path().join("mailog.yaml"),
        format!("logs:\n  path: {}\n", log.display()),
    )
    .unwrap();

    let output = mailog(dir.path(), &[]);
    assert!(output.status.success());
    assert_eq!(summary_value(&stdout(&output), "💥 Bounced"), "1");
}

#[test]
fn json_report() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("maillog.processed");
    std::fs::write(&log, LOG).unwrap();

    let output = mailog(
        dir.path(),
        &["--file", log.to_str().unwrap(), "--json", "-b"],
    );
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["outcomes"]["sent"], 1);
    assert_eq!(value["bounce_errors"]["Mailbox full"], 1);
}

#[test]
fn missing_log_file_exits_with_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("maillog.processed");

    let output = mailog(dir.path(), &["--file", missing.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());

    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.starts_with("Error: "));
    assert!(stderr.contains("maillog.processed"));
}

#[test]
fn missing_explicit_config_exits_with_error() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("maillog.processed");
    std::fs::write(&log, LOG).unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_mailog"))
        .arg("-c")
        .arg(dir.path().join("mailogg.yaml"))
        .arg("--file")
        .arg(&log)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("mailogg.yaml"));
}

#[test]
fn generate_config_writes_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("generated.yaml");

    let output = Command::new(env!("CARGO_BIN_EXE_mailog"))
        .arg("--generate-config")
        .arg(&target)
        .output()
        .unwrap();
    assert!(output.status.success());

    let written = std::fs::read_to_string(&target).unwrap();
    assert!(written.contains("/var/log/maillog.processed"));
}
