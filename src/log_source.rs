use crate::classifier::LineClassifier;
use crate::statistics::ReportAggregator;
use anyhow::{Context, Result};
use flate2::read::MultiGzDecoder;
use regex::Regex;
use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Which log files a run reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogSelection {
    Single(PathBuf),
    /// Wildcards (`*`, `?`) are allowed in the file name only.
    Pattern(String),
}

impl LogSelection {
    /// Files to read, in processing order. Pattern matches are sorted.
    pub fn resolve(&self) -> Result<Vec<PathBuf>> {
        match self {
            LogSelection::Single(path) => Ok(vec![path.clone()]),
            LogSelection::Pattern(pattern) => expand_pattern(pattern),
        }
    }
}

fn expand_pattern(pattern: &str) -> Result<Vec<PathBuf>> {
    let path = Path::new(pattern);
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("Log pattern has no file name: {pattern}"))?;
    let parent = path.parent().unwrap_or_else(|| Path::new(""));
    let dir = if parent.as_os_str().is_empty() {
        Path::new(".")
    } else {
        parent
    };

    if !dir.is_dir() {
        log::warn!("Log directory {} does not exist", dir.display());
        return Ok(Vec::new());
    }

    let matcher = wildcard_regex(name)?;
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("Failed to list log directory: {}", dir.display()))?
    {
        let entry = entry
            .with_context(|| format!("Failed to list log directory: {}", dir.display()))?;
        let file_name = entry.file_name();
        if matcher.is_match(&file_name.to_string_lossy()) {
            paths.push(parent.join(&file_name));
        }
    }
    paths.sort();

    if paths.is_empty() {
        log::warn!("No log files match {pattern}");
    }
    Ok(paths)
}

fn wildcard_regex(name: &str) -> Result<Regex> {
    let mut re = String::from("^");
    for c in name.chars() {
        match c {
            '*' => re.push_str(".*"),
            '?' => re.push('.'),
            c => re.push_str(&regex::escape(&c.to_string())),
        }
    }
    re.push('$');
    Regex::new(&re).with_context(|| format!("Invalid log file pattern: {name}"))
}

/// Lines of one log file, decompressed when the name ends in `.gz`.
///
/// `\n`, `\r\n` and a lone `\r` all end a line. Invalid UTF-8 is
/// replaced rather than rejected; the terminator is stripped.
pub struct LogLines {
    path: PathBuf,
    reader: Box<dyn BufRead>,
    buf: Vec<u8>,
    pending: VecDeque<String>,
}

impl Iterator for LogLines {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(line) = self.pending.pop_front() {
            return Some(Ok(line));
        }

        self.buf.clear();
        match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(0) => None,
            Ok(_) => {
                let mut chunk = self.buf.as_slice();
                if let Some(rest) = chunk.strip_suffix(b"\n") {
                    chunk = rest.strip_suffix(b"\r").unwrap_or(rest);
                } else if let Some(rest) = chunk.strip_suffix(b"\r") {
                    chunk = rest;
                }
                self.pending.extend(
                    chunk
                        .split(|&b| b == b'\r')
                        .map(|part| String::from_utf8_lossy(part).into_owned()),
                );
                self.pending.pop_front().map(Ok)
            }
            Err(e) => Some(
                Err::<String, _>(e)
                    .with_context(|| format!("Failed to read log file: {}", self.path.display())),
            ),
        }
    }
}

pub fn is_gzip(path: &Path) -> bool {
    path.extension().map_or(false, |ext| ext == "gz")
}

pub fn open_lines(path: &Path) -> Result<LogLines> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open log file: {}", path.display()))?;

    let reader: Box<dyn BufRead> = if is_gzip(path) {
        Box::new(BufReader::new(MultiGzDecoder::new(file)))
    } else {
        Box::new(BufReader::new(file))
    };

    Ok(LogLines {
        path: path.to_path_buf(),
        reader,
        buf: Vec::new(),
        pending: VecDeque::new(),
    })
}

/// Feed every line of `paths`, in order, through the classifier into `stats`.
///
/// The first unreadable file aborts the scan.
pub fn scan_files(
    paths: &[PathBuf],
    classifier: &LineClassifier,
    stats: &mut ReportAggregator,
) -> Result<()> {
    for path in paths {
        let before = stats.total_events();
        let mut line_count = 0u64;
        for line in open_lines(path)? {
            stats.ingest_line(classifier, &line?);
            line_count += 1;
        }
        log::debug!(
            "{}: {} lines, {} delivery events",
            path.display(),
            line_count,
            stats.total_events() - before
        );
    }
    Ok(())
}
