pub mod bounce_errors;
pub mod classifier;
pub mod config;
pub mod log_source;
pub mod mailbox;
pub mod report;
pub mod statistics;

pub use classifier::{AuthFailureEvent, DeliveryEvent, LineClassifier, Outcome};
pub use config::Config;
pub use log_source::{scan_files, LogSelection};
pub use mailbox::{MailboxLister, ShellMailboxLister};
pub use report::{MailboxListing, Report, ReportOptions};
pub use statistics::ReportAggregator;
