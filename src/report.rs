//! Diagnostics reporter
//!
//! Non-fatal problems found while building the cmd graph are reported here
//! instead of aborting the run. Each message is keyed by its format template:
//! the first occurrence is printed immediately, repeats are only counted, and
//! a final summary prints the first few instances per template. Whether any
//! error was recorded decides the process exit status.
//!
//! All diagnostics go to stderr as `error: ...` / `warning: ...` lines, with
//! the severity prefix colored when stderr is a terminal.

use std::cell::RefCell;
use std::io::{IsTerminal, Write};
use std::sync::atomic::{AtomicBool, Ordering};

use rustc_hash::FxHashMap;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Occurrences printed per template before the summary collapses the rest.
const SUMMARY_THRESHOLD: usize = 3;

static VERBOSE: AtomicBool = AtomicBool::new(false);

pub fn set_verbose(enabled: bool) {
    VERBOSE.store(enabled, Ordering::Relaxed);
}

pub fn verbose_enabled() -> bool {
    VERBOSE.load(Ordering::Relaxed)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl Severity {
    fn label(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
        }
    }

    fn color(self) -> Color {
        match self {
            Self::Error => Color::Red,
            Self::Warning => Color::Yellow,
        }
    }
}

/// Write one `<severity>: <message>` diagnostic line to stderr.
pub fn emit(severity: Severity, message: &str) {
    let choice = if std::io::stderr().is_terminal() {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    };
    let mut stderr = StandardStream::stderr(choice);
    let mut prefix = ColorSpec::new();
    prefix.set_fg(Some(severity.color())).set_bold(true);
    let _ = stderr.set_color(&prefix);
    let _ = write!(stderr, "{}:", severity.label());
    let _ = stderr.reset();
    let _ = writeln!(stderr, " {}", message);
}

/// A fatal, run-aborting failure. Not deduplicated; the caller exits.
pub fn fatal(message: &str) {
    emit(Severity::Error, message);
}

/// Plain status line on stderr.
pub fn note(message: &str) {
    eprintln!("{}", message);
}

/// Status line shown only when `--verbose` was given.
macro_rules! trace {
    ($($args:tt)*) => {
        if $crate::report::verbose_enabled() {
            $crate::report::note(&format!($($args)*));
        }
    };
}
pub(crate) use trace;

/// Report an error. The format string doubles as the deduplication key, and
/// the call site is recorded as `file:line` context.
macro_rules! report_error {
    ($template:literal $(, $args:expr)* $(,)?) => {
        $crate::report::log(
            $crate::report::Severity::Error,
            $template,
            format!(concat!(file!(), ":", line!(), ": ", $template) $(, $args)*),
        )
    };
}
pub(crate) use report_error;

/// Report a warning, deduplicated by format string.
macro_rules! report_warning {
    ($template:literal $(, $args:expr)* $(,)?) => {
        $crate::report::log(
            $crate::report::Severity::Warning,
            $template,
            format!($template $(, $args)*),
        )
    };
}
pub(crate) use report_warning;

/// Report an error when `strict` holds, a warning otherwise. Used where the
/// `fail_on_unknown_build_command` flag picks the severity.
macro_rules! report_error_or_warning {
    ($strict:expr, $template:literal $(, $args:expr)* $(,)?) => {
        if $strict {
            $crate::report::report_error!($template $(, $args)*)
        } else {
            $crate::report::report_warning!($template $(, $args)*)
        }
    };
}
pub(crate) use report_error_or_warning;

/// Messages of one severity, grouped by template in first-seen order.
struct MessageLog {
    severity: Severity,
    index: FxHashMap<&'static str, usize>,
    entries: Vec<Vec<String>>,
}

impl MessageLog {
    fn new(severity: Severity) -> Self {
        Self {
            severity,
            index: FxHashMap::default(),
            entries: Vec::new(),
        }
    }

    fn log(&mut self, template: &'static str, message: String) {
        let slot = match self.index.get(template) {
            Some(&slot) => slot,
            None => {
                // first occurrence of this template is printed right away
                emit(self.severity, &message);
                let slot = self.entries.len();
                self.index.insert(template, slot);
                self.entries.push(Vec::new());
                slot
            }
        };
        self.entries[slot].push(message);
    }

    fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn summary(&self) -> String {
        let mut lines = Vec::new();
        for messages in &self.entries {
            for (i, message) in messages.iter().enumerate() {
                if i < SUMMARY_THRESHOLD {
                    lines.push(message.clone());
                    continue;
                }
                let remaining = messages.len() - i;
                lines.push(format!(
                    "... (Found {} more {} of this {})",
                    remaining,
                    if remaining != 1 { "instances" } else { "instance" },
                    self.severity.label(),
                ));
                break;
            }
        }
        lines.join("\n")
    }
}

struct Reporter {
    errors: MessageLog,
    warnings: MessageLog,
}

impl Reporter {
    fn new() -> Self {
        Self {
            errors: MessageLog::new(Severity::Error),
            warnings: MessageLog::new(Severity::Warning),
        }
    }
}

thread_local! {
    static REPORTER: RefCell<Reporter> = RefCell::new(Reporter::new());
}

/// Reset the reporter to an empty state.
pub fn init() {
    REPORTER.with_borrow_mut(|reporter| *reporter = Reporter::new());
}

pub fn log(severity: Severity, template: &'static str, message: String) {
    REPORTER.with_borrow_mut(|reporter| match severity {
        Severity::Error => reporter.errors.log(template, message),
        Severity::Warning => reporter.warnings.log(template, message),
    });
}

pub fn has_errors() -> bool {
    REPORTER.with_borrow(|reporter| !reporter.errors.is_empty())
}

/// Number of distinct error templates recorded so far.
pub fn error_count() -> usize {
    REPORTER.with_borrow(|reporter| reporter.errors.entries.len())
}

/// Summary of all recorded errors, or `None` when the run was clean.
pub fn summarize_errors() -> Option<String> {
    REPORTER.with_borrow(|reporter| {
        if reporter.errors.is_empty() {
            return None;
        }
        let count = reporter.errors.entries.len();
        Some(format!(
            "Sbom generation failed with {} {}:\n{}",
            count,
            if count != 1 { "errors" } else { "error" },
            reporter.errors.summary(),
        ))
    })
}

pub fn summarize_warnings() -> Option<String> {
    REPORTER.with_borrow(|reporter| {
        if reporter.warnings.is_empty() {
            return None;
        }
        Some(reporter.warnings.summary())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_occurrence_only_counts_repeats() {
        init();
        for i in 0..5 {
            report_error!("Skip thing {} for reasons", i);
        }
        assert!(has_errors());
        assert_eq!(error_count(), 1);
        let summary = summarize_errors().unwrap();
        assert!(summary.contains("failed with 1 error"));
        // threshold instances listed, the rest collapsed
        assert!(summary.contains("Skip thing 0"));
        assert!(summary.contains("Skip thing 2"));
        assert!(!summary.contains("Skip thing 3"));
        assert!(summary.contains("(Found 2 more instances of this error)"));
    }

    #[test]
    fn distinct_templates_are_separate_entries() {
        init();
        report_error!("first problem: {}", "a");
        report_error!("second problem: {}", "b");
        assert_eq!(error_count(), 2);
    }

    #[test]
    fn warnings_do_not_fail_the_run() {
        init();
        report_warning!("only a warning: {}", 1);
        assert!(!has_errors());
        assert!(summarize_errors().is_none());
        assert!(summarize_warnings().unwrap().contains("only a warning"));
    }

    #[test]
    fn errors_carry_call_site_context() {
        init();
        report_error!("context check");
        let summary = summarize_errors().unwrap();
        assert!(summary.contains("src/report.rs"));
    }
}
