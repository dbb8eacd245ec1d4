//! ui::output
//!
//! Output formatting and display.
//!
//! User-facing output goes to stdout and respects `--quiet`; errors and
//! warnings go to stderr. Diagnostics belong in `tracing`, not here.

use std::fmt::Display;

/// Output verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Debug,
}

impl Verbosity {
    /// Create verbosity from flags. `quiet` wins over `debug`.
    pub fn from_flags(quiet: bool, debug: bool) -> Self {
        if quiet {
            Verbosity::Quiet
        } else if debug {
            Verbosity::Debug
        } else {
            Verbosity::Normal
        }
    }

    /// Default `tracing` filter directive for this verbosity.
    pub fn log_filter(&self) -> &'static str {
        match self {
            Verbosity::Quiet => "warn",
            Verbosity::Normal => "info",
            Verbosity::Debug => "debug",
        }
    }
}

/// Print a message (respects quiet mode).
pub fn print(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        println!("{}", message);
    }
}

/// Print an error message (always shown).
pub fn error(message: impl Display) {
    eprintln!("error: {}", message);
}

/// Print a warning message (respects quiet mode).
pub fn warn(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        eprintln!("warning: {}", message);
    }
}

/// Format a list of items, one per line.
pub fn format_list<T: Display>(items: &[T], prefix: &str) -> String {
    items
        .iter()
        .map(|item| format!("{}{}", prefix, item))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Show what changes between two texts.
///
/// Lines shared at the start and end are dropped; the differing middle is
/// printed as `-`/`+` lines. Returns `"(no changes)"` for equal input.
pub fn format_changes(before: &str, after: &str) -> String {
    if before == after {
        return "(no changes)".to_string();
    }

    let old: Vec<&str> = before.lines().collect();
    let new: Vec<&str> = after.lines().collect();

    let prefix = old
        .iter()
        .zip(new.iter())
        .take_while(|(a, b)| a == b)
        .count();
    let suffix = old[prefix..]
        .iter()
        .rev()
        .zip(new[prefix..].iter().rev())
        .take_while(|(a, b)| a == b)
        .count();

    let removed = &old[prefix..old.len() - suffix];
    let added = &new[prefix..new.len() - suffix];

    let mut out = Vec::with_capacity(removed.len() + added.len() + 1);
    out.push(format!("@@ line {} @@", prefix + 1));
    out.extend(removed.iter().map(|l| format!("-{}", l)));
    out.extend(added.iter().map(|l| format!("+{}", l)));
    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_from_flags() {
        assert_eq!(Verbosity::from_flags(true, true), Verbosity::Quiet);
        assert_eq!(Verbosity::from_flags(false, true), Verbosity::Debug);
        assert_eq!(Verbosity::from_flags(false, false), Verbosity::Normal);
    }

    #[test]
    fn log_filters() {
        assert_eq!(Verbosity::Quiet.log_filter(), "warn");
        assert_eq!(Verbosity::Normal.log_filter(), "info");
        assert_eq!(Verbosity::Debug.log_filter(), "debug");
    }

    #[test]
    fn list_formatting() {
        assert_eq!(format_list(&["Catan", "Azul"], "  - "), "  - Catan\n  - Azul");
    }

    mod changes {
        use super::*;

        #[test]
        fn equal() {
            assert_eq!(format_changes("a\nb", "a\nb"), "(no changes)");
        }

        #[test]
        fn middle_replaced() {
            let before = "head\n * Catan\n * Azul\ntail\n";
            let after = "head\n * Azul\ntail\n";
            assert_eq!(format_changes(before, after), "@@ line 2 @@\n- * Catan");
        }

        #[test]
        fn line_changed() {
            let before = "[Game of the Week: Old](/a1) | rules\n";
            let after = "[Game of the Week: New](/b2) | rules\n";
            assert_eq!(
                format_changes(before, after),
                "@@ line 1 @@\n-[Game of the Week: Old](/a1) | rules\n+[Game of the Week: New](/b2) | rules"
            );
        }
    }
}
