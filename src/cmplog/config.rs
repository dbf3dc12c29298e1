//! Configuration for the routine-comparison logging pass.

use crate::cmplog::MarkerTable;

/// Command-line flag selecting the `_extended` hook family.
pub const EXTENDED_FLAG: &str = "cmplog_routines_extended";

/// Configuration of the routine-comparison logging pass.
///
/// # Examples
///
/// ```rust
/// use cmplog_routines::cmplog::CmpLogConfig;
///
/// let config = CmpLogConfig::from_args(["-O2", "-cmplog_routines_extended"]);
/// assert!(config.extended_header);
///
/// let config = CmpLogConfig::from_args(["--cmplog_routines_extended=false"]);
/// assert!(!config.extended_header);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CmpLogConfig {
    /// Use the `_extended` hook names.
    pub extended_header: bool,
    /// Managed-string recognition rules.
    pub markers: MarkerTable,
}

impl CmpLogConfig {
    /// Standard hooks, builtin markers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Extended hooks, builtin markers.
    #[must_use]
    pub fn extended() -> Self {
        Self {
            extended_header: true,
            ..Self::default()
        }
    }

    /// Replaces the managed-string rules.
    #[must_use]
    pub fn with_markers(mut self, markers: MarkerTable) -> Self {
        self.markers = markers;
        self
    }

    /// Builds a configuration from compiler-style arguments.
    ///
    /// Recognises `-cmplog_routines_extended` and `--cmplog_routines_extended`, optionally
    /// followed by `=true`, `=false`, `=1` or `=0`. The last occurrence wins; unrelated
    /// arguments are ignored.
    pub fn from_args<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut config = Self::default();

        for arg in args {
            let arg = arg.as_ref();
            let Some(stripped) = arg.strip_prefix("--").or_else(|| arg.strip_prefix('-')) else {
                continue;
            };
            let (key, value) = match stripped.split_once('=') {
                Some((key, value)) => (key, Some(value)),
                None => (stripped, None),
            };
            if key != EXTENDED_FLAG {
                continue;
            }

            match value {
                None | Some("true" | "1") => config.extended_header = true,
                Some("false" | "0") => config.extended_header = false,
                Some(other) => log::warn!("ignoring {EXTENDED_FLAG}={other}: not a boolean"),
            }
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CmpLogConfig::new();
        assert!(!config.extended_header);
        assert_eq!(config.markers, MarkerTable::builtin());
        assert!(CmpLogConfig::extended().extended_header);
    }

    #[test]
    fn test_from_args_forms() {
        assert!(CmpLogConfig::from_args(["--cmplog_routines_extended"]).extended_header);
        assert!(CmpLogConfig::from_args(["-cmplog_routines_extended=1"]).extended_header);
        assert!(!CmpLogConfig::from_args(["-cmplog_routines_extended=0"]).extended_header);
        assert!(!CmpLogConfig::from_args(["cmplog_routines_extended"]).extended_header);
        assert!(!CmpLogConfig::from_args(["-cmplog_routines_extended=maybe"]).extended_header);
        assert!(!CmpLogConfig::from_args(["-cmplog_routines_extendedx"]).extended_header);
        assert!(!CmpLogConfig::from_args(Vec::<String>::new()).extended_header);
    }

    #[test]
    fn test_last_occurrence_wins() {
        let args = vec![
            "-cmplog_routines_extended".to_string(),
            "-g".to_string(),
            "--cmplog_routines_extended=false".to_string(),
        ];
        assert!(!CmpLogConfig::from_args(&args).extended_header);
    }
}
