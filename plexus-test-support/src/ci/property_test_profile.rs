//! Environment-driven proptest tuning shared by every property suite.
//!
//! CI raises the case count for nightly runs and may enable forking; local
//! runs keep the per-suite defaults.

use std::env;

/// Environment variable overriding the number of proptest cases.
pub const PLEXUS_PBT_CASES_ENV_KEY: &str = "PLEXUS_PBT_CASES";
/// Environment variable enabling forked proptest execution.
pub const PLEXUS_PBT_FORK_ENV_KEY: &str = "PLEXUS_PBT_FORK";

/// Case count and fork flag for one property suite.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProptestRunProfile {
    cases: u32,
    fork: bool,
}

impl ProptestRunProfile {
    /// Reads the overrides, falling back to the given defaults for unset or
    /// malformed values.
    ///
    /// # Examples
    /// ```
    /// use plexus_test_support::ci::property_test_profile::ProptestRunProfile;
    ///
    /// let profile = ProptestRunProfile::load(32, false);
    /// assert!(profile.cases() > 0);
    /// ```
    #[must_use]
    pub fn load(default_cases: u32, default_fork: bool) -> Self {
        Self {
            cases: read_override(PLEXUS_PBT_CASES_ENV_KEY, parse_cases).unwrap_or(default_cases),
            fork: read_override(PLEXUS_PBT_FORK_ENV_KEY, parse_flag).unwrap_or(default_fork),
        }
    }

    /// Number of cases to run per property.
    #[must_use]
    pub fn cases(&self) -> u32 {
        self.cases
    }

    /// Whether cases run in forked subprocesses.
    #[must_use]
    pub fn fork(&self) -> bool {
        self.fork
    }
}

fn read_override<T>(key: &'static str, parse: fn(&str) -> Result<T, String>) -> Option<T> {
    let raw = env::var(key).ok()?;
    parse(&raw)
        .inspect_err(|reason| {
            tracing::warn!(
                env = key,
                raw = %raw,
                reason = %reason,
                "ignoring malformed property-test override",
            );
        })
        .ok()
}

fn parse_cases(raw: &str) -> Result<u32, String> {
    match raw.trim().parse::<u32>() {
        Ok(0) => Err("cases must be positive".to_owned()),
        Ok(cases) => Ok(cases),
        Err(error) => Err(format!("not a case count: {error}")),
    }
}

fn parse_flag(raw: &str) -> Result<bool, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(format!("`{other}` is not a boolean flag")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    #[rstest]
    #[case("1", Ok(1))]
    #[case(" 250 ", Ok(250))]
    #[case("0", Err(()))]
    #[case("-3", Err(()))]
    #[case("many", Err(()))]
    fn case_counts(#[case] raw: &str, #[case] expected: Result<u32, ()>) {
        assert_eq!(parse_cases(raw).map_err(|_| ()), expected);
    }

    #[rstest]
    #[case("TRUE", Ok(true))]
    #[case("on", Ok(true))]
    #[case("0", Ok(false))]
    #[case("Off", Ok(false))]
    #[case("", Err(()))]
    #[case("2", Err(()))]
    fn fork_flags(#[case] raw: &str, #[case] expected: Result<bool, ()>) {
        assert_eq!(parse_flag(raw).map_err(|_| ()), expected);
    }
}
