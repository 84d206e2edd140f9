//! Quorum rules for session formation and continuation
//!
//! A rule turns the session's target size into the minimum number of
//! non-degraded participants needed to start (and keep) a session active.

use serde::{Deserialize, Serialize};

/// Rule for determining the minimum quorum
///
/// - `Majority`: more than half of the target size (default)
/// - `Unanimous`: the full target size
/// - `AtLeast(n)`: a fixed minimum of n participants
/// - `Percentage(p)`: at least p% of the target size
///
/// # Example
///
/// ```
/// use council_domain::quorum::QuorumRule;
///
/// let rule = QuorumRule::Majority;
/// assert_eq!(rule.required(5), 3);
/// assert!(rule.is_satisfied(3, 5));
/// assert!(!rule.is_satisfied(2, 5));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum QuorumRule {
    /// More than half of the target (n/2 + 1)
    #[default]
    Majority,

    /// Every targeted seat must be filled
    Unanimous,

    /// At least n participants
    AtLeast(usize),

    /// At least this percentage of the target (0-100)
    Percentage(u8),
}

impl QuorumRule {
    /// Minimum number of active participants for a session targeting
    /// `target` participants. Never less than one.
    pub fn required(&self, target: usize) -> usize {
        let required = match self {
            QuorumRule::Majority => target / 2 + 1,
            QuorumRule::Unanimous => target,
            QuorumRule::AtLeast(n) => *n,
            QuorumRule::Percentage(p) => (target as f64 * (*p as f64 / 100.0)).ceil() as usize,
        };
        required.max(1)
    }

    /// Check if `active` participants satisfy the rule for `target`
    pub fn is_satisfied(&self, active: usize, target: usize) -> bool {
        active >= self.required(target)
    }

    /// Get a human-readable description of this rule
    pub fn description(&self) -> String {
        match self {
            QuorumRule::Majority => "majority (more than half)".to_string(),
            QuorumRule::Unanimous => "unanimous (every seat filled)".to_string(),
            QuorumRule::AtLeast(n) => format!("at least {} participants", n),
            QuorumRule::Percentage(p) => format!("at least {}% of target", p),
        }
    }
}

impl std::fmt::Display for QuorumRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

impl std::str::FromStr for QuorumRule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "majority" => Ok(QuorumRule::Majority),
            "unanimous" => Ok(QuorumRule::Unanimous),
            s if s.starts_with("atleast:") || s.starts_with("at_least:") => {
                let n: usize = s
                    .split(':')
                    .nth(1)
                    .ok_or("Missing number after atleast:")?
                    .parse()
                    .map_err(|_| "Invalid number for atleast")?;
                Ok(QuorumRule::AtLeast(n))
            }
            s if s.starts_with("percentage:") || s.ends_with('%') => {
                let num_str = s.trim_start_matches("percentage:").trim_end_matches('%');
                let p: u8 = num_str.parse().map_err(|_| "Invalid percentage")?;
                if p > 100 {
                    return Err(format!("Percentage out of range: {}", p));
                }
                Ok(QuorumRule::Percentage(p))
            }
            _ => Err(format!(
                "Unknown quorum rule: {}. Valid: majority, unanimous, atleast:N, percentage:N or N%",
                s
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_majority_of_target() {
        let rule = QuorumRule::Majority;
        assert_eq!(rule.required(5), 3);
        assert_eq!(rule.required(4), 3);
        assert_eq!(rule.required(1), 1);

        assert!(rule.is_satisfied(3, 5));
        assert!(!rule.is_satisfied(2, 5));
    }

    #[test]
    fn test_unanimous() {
        assert_eq!(QuorumRule::Unanimous.required(4), 4);
        assert!(!QuorumRule::Unanimous.is_satisfied(3, 4));
    }

    #[test]
    fn test_at_least() {
        let rule = QuorumRule::AtLeast(3);
        assert_eq!(rule.required(5), 3);
        assert_eq!(rule.required(10), 3);
        assert!(rule.is_satisfied(3, 5));
        assert!(!rule.is_satisfied(2, 5));
    }

    #[test]
    fn test_percentage() {
        // 5 * 75% = ceil(3.75) = 4
        assert_eq!(QuorumRule::Percentage(75).required(5), 4);
        assert_eq!(QuorumRule::Percentage(50).required(4), 2);
    }

    #[test]
    fn test_never_below_one() {
        assert_eq!(QuorumRule::Majority.required(0), 1);
        assert_eq!(QuorumRule::AtLeast(0).required(5), 1);
        assert_eq!(QuorumRule::Percentage(0).required(5), 1);
        assert!(!QuorumRule::AtLeast(0).is_satisfied(0, 0));
    }

    #[test]
    fn test_parse_rule() {
        assert_eq!(
            "majority".parse::<QuorumRule>().ok(),
            Some(QuorumRule::Majority)
        );
        assert_eq!(
            " Unanimous ".parse::<QuorumRule>().ok(),
            Some(QuorumRule::Unanimous)
        );
        assert_eq!(
            "atleast:3".parse::<QuorumRule>().ok(),
            Some(QuorumRule::AtLeast(3))
        );
        assert_eq!(
            "at_least:2".parse::<QuorumRule>().ok(),
            Some(QuorumRule::AtLeast(2))
        );
        assert_eq!(
            "60%".parse::<QuorumRule>().ok(),
            Some(QuorumRule::Percentage(60))
        );
        assert!("150%".parse::<QuorumRule>().is_err());
        assert!("plurality".parse::<QuorumRule>().is_err());
    }

    #[test]
    fn test_default() {
        assert_eq!(QuorumRule::default(), QuorumRule::Majority);
    }
}
