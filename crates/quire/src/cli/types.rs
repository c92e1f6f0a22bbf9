//! CLI value enums and domain type conversions.

use clap::ValueEnum;

use crate::domain::{Disposition, Issue, IssueType};

/// Issue type for CLI arguments
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueTypeArg {
    /// A bug to fix
    #[value(alias = "b", alias = "bug")]
    Bugfix,
    /// New functionality
    #[value(alias = "f")]
    Feature,
    /// Anything else
    #[value(alias = "t")]
    Task,
}

impl From<IssueTypeArg> for IssueType {
    fn from(arg: IssueTypeArg) -> Self {
        match arg {
            IssueTypeArg::Bugfix => Self::Bugfix,
            IssueTypeArg::Feature => Self::Feature,
            IssueTypeArg::Task => Self::Task,
        }
    }
}

/// Disposition for the `close` command
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DispositionArg {
    /// The work was done
    #[default]
    Fixed,
    /// It will not be done
    Wontfix,
    /// It was folded into other issues
    Reorg,
}

impl From<DispositionArg> for Disposition {
    fn from(arg: DispositionArg) -> Self {
        match arg {
            DispositionArg::Fixed => Self::Fixed,
            DispositionArg::Wontfix => Self::Wontfix,
            DispositionArg::Reorg => Self::Reorg,
        }
    }
}

/// Which issues `list` shows
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilterArg {
    /// Issues not yet closed
    #[default]
    Open,
    /// Closed issues only
    Closed,
    /// Every issue
    All,
}

impl StatusFilterArg {
    /// Whether `issue` passes the filter.
    #[must_use]
    pub fn matches(self, issue: &Issue) -> bool {
        match self {
            Self::Open => issue.is_open(),
            Self::Closed => issue.is_closed(),
            Self::All => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::bugfix("bugfix", IssueType::Bugfix)]
    #[case::short_bug("b", IssueType::Bugfix)]
    #[case::bug("bug", IssueType::Bugfix)]
    #[case::feature("f", IssueType::Feature)]
    #[case::task("task", IssueType::Task)]
    fn test_issue_type_arg(#[case] input: &str, #[case] expected: IssueType) {
        let arg = IssueTypeArg::from_str(input, true).unwrap();
        assert_eq!(IssueType::from(arg), expected);
    }

    #[rstest]
    #[case::fixed("fixed", Disposition::Fixed)]
    #[case::wontfix("wontfix", Disposition::Wontfix)]
    #[case::reorg("reorg", Disposition::Reorg)]
    fn test_disposition_arg(#[case] input: &str, #[case] expected: Disposition) {
        let arg = DispositionArg::from_str(input, true).unwrap();
        assert_eq!(Disposition::from(arg), expected);
    }

    #[test]
    fn test_unknown_disposition_rejected() {
        assert!(DispositionArg::from_str("done", true).is_err());
    }
}
