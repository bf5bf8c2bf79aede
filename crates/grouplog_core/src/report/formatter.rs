//! Member report formatter.
//!
//! # Responsibility
//! - Produce one `memberId=<id>, age=<age*10>` line per member.
//!
//! # Invariants
//! - The reported age is always ten times the stored age.
//! - Every member line is followed by `\n` and then by the platform line
//!   separator, so each member occupies one text line plus a spacer.
//! - Member order follows the input iterator; callers passing a set get an
//!   unspecified order.

use crate::model::member::Member;
use std::fmt::Write;

/// Multiplier applied to every age in a report.
pub const AGE_REPORT_FACTOR: u64 = 10;

/// Line separator appended after every member line.
#[cfg(windows)]
pub const PLATFORM_LINE_SEPARATOR: &str = "\r\n";
/// Line separator appended after every member line.
#[cfg(not(windows))]
pub const PLATFORM_LINE_SEPARATOR: &str = "\n";

/// Returns the age value written to reports for `member`.
pub fn reported_age(member: &Member) -> u64 {
    u64::from(member.age()) * AGE_REPORT_FACTOR
}

/// Formats a member collection into one report block.
pub fn format_members_report<'a, I>(members: I) -> String
where
    I: IntoIterator<Item = &'a Member>,
{
    let mut report = String::new();
    for member in members {
        // Writing into a String cannot fail.
        let _ = write!(
            report,
            "memberId={}, age={}\n{}",
            member.member_id(),
            reported_age(member),
            PLATFORM_LINE_SEPARATOR
        );
    }
    report
}

#[cfg(test)]
mod tests {
    use super::{format_members_report, reported_age, PLATFORM_LINE_SEPARATOR};
    use crate::model::member::Member;

    #[test]
    fn single_member_reports_ten_times_age() {
        let members = [Member::new("m1", 18)];
        let report = format_members_report(&members);
        assert_eq!(report, format!("memberId=m1, age=180\n{PLATFORM_LINE_SEPARATOR}"));
    }

    #[test]
    fn empty_input_renders_empty_report() {
        let members: Vec<Member> = Vec::new();
        assert!(format_members_report(&members).is_empty());
    }

    #[test]
    fn reported_age_does_not_overflow_at_max() {
        let member = Member::new("old", u32::MAX);
        assert_eq!(reported_age(&member), u64::from(u32::MAX) * 10);
    }

    #[test]
    fn one_report_line_per_member() {
        let members = [
            Member::new("a", 1),
            Member::new("b", 2),
            Member::new("c", 3),
        ];
        let report = format_members_report(&members);
        let lines: Vec<&str> = report
            .lines()
            .filter(|line| !line.trim().is_empty())
            .collect();
        assert_eq!(lines, vec!["memberId=a, age=10", "memberId=b, age=20", "memberId=c, age=30"]);
    }
}
