use grouplog_core::{format_members_report, Group, JobSettings, Member, StopPolicy};
use std::sync::Arc;
use std::thread;

fn report_lines(report: &str) -> Vec<&str> {
    report
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect()
}

#[test]
fn single_member_report_multiplies_age_by_ten() {
    let group = Group::new("g1");
    group.add_member(Member::new("m1", 18));

    let report = group.format_members_report();
    assert_eq!(report_lines(&report), vec!["memberId=m1, age=180"]);
    assert!(report.starts_with("memberId=m1, age=180\n"));
}

#[test]
fn duplicate_member_id_never_changes_count() {
    let group = Group::new("g1");
    assert!(group.add_member(Member::new("m1", 18)));
    assert!(!group.add_member(Member::new("m1", 77)));
    assert!(!group.add_member(None));
    assert_eq!(group.member_count(), 1);

    let kept = &group.members()[0];
    assert_eq!(kept.age(), 18);
}

#[test]
fn report_has_one_line_per_member_with_scaled_ages() {
    let group = Group::new("g-many");
    for (index, age) in [0_u32, 1, 18, 42, 120].into_iter().enumerate() {
        group.add_member(Member::new(format!("m{index}"), age));
    }

    let report = group.format_members_report();
    let lines = report_lines(&report);
    assert_eq!(lines.len(), group.member_count());

    for member in group.members() {
        let expected = format!("memberId={}, age={}", member.member_id(), member.age() * 10);
        assert!(lines.contains(&expected.as_str()), "missing line {expected}");
    }
}

#[test]
fn formatter_accepts_any_member_iterator() {
    let members = vec![Member::new("a", 2), Member::new("b", 3)];
    let lines_owned = format_members_report(&members);
    assert_eq!(
        report_lines(&lines_owned),
        vec!["memberId=a, age=20", "memberId=b, age=30"]
    );
}

#[test]
fn concurrent_adds_keep_set_deduplicated() {
    let group = Arc::new(Group::new("g-concurrent"));
    let workers: Vec<_> = (0..4)
        .map(|_| {
            let group = Arc::clone(&group);
            thread::spawn(move || {
                for index in 0..50 {
                    group.add_member(Member::new(format!("m{index}"), index));
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().expect("worker thread");
    }

    assert_eq!(group.member_count(), 50);
    assert_eq!(report_lines(&group.format_members_report()).len(), 50);
}

#[test]
fn member_serializes_with_snake_case_fields() {
    let member = Member::new("m1", 18);
    let json = serde_json::to_value(&member).unwrap();
    assert_eq!(json["member_id"], "m1");
    assert_eq!(json["age"], 18);

    let decoded: Member = serde_json::from_value(json).unwrap();
    assert_eq!(decoded, member);
    assert_eq!(decoded.age(), 18);
}

#[test]
fn job_settings_load_from_json_with_defaults() {
    let settings: JobSettings =
        serde_json::from_str(r#"{"stop_policy":"reset_on_start"}"#).unwrap();
    assert_eq!(settings.interval_ms, 1_000);
    assert_eq!(settings.stop_policy, StopPolicy::ResetOnStart);

    let settings: JobSettings = serde_json::from_str(r#"{"interval_ms":50}"#).unwrap();
    assert_eq!(settings.interval_ms, 50);
    assert_eq!(settings.stop_policy, StopPolicy::Sticky);
}
