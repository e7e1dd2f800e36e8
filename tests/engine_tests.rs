use chrono::{DateTime, Duration, TimeZone, Utc};
use pretty_assertions::assert_eq;
use std::collections::BTreeSet;
use xapi_engagement::aggregator::{
    aggregate_interactions, build_rollup, estimate_durations, DurationResult, GapThreshold,
};
use xapi_engagement::engine::{run_analysis, SkipReason};
use xapi_engagement::grouping::{DaySelector, Group, GroupingStrategy, RunMode};
use xapi_engagement::parser::{parse_grouping_config, AnalysisContext, Event, EventTable, Verb};
use xapi_engagement::utils::EngineError;

fn at(minute: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2021, 4, 12, 13, 0, 0).unwrap() + Duration::minutes(minute)
}

fn population(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn gap(minutes: f64) -> GapThreshold {
    GapThreshold::from_minutes(minutes).unwrap()
}

/// Two days in unit 1, one day in unit 2, three students
fn course_table() -> EventTable {
    EventTable::new(vec![
        Event::new("alice", 101, Verb::Interacted, at(0)).with_label("D1 Warm-up"),
        Event::new("alice", 102, Verb::Completed, at(4)).with_label("D1 Quiz"),
        Event::new("alice", 102, Verb::Completed, at(30)).with_label("D1 Quiz"),
        Event::new("bob", 101, Verb::Attempted, at(2)).with_label("D1 Warm-up"),
        Event::new("bob", 201, Verb::Interacted, at(60)).with_label("D2 Lab"),
        Event::new("bob", 201, Verb::Progressed, at(67)).with_label("D2 Lab"),
        Event::new("carol", 301, Verb::Experienced, at(120)).with_label("Day03 Review"),
        Event::new("carol", 301, Verb::Completed, at(121)).with_label("Day03 Review"),
    ])
}

const COURSE_CONFIG: &str = r#"{
    "Time_Delta": 10,
    "Days": {
        "Day1": {"DayNumber": 1, "Unit": 1, "Elements": [101, 102]},
        "Day2": {"DayNumber": 2, "Unit": 1, "Elements": [201]},
        "Day3": {"DayNumber": 3, "Unit": 2, "Elements": [301]},
        "Day4": {"DayNumber": 4, "Unit": 2, "Elements": [999]}
    }
}"#;

#[test]
fn test_scenario_a_single_interaction() {
    let group = Group::day(1, None, [1]);
    let events = [Event::new("alice", 1, Verb::Interacted, at(0))];
    let refs: Vec<&Event> = events.iter().collect();

    let result = aggregate_interactions(&group, &refs, &population(&["alice", "bob"])).unwrap();

    assert_eq!(result.interactions[&1], population(&["alice"]));
    assert_eq!(result.percentages[&1], 50.0);
}

#[test]
fn test_scenario_b_gap_excluded() {
    let group = Group::day(1, None, [1]);
    let events = [
        Event::new("carol", 1, Verb::Interacted, at(0)),
        Event::new("carol", 1, Verb::Interacted, at(5)),
        Event::new("carol", 1, Verb::Interacted, at(20)),
    ];
    let refs: Vec<&Event> = events.iter().collect();

    let result = estimate_durations(&group, &refs, &population(&["carol"]), gap(10.0)).unwrap();

    assert_eq!(result.minutes_for("carol"), 5.0);
}

#[test]
fn test_scenario_c_unit_accumulates() {
    let day1 = Group::day(1, Some(1), [1]);
    let day2 = Group::day(2, Some(1), [2]);
    let d1 = DurationResult {
        minutes: [("alice".to_string(), 5.0)].into_iter().collect(),
        event_count: 2,
    };
    let d2 = DurationResult {
        minutes: [("alice".to_string(), 7.0)].into_iter().collect(),
        event_count: 2,
    };

    let table = build_rollup(&population(&["alice"]), &[(&day1, &d1), (&day2, &d2)]);

    assert_eq!(table.value("alice", "Unit 1"), Some(12.0));
    assert_eq!(table.total("alice"), Some(12.0));
}

#[test]
fn test_scenario_d_empty_group_has_no_column() {
    let ctx = AnalysisContext::new(course_table(), &[]);
    let strategy = GroupingStrategy::Configured {
        config: parse_grouping_config(COURSE_CONFIG).unwrap(),
        selector: DaySelector::All,
    };

    let run = run_analysis(&ctx, &strategy, gap(10.0)).unwrap();

    assert_eq!(
        run.rollup.column_names(),
        vec!["Day 1", "Day 2", "Day 3", "Unit 1", "Unit 2", "Total"]
    );
    assert_eq!(run.skipped.len(), 1);
    assert_eq!(run.skipped[0].group.number, 4);
    assert_eq!(run.skipped[0].reason, SkipReason::NoEvents);

    // Unit 2 only carries day 3
    assert_eq!(run.rollup.value("carol", "Unit 2"), Some(1.0));
}

#[test]
fn test_full_configured_run() {
    let ctx = AnalysisContext::new(course_table(), &[]);
    let strategy = GroupingStrategy::Configured {
        config: parse_grouping_config(COURSE_CONFIG).unwrap(),
        selector: DaySelector::All,
    };

    let run = run_analysis(&ctx, &strategy, gap(10.0)).unwrap();

    assert_eq!(run.mode, RunMode::MultiGroup);
    assert_eq!(run.population_size, 3);
    assert_eq!(run.reports.len(), 3);

    let day1 = &run.reports[0];
    assert_eq!(day1.interactions.interactions[&101], population(&["alice", "bob"]));
    assert_eq!(day1.interactions.labels[&102].as_deref(), Some("D1 Quiz"));
    // 0 -> 4 counted, 4 -> 30 is a break
    assert_eq!(day1.durations.minutes_for("alice"), 4.0);

    assert_eq!(run.rollup.value("alice", "Unit 1"), Some(4.0));
    assert_eq!(run.rollup.value("bob", "Unit 1"), Some(7.0));
    assert_eq!(run.rollup.total("bob"), Some(7.0));
    assert_eq!(run.rollup.total("carol"), Some(1.0));
}

#[test]
fn test_pattern_run_matches_configured_days() {
    let ctx = AnalysisContext::new(course_table(), &[]);
    let strategy = GroupingStrategy::LabelPattern {
        selector: DaySelector::All,
    };

    let run = run_analysis(&ctx, &strategy, GapThreshold::default()).unwrap();

    let names: Vec<&str> = run.reports.iter().map(|r| r.group.name.as_str()).collect();
    assert_eq!(names, vec!["Day 1", "Day 2", "Day 3"]);
    assert_eq!(run.reports[0].group.element_ids, vec![101, 102]);
    // No units in pattern mode: the total still covers every day
    assert_eq!(run.rollup.column_names(), vec!["Day 1", "Day 2", "Day 3", "Total"]);
    assert_eq!(run.rollup.total("bob"), Some(7.0));
}

#[test]
fn test_selected_days_only() {
    let ctx = AnalysisContext::new(course_table(), &[]);
    let strategy = GroupingStrategy::Configured {
        config: parse_grouping_config(COURSE_CONFIG).unwrap(),
        selector: "2-3,8".parse().unwrap(),
    };

    let run = run_analysis(&ctx, &strategy, gap(10.0)).unwrap();

    assert_eq!(run.reports.len(), 2);
    assert_eq!(run.ignored, vec![8]);
    assert_eq!(run.rollup.value("alice", "Total"), Some(0.0));
}

#[test]
fn test_explicit_unknown_element_aborts() {
    let ctx = AnalysisContext::new(course_table(), &[]);
    let strategy = GroupingStrategy::ExplicitIds(vec![101, 555]);

    let err = run_analysis(&ctx, &strategy, gap(10.0)).unwrap_err();
    assert_eq!(err, EngineError::UnknownElement(555));
}

#[test]
fn test_filtered_students_leave_population() {
    let ctx = AnalysisContext::new(course_table(), &["carol".to_string()]);
    let strategy = GroupingStrategy::ExplicitIds(vec![101]);

    let run = run_analysis(&ctx, &strategy, gap(10.0)).unwrap();

    assert_eq!(run.population_size, 2);
    assert_eq!(run.reports[0].interactions.percentages[&101], 100.0);
    assert!(!run.reports[0].durations.minutes.contains_key("carol"));
}

#[test]
fn test_result_maps_share_group_keys() {
    let ctx = AnalysisContext::new(course_table(), &[]);
    let strategy = GroupingStrategy::ExplicitIds(vec![301, 101, 201, 102]);

    let run = run_analysis(&ctx, &strategy, gap(10.0)).unwrap();
    let report = &run.reports[0];

    let expected: Vec<u64> = report.group.element_ids.clone();
    let interaction_keys: Vec<u64> = report.interactions.interactions.keys().copied().collect();
    let label_keys: Vec<u64> = report.interactions.labels.keys().copied().collect();
    let percentage_keys: Vec<u64> = report.interactions.percentages.keys().copied().collect();

    assert_eq!(interaction_keys, expected);
    assert_eq!(label_keys, expected);
    assert_eq!(percentage_keys, expected);
}

#[test]
fn test_percentages_bounded_and_exact() {
    let ctx = AnalysisContext::new(course_table(), &[]);
    let strategy = GroupingStrategy::ExplicitIds(vec![101, 102, 201, 301]);

    let run = run_analysis(&ctx, &strategy, gap(10.0)).unwrap();
    let interactions = &run.reports[0].interactions;

    for (element, students) in &interactions.interactions {
        let pct = interactions.percentages[element];
        assert!((0.0..=100.0).contains(&pct));
        assert_eq!(pct, 100.0 * students.len() as f64 / run.population_size as f64);
    }
}

#[test]
fn test_durations_cover_population() {
    let ctx = AnalysisContext::new(course_table(), &[]);
    let strategy = GroupingStrategy::Configured {
        config: parse_grouping_config(COURSE_CONFIG).unwrap(),
        selector: DaySelector::All,
    };

    let run = run_analysis(&ctx, &strategy, gap(10.0)).unwrap();

    for report in &run.reports {
        let keys: BTreeSet<String> = report.durations.minutes.keys().cloned().collect();
        assert_eq!(&keys, ctx.population());
    }
}

#[test]
fn test_rollup_idempotent() {
    let ctx = AnalysisContext::new(course_table(), &[]);
    let strategy = GroupingStrategy::LabelPattern {
        selector: DaySelector::All,
    };
    let run = run_analysis(&ctx, &strategy, gap(10.0)).unwrap();

    let entries: Vec<(&Group, &DurationResult)> =
        run.reports.iter().map(|r| (&r.group, &r.durations)).collect();

    let first = build_rollup(ctx.population(), &entries);
    let second = build_rollup(ctx.population(), &entries);
    assert_eq!(first, second);
    assert_eq!(first, run.rollup);
}

#[test]
fn test_larger_gap_never_decreases_duration() {
    let group = Group::day(1, None, [1]);
    let minutes = [0, 3, 9, 21, 22, 40, 41, 75];
    let events: Vec<Event> = minutes
        .iter()
        .map(|m| Event::new("dave", 1, Verb::Interacted, at(*m)))
        .collect();
    let refs: Vec<&Event> = events.iter().collect();
    let pop = population(&["dave"]);

    let mut previous = 0.0;
    for threshold in [1.0, 2.0, 5.0, 6.5, 10.0, 12.0, 18.0, 35.0, 60.0] {
        let current = estimate_durations(&group, &refs, &pop, gap(threshold))
            .unwrap()
            .minutes_for("dave");
        assert!(current >= previous, "gap {} decreased duration", threshold);
        previous = current;
    }
    // With the widest gap every delta counts
    assert_eq!(previous, 75.0);
}

#[test]
fn test_empty_population() {
    let everyone: Vec<String> = population(&["alice", "bob", "carol"]).into_iter().collect();
    let ctx = AnalysisContext::new(course_table(), &everyone);
    let strategy = GroupingStrategy::ExplicitIds(vec![101]);

    let err = run_analysis(&ctx, &strategy, gap(10.0)).unwrap_err();
    assert_eq!(err, EngineError::EmptyPopulation);
}
