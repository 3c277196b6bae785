use calgrid::calendar::{expand_with_id, has_conflict};
use calgrid::{EventTemplate, RecurrenceKind, RecurrenceRule, TimeSlot};
use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn template(rule: RecurrenceRule) -> EventTemplate {
    let start = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap().and_hms_opt(9, 0, 0).unwrap();
    let mut template = EventTemplate::new("Bench", start);
    template.recurrence = Some(rule);
    template
}

fn bench_expand(c: &mut Criterion) {
    let daily = template(RecurrenceRule::new(RecurrenceKind::Daily));
    let weekdays = template(RecurrenceRule::new(RecurrenceKind::Weekly).on_days(&[1, 2, 3, 4, 5]).times(1000));
    let monthly = template(RecurrenceRule::new(RecurrenceKind::Monthly));

    c.bench_function("expand daily default cap", |b| b.iter(|| expand_with_id(black_box(&daily), "d")));
    c.bench_function("expand weekdays", |b| b.iter(|| expand_with_id(black_box(&weekdays), "w")));
    c.bench_function("expand monthly", |b| b.iter(|| expand_with_id(black_box(&monthly), "m")));
}

fn bench_conflicts(c: &mut Criterion) {
    let events = expand_with_id(
        &template(
            RecurrenceRule::new(RecurrenceKind::Daily)
                .until(NaiveDate::from_ymd_opt(2027, 1, 1).unwrap())
                .times(1000),
        ),
        "existing",
    );
    let probe = TimeSlot::new(
        NaiveDate::from_ymd_opt(2026, 1, 1).unwrap().and_hms_opt(9, 30, 0).unwrap(),
        30,
    );
    c.bench_function("conflict scan 1000 events", |b| {
        b.iter(|| has_conflict(black_box(&probe), black_box(&events), None))
    });
}

criterion_group!(benches, bench_expand, bench_conflicts);
criterion_main!(benches);
