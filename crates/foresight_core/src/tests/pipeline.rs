//! End-to-end processing scenarios
//!
//! Each test drives the full orchestrator path: validation, normalization,
//! expansion/degrade, caching. Fixtures mirror how the UI/store layer
//! actually declares events.

use crate::error::ProcessError;
use crate::expand::ExpansionMode;
use crate::model::{
    AccountKind, CashFlowFields, EventKind, EventPayload, Frequency, RawEvent, RealEstateFields,
};
use crate::process::{EventProcessor, ProcessOptions, looks_already_canonical};

fn options() -> ProcessOptions {
    ProcessOptions::new(jiff::civil::date(2025, 1, 1))
}

fn annual_salary(id: u32, amount: f64) -> RawEvent {
    RawEvent::cash_flow(
        id,
        "Salary",
        EventKind::Salary,
        CashFlowFields {
            amount: Some(amount),
            frequency: Some(Frequency::Annually),
            inflation_adjusted: Some(false),
            ..Default::default()
        },
    )
}

#[test]
fn test_annual_income_over_twenty_years() {
    // $120k/yr salary, 20-year horizon, no growth: 240 monthly
    // occurrences of exactly $10k each.
    let mut processor = EventProcessor::new();
    let result = processor
        .process(&[annual_salary(1, 120_000.0)], &options().horizon_years(20))
        .unwrap();

    assert_eq!(result.stats.mode, ExpansionMode::Expanded);
    assert_eq!(result.events.len(), 240);
    assert!(result.events.iter().all(|ev| ev.amount == 10_000.0));
    assert!(result.events.iter().all(|ev| ev.frequency == Frequency::Monthly));
    assert!(
        result.events.iter().all(|ev| ev.target_account == Some(AccountKind::Cash)),
        "income routes to the cash bucket"
    );

    // Occurrences cover months 0..=239 in generation order.
    let offsets: Vec<u32> = result.events.iter().map(|ev| ev.month_offset).collect();
    assert_eq!(offsets, (0..240).collect::<Vec<_>>());
}

#[test]
fn test_contribution_without_target_rejects_batch() {
    // A $500/month generic contribution with no target account must be
    // rejected by the gate, never defaulted to a bucket.
    let mut processor = EventProcessor::new();
    let contribution = RawEvent::cash_flow(
        1,
        "Monthly investing",
        EventKind::ScheduledContribution,
        CashFlowFields {
            monthly_amount: Some(500.0),
            frequency: Some(Frequency::Monthly),
            ..Default::default()
        },
    );

    let err = processor.process(&[contribution], &options()).unwrap_err();
    match err {
        ProcessError::Validation(rejected) => {
            assert_eq!(rejected.report.stats.critical_count, 1);
            assert!(
                rejected.report.errors[0].message.contains("valid targets"),
                "the rejection names the valid targets"
            );
        }
        other => panic!("expected a validation rejection, got {other}"),
    }
}

#[test]
fn test_mixed_batch_keeps_generation_order_per_event() {
    let events = vec![
        annual_salary(1, 120_000.0),
        RawEvent::cash_flow(
            2,
            "Groceries",
            EventKind::GroceriesExpense,
            CashFlowFields {
                amount: Some(250.0),
                frequency: Some(Frequency::Weekly),
                ..Default::default()
            },
        ),
        RawEvent {
            id: crate::model::EventId(3),
            name: "Lake house".to_string(),
            kind: EventKind::HomePurchase,
            payload: EventPayload::RealEstate(RealEstateFields {
                property_value: Some(400_000.0),
                down_payment: Some(80_000.0),
                closing_costs: Some(6_000.0),
                ..Default::default()
            }),
            start: Some(2030),
            end: None,
        },
    ];

    let mut processor = EventProcessor::new();
    let result = processor.process(&events, &options().horizon_years(10)).unwrap();

    // 120 salary months + 120 aggregated weekly months + 1 purchase.
    assert_eq!(result.events.len(), 241);

    // Weekly flows carry the monthly-equivalent aggregate.
    let groceries: Vec<_> = result
        .events
        .iter()
        .filter(|ev| ev.id == crate::model::EventId(2))
        .collect();
    assert_eq!(groceries.len(), 120);
    let expected_monthly = 250.0 * 52.0 / 12.0;
    assert!((groceries[0].amount - expected_monthly).abs() < 1e-9);
    assert_eq!(groceries[0].frequency, Frequency::Monthly);

    // The 2030 purchase resolved to a relative offset and lands once.
    let purchase: Vec<_> = result
        .events
        .iter()
        .filter(|ev| ev.id == crate::model::EventId(3))
        .collect();
    assert_eq!(purchase.len(), 1);
    assert_eq!(purchase[0].month_offset, 60);
    assert_eq!(purchase[0].amount, 86_000.0);
    assert_eq!(purchase[0].frequency, Frequency::OnceOff);
}

#[test]
fn test_memory_breaker_degrades_whole_batch() {
    // One oversized stream puts every event in recurring mode, including
    // the small ones: the degrade is all-or-nothing.
    let events = vec![
        annual_salary(1, 120_000.0),
        RawEvent::cash_flow(
            2,
            "Rent",
            EventKind::RentPayment,
            CashFlowFields {
                monthly_amount: Some(2_000.0),
                ..Default::default()
            },
        ),
    ];

    let mut processor = EventProcessor::new();
    let result = processor
        .process(&events, &options().horizon_years(80).occurrence_ceiling(1_000))
        .unwrap();

    assert_eq!(result.stats.mode, ExpansionMode::Recurring);
    assert_eq!(result.events.len(), events.len(), "exactly one descriptor per source event");
    assert!(result.events.iter().all(|ev| ev.metadata.recurring));
    assert!(
        result
            .events
            .iter()
            .all(|ev| matches!(ev.frequency, Frequency::Monthly | Frequency::OnceOff)),
        "descriptors still only use the sentinel frequencies"
    );
}

#[test]
fn test_output_frequencies_are_sentinels_only() {
    let events = vec![
        annual_salary(1, 120_000.0),
        RawEvent::cash_flow(
            2,
            "Umbrella policy",
            EventKind::InsurancePremium,
            CashFlowFields {
                amount: Some(1_800.0),
                frequency: Some(Frequency::Annually),
                ..Default::default()
            },
        ),
        RawEvent::cash_flow(
            3,
            "Estimated taxes",
            EventKind::QuarterlyEstimatedTax,
            CashFlowFields {
                amount: Some(4_500.0),
                frequency: Some(Frequency::Quarterly),
                ..Default::default()
            },
        ),
    ];

    let mut processor = EventProcessor::new();
    let result = processor.process(&events, &options().horizon_years(5)).unwrap();
    assert!(
        result
            .events
            .iter()
            .all(|ev| matches!(ev.frequency, Frequency::Monthly | Frequency::OnceOff)),
        "the engine never sees weekly/quarterly/annual directly"
    );

    // Annual premium hits yearly with the full amount.
    let premiums: Vec<_> = result
        .events
        .iter()
        .filter(|ev| ev.id == crate::model::EventId(2))
        .collect();
    assert_eq!(premiums.len(), 5);
    assert!(premiums.iter().all(|ev| ev.amount == 1_800.0));

    // Quarterly taxes spread into monthly-equivalent occurrences.
    let taxes: Vec<_> = result
        .events
        .iter()
        .filter(|ev| ev.id == crate::model::EventId(3))
        .collect();
    assert_eq!(taxes.len(), 60);
    assert!((taxes[0].amount - 1_500.0).abs() < 1e-9);
}

#[test]
fn test_reprocessing_guard_on_own_output() {
    let mut processor = EventProcessor::new();
    let result = processor
        .process(&[annual_salary(1, 120_000.0)], &options().horizon_years(20))
        .unwrap();
    assert!(
        looks_already_canonical(&result.events),
        "a caller can detect output it already processed"
    );
}

#[test]
fn test_frozen_growth_bakes_one_amount_into_every_occurrence() {
    // Plan authored two years before the simulation starts; the salary
    // tracks inflation by default.
    let salary = RawEvent::cash_flow(
        1,
        "Salary",
        EventKind::Salary,
        CashFlowFields {
            amount: Some(120_000.0),
            frequency: Some(Frequency::Annually),
            ..Default::default()
        },
    );
    let opts = options()
        .horizon_years(10)
        .inflation_rate(0.03)
        .authored_on(jiff::civil::date(2023, 1, 1));

    let mut processor = EventProcessor::new();
    let result = processor.process(&[salary.clone()], &opts).unwrap();

    let expected = 10_000.0 * 1.03f64.powi(2);
    assert!(
        result.events.iter().all(|ev| (ev.amount - expected).abs() < 1e-6),
        "frozen growth reuses the normalization-time amount everywhere"
    );

    // Per-occurrence mode keeps compounding across the horizon instead.
    let per_occurrence = processor
        .process(
            &[salary],
            &opts.clone().growth_mode(crate::expand::GrowthMode::PerOccurrence),
        )
        .unwrap();
    let first = per_occurrence.events.first().unwrap();
    let last = per_occurrence.events.last().unwrap();
    assert!((first.amount - expected).abs() < 1e-6);
    let expected_last = expected * 1.03f64.powf(119.0 / 12.0);
    assert!(
        (last.amount - expected_last).abs() < 1e-6,
        "got {}, expected {expected_last}",
        last.amount
    );

    // Month offsets resolve to calendar slots against the start date.
    assert_eq!(first.calendar_slot(opts.start_date), (2025, 1));
    assert_eq!(last.calendar_slot(opts.start_date), (2034, 12));
}

#[test]
fn test_raw_event_serde_round_trip() {
    // The UI/store layer exchanges these as JSON with sparse fields.
    let json = r#"{
        "id": 7,
        "name": "Side gig",
        "kind": "self_employment_income",
        "payload": {
            "shape": "cash_flow",
            "annual_amount": 18000.0,
            "inflation_adjusted": false
        },
        "start": 2026
    }"#;
    let raw: RawEvent = serde_json::from_str(json).unwrap();
    assert_eq!(raw.kind, EventKind::SelfEmploymentIncome);
    assert_eq!(raw.start, Some(2026));
    assert_eq!(raw.end, None);

    let mut processor = EventProcessor::new();
    let result = processor.process(&[raw.clone()], &options().horizon_years(5)).unwrap();
    let occurrences: Vec<_> = result.events.iter().filter(|ev| ev.id == raw.id).collect();
    assert_eq!(occurrences.len(), 48, "starts 12 months in, runs to the 5-year horizon");
    assert_eq!(occurrences[0].month_offset, 12);
    assert!((occurrences[0].amount - 1_500.0).abs() < 1e-9);

    let round_trip: RawEvent =
        serde_json::from_str(&serde_json::to_string(&raw).unwrap()).unwrap();
    assert_eq!(round_trip, raw);
}
