mod common;

use common::{Harness, claims};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use shared::error::ErrorCode;
use shared::models::{EntryAmountsInput, PayrollStatus};

#[tokio::test]
async fn batch_lifecycle() {
    let harness = Harness::new();
    harness.seed_employees(2).await;
    let finance = claims(7, "finance_officer");
    let payroll = &harness.state.payroll;

    let batch = payroll.create(&finance, "2026-02").await.unwrap();
    assert_eq!(batch.status, PayrollStatus::Draft);
    assert_eq!(
        payroll.create(&finance, "2026-02").await.unwrap_err().code,
        ErrorCode::DuplicateMonth
    );

    let detail = payroll.generate(&finance, batch.id).await.unwrap();
    assert_eq!(detail.entries.len(), 2);
    let entry = &detail.entries[0];
    assert_eq!(entry.gross_pay, dec!(1500000.00));

    let edited = payroll
        .update_entry(
            &finance,
            entry.id,
            EntryAmountsInput {
                allowances: dec!(100000),
                deductions: dec!(50000),
                tax: dec!(200000),
            },
        )
        .await
        .unwrap();
    assert_eq!(edited.gross_pay, dec!(1600000.00));
    assert_eq!(edited.net_pay, dec!(1350000.00));

    assert_eq!(
        payroll.lock(&finance, batch.id).await.unwrap_err().code,
        ErrorCode::InvalidTransition
    );
    assert_eq!(
        payroll.export_csv(&finance, batch.id).await.unwrap_err().code,
        ErrorCode::ExportNotAllowed
    );

    assert_eq!(payroll.approve(&finance, batch.id).await.unwrap().status, PayrollStatus::Approved);
    let locked = payroll.lock(&finance, batch.id).await.unwrap();
    assert_eq!(locked.status, PayrollStatus::Locked);
    assert!(locked.locked_at.is_some());

    let err = payroll
        .update_entry(
            &finance,
            entry.id,
            EntryAmountsInput {
                allowances: Decimal::ZERO,
                deductions: Decimal::ZERO,
                tax: Decimal::ZERO,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ImmutableBatch);
    assert_eq!(
        payroll.generate(&finance, batch.id).await.unwrap_err().code,
        ErrorCode::ImmutableBatch
    );

    let file = payroll.export_csv(&finance, batch.id).await.unwrap();
    let text = String::from_utf8(file.content).unwrap();
    assert!(text.starts_with("Employee ID,Employee Name,Base Salary"));
    assert_eq!(text.lines().count(), 3);
}

#[tokio::test]
async fn failed_generation_keeps_previous_entries() {
    let harness = Harness::new();
    harness.seed_employees(2).await;
    let finance = claims(7, "finance_officer");
    let payroll = &harness.state.payroll;

    let batch = payroll.create(&finance, "2026-03").await.unwrap();
    let before = payroll.generate(&finance, batch.id).await.unwrap().entries;
    assert_eq!(before.len(), 2);

    harness.store.fail_payroll_entry_insert(2);
    assert!(payroll.generate(&finance, batch.id).await.is_err());

    let after = payroll.get(&finance, batch.id).await.unwrap().entries;
    let ids = |entries: &[shared::models::PayrollEntry]| entries.iter().map(|e| e.id).collect::<Vec<_>>();
    assert_eq!(ids(&after), ids(&before));

    harness.store.clear_faults();
    assert_eq!(payroll.generate(&finance, batch.id).await.unwrap().entries.len(), 2);
}

#[tokio::test]
async fn payroll_is_finance_only() {
    let harness = Harness::new();
    let err = harness
        .state
        .payroll
        .create(&claims(3, "hr_officer"), "2026-04")
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::Forbidden);
    assert!(harness.state.payroll.list(&claims(1, "admin")).await.unwrap().is_empty());
}
