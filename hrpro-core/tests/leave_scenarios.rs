mod common;

use common::{Harness, claims, date};
use hrpro_core::utils::time::working_days_between;
use shared::error::ErrorCode;
use shared::models::{
    ApplyLeaveInput, EntitlementInput, LeaveStatus, LeaveType, LeaveTypeInput, LockedDateInput,
};

async fn annual_type(harness: &Harness) -> LeaveType {
    harness
        .state
        .leave
        .create_type(
            &claims(100, "hr_officer"),
            LeaveTypeInput {
                name: "Annual".into(),
                paid: true,
                counts_toward_entitlement: true,
                requires_attachment: false,
                requires_approval: true,
                active: None,
            },
        )
        .await
        .unwrap()
}

fn apply_input(leave_type_id: i64, start: &str, end: &str) -> ApplyLeaveInput {
    ApplyLeaveInput {
        leave_type_id,
        start_date: start.into(),
        end_date: end.into(),
        reason: None,
    }
}

#[test]
fn working_days_skip_the_weekend() {
    // Friday through Tuesday
    assert_eq!(working_days_between(date("2026-02-20"), date("2026-02-24")).unwrap(), 3);
}

#[tokio::test]
async fn balance_arithmetic() {
    let harness = Harness::new();
    let employee = harness.seed_employees(1).await.pop().unwrap();
    let annual = annual_type(&harness).await;
    let hr = claims(100, "hr_officer");
    let me = claims(employee.id, "viewer");

    harness
        .state
        .leave
        .upsert_entitlement(
            &hr,
            EntitlementInput {
                employee_id: employee.id,
                year: 2026,
                total_days: 25,
                reserved_days: 3,
            },
        )
        .await
        .unwrap();

    let approved = harness
        .state
        .leave
        .apply(&me, apply_input(annual.id, "2026-03-02", "2026-03-06"))
        .await
        .unwrap();
    assert_eq!(approved.working_days, 5);
    harness.state.leave.approve(&hr, approved.id).await.unwrap();
    let pending = harness
        .state
        .leave
        .apply(&me, apply_input(annual.id, "2026-03-10", "2026-03-13"))
        .await
        .unwrap();
    assert_eq!(pending.working_days, 4);

    let balance = harness.state.leave.balance(&me, employee.id, 2026).await.unwrap();
    assert_eq!(
        (balance.approved_days, balance.pending_days, balance.available_days),
        (5, 4, 13)
    );

    // 14 working days against 13 available
    let err = harness
        .state
        .leave
        .apply(&me, apply_input(annual.id, "2026-05-04", "2026-05-21"))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InsufficientBalance);
}

#[tokio::test]
async fn leave_state_machine() {
    let harness = Harness::new();
    let staff = harness.seed_employees(2).await;
    let (owner, other) = (&staff[0], &staff[1]);
    let annual = annual_type(&harness).await;
    let hr = claims(100, "hr_officer");
    let me = claims(owner.id, "viewer");
    let not_me = claims(other.id, "viewer");
    harness
        .state
        .leave
        .upsert_entitlement(
            &hr,
            EntitlementInput {
                employee_id: owner.id,
                year: 2026,
                total_days: 20,
                reserved_days: 0,
            },
        )
        .await
        .unwrap();
    let leave = &harness.state.leave;

    // Pending: self-cancel allowed, someone else's is not
    let first = leave.apply(&me, apply_input(annual.id, "2026-04-06", "2026-04-07")).await.unwrap();
    assert_eq!(
        leave.cancel(&not_me, first.id).await.unwrap_err().code,
        ErrorCode::InvalidTransition
    );
    let cancelled = leave.cancel(&me, first.id).await.unwrap();
    assert_eq!(cancelled.status, LeaveStatus::Cancelled);
    assert_eq!(cancelled.approved_by, None);

    // Pending -> Approved by HR
    let second = leave.apply(&me, apply_input(annual.id, "2026-04-13", "2026-04-14")).await.unwrap();
    let approved = leave.approve(&hr, second.id).await.unwrap();
    assert_eq!(approved.status, LeaveStatus::Approved);
    assert_eq!(approved.approved_by, Some(100));

    // Approved: only a manager may cancel
    assert_eq!(
        leave.cancel(&me, second.id).await.unwrap_err().code,
        ErrorCode::InvalidTransition
    );
    assert_eq!(leave.cancel(&hr, second.id).await.unwrap().status, LeaveStatus::Cancelled);

    // terminal states stay terminal
    assert_eq!(
        leave.approve(&hr, second.id).await.unwrap_err().code,
        ErrorCode::InvalidTransition
    );
}

#[tokio::test]
async fn locked_dates_and_overlaps_block_requests() {
    let harness = Harness::new();
    let employee = harness.seed_employees(1).await.pop().unwrap();
    let annual = annual_type(&harness).await;
    let hr = claims(100, "hr_officer");
    let me = claims(employee.id, "viewer");
    let leave = &harness.state.leave;
    leave
        .upsert_entitlement(
            &hr,
            EntitlementInput {
                employee_id: employee.id,
                year: 2026,
                total_days: 20,
                reserved_days: 0,
            },
        )
        .await
        .unwrap();

    leave
        .upsert_locked_date(
            &hr,
            LockedDateInput {
                date: "2026-06-10".into(),
                reason: Some("Audit week".into()),
            },
        )
        .await
        .unwrap();
    let err = leave
        .apply(&me, apply_input(annual.id, "2026-06-08", "2026-06-12"))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::LockedDateConflict);

    let approved = leave.apply(&me, apply_input(annual.id, "2026-06-15", "2026-06-16")).await.unwrap();
    leave.approve(&hr, approved.id).await.unwrap();
    let err = leave
        .apply(&me, apply_input(annual.id, "2026-06-16", "2026-06-17"))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::OverlapApproved);

    // across a year boundary
    let err = leave
        .apply(&me, apply_input(annual.id, "2026-12-30", "2027-01-04"))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationFailed);
}
