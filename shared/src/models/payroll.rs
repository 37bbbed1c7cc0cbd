//! Payroll Model

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AppError;

/// Batch status; only moves Draft -> Approved -> Locked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PayrollStatus {
    Draft,
    Approved,
    Locked,
}

impl PayrollStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "Draft",
            Self::Approved => "Approved",
            Self::Locked => "Locked",
        }
    }

    /// Approved or Locked
    pub fn is_exportable(&self) -> bool {
        matches!(self, Self::Approved | Self::Locked)
    }
}

impl fmt::Display for PayrollStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PayrollStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "draft" => Ok(Self::Draft),
            "approved" => Ok(Self::Approved),
            "locked" => Ok(Self::Locked),
            other => Err(AppError::validation(format!("unknown payroll status '{other}'"))),
        }
    }
}

impl_text_column!(PayrollStatus);

/// Monthly payroll batch
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct PayrollBatch {
    pub id: i64,
    /// YYYY-MM, unique
    pub month: String,
    pub status: PayrollStatus,
    pub created_by: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub approved_by: Option<i64>,
    pub approved_at: Option<DateTime<Utc>>,
    pub locked_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

/// Per-employee entry in a batch
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct PayrollEntry {
    pub id: i64,
    pub batch_id: i64,
    pub employee_id: i64,
    #[cfg_attr(feature = "db", sqlx(default))]
    pub employee_name: Option<String>,
    pub base_salary: Decimal,
    pub allowances_total: Decimal,
    pub deductions_total: Decimal,
    pub tax_total: Decimal,
    /// base + allowances
    pub gross_pay: Decimal,
    /// gross - deductions - tax
    pub net_pay: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Batch with its entries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayrollBatchDetail {
    pub batch: PayrollBatch,
    pub entries: Vec<PayrollEntry>,
}

/// Amount edit payload
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EntryAmountsInput {
    pub allowances: Decimal,
    pub deductions: Decimal,
    pub tax: Decimal,
}

/// Entry amounts with gross/net derived from the inputs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayAmounts {
    pub base_salary: Decimal,
    pub allowances_total: Decimal,
    pub deductions_total: Decimal,
    pub tax_total: Decimal,
    pub gross_pay: Decimal,
    pub net_pay: Decimal,
}

impl PayAmounts {
    pub fn compute(base: Decimal, allowances: Decimal, deductions: Decimal, tax: Decimal) -> Self {
        let gross = base + allowances;
        Self {
            base_salary: base,
            allowances_total: allowances,
            deductions_total: deductions,
            tax_total: tax,
            gross_pay: gross,
            net_pay: gross - deductions - tax,
        }
    }

    /// Fresh entry: no allowances, deductions or tax
    pub fn base_only(base: Decimal) -> Self {
        Self::compute(base, Decimal::ZERO, Decimal::ZERO, Decimal::ZERO)
    }
}

/// Row for the entry generator
#[derive(Debug, Clone)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct ActiveEmployeeSalary {
    pub employee_id: i64,
    pub base_salary: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_pay_amounts() {
        let amounts = PayAmounts::compute(dec!(1000.00), dec!(250.50), dec!(100.25), dec!(80.10));
        assert_eq!(amounts.gross_pay, dec!(1250.50));
        assert_eq!(amounts.net_pay, dec!(1070.15));
    }

    #[test]
    fn test_base_only() {
        let amounts = PayAmounts::base_only(dec!(1500));
        assert_eq!(amounts.gross_pay, dec!(1500));
        assert_eq!(amounts.net_pay, dec!(1500));
    }

    #[test]
    fn test_exportable() {
        assert!(!PayrollStatus::Draft.is_exportable());
        assert!(PayrollStatus::Approved.is_exportable());
        assert!(PayrollStatus::Locked.is_exportable());
    }
}
