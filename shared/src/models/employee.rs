//! Employee Model

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AppError;

/// Employee gender (`NULL` allowed, otherwise one of these)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Male => "Male",
            Self::Female => "Female",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "male" => Ok(Self::Male),
            "female" => Ok(Self::Female),
            other => Err(AppError::validation(format!(
                "gender must be Male or Female, got '{other}'"
            ))),
        }
    }
}

impl_text_column!(Gender);

/// Employee entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Employee {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub other_name: Option<String>,
    pub gender: Option<Gender>,
    pub date_of_birth: Option<NaiveDate>,
    /// Free-form phone as entered
    pub phone: Option<String>,
    /// E.164 twin of `phone`
    pub phone_e164: Option<String>,
    pub email: Option<String>,
    pub national_id: Option<String>,
    pub address: Option<String>,
    pub department_id: Option<i64>,
    /// Joined from departments
    #[cfg_attr(feature = "db", sqlx(default))]
    pub department_name: Option<String>,
    pub contract_url: Option<String>,
    /// Path relative to the file-store root
    pub contract_file_path: Option<String>,
    pub position: String,
    /// Free string; "active" (normalized) drives payroll inclusion
    pub employment_status: String,
    pub date_of_hire: NaiveDate,
    pub base_salary: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Employee {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn is_active(&self) -> bool {
        is_active_status(&self.employment_status)
    }
}

/// Whether an employment status counts as active (trimmed, case-insensitive)
pub fn is_active_status(status: &str) -> bool {
    status.trim().eq_ignore_ascii_case("active")
}

/// Create/update employee payload (dates as ISO strings)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmployeeInput {
    pub first_name: String,
    pub last_name: String,
    pub other_name: Option<String>,
    pub gender: Option<String>,
    pub date_of_birth: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub national_id: Option<String>,
    pub address: Option<String>,
    pub department_id: Option<i64>,
    pub contract_url: Option<String>,
    pub position: String,
    pub employment_status: String,
    pub date_of_hire: String,
    pub base_salary: Decimal,
}

/// Validated employee fields ready for persistence
#[derive(Debug, Clone)]
pub struct EmployeeData {
    pub first_name: String,
    pub last_name: String,
    pub other_name: Option<String>,
    pub gender: Option<Gender>,
    pub date_of_birth: Option<NaiveDate>,
    pub phone: Option<String>,
    pub phone_e164: Option<String>,
    pub email: Option<String>,
    pub national_id: Option<String>,
    pub address: Option<String>,
    pub department_id: Option<i64>,
    pub contract_url: Option<String>,
    pub position: String,
    pub employment_status: String,
    pub date_of_hire: NaiveDate,
    pub base_salary: Decimal,
}

/// Employee list query
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmployeeQuery {
    /// Case-insensitive substring over first/last name, email and position
    pub q: Option<String>,
    pub department_id: Option<i64>,
    pub employment_status: Option<String>,
    #[serde(flatten)]
    pub page: super::PageRequest,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gender_parse() {
        assert_eq!("male".parse::<Gender>().unwrap(), Gender::Male);
        assert_eq!(" Female ".parse::<Gender>().unwrap(), Gender::Female);
        assert!("other".parse::<Gender>().is_err());
    }

    #[test]
    fn test_active_status() {
        assert!(is_active_status("Active"));
        assert!(is_active_status(" active "));
        assert!(!is_active_status("terminated"));
    }
}
