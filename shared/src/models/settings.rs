//! Settings Model
//!
//! Typed views over the `app_settings` key/value table. Missing keys are
//! filled with defaults on read.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::attendance::{DEFAULT_PLATE_COST_AMOUNT, DEFAULT_STAFF_CONTRIBUTION_AMOUNT};

/// Setting keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettingKey {
    CompanyProfile,
    Currency,
    LunchDefaults,
    PayrollDisplay,
}

impl SettingKey {
    pub const ALL: [SettingKey; 4] = [
        Self::CompanyProfile,
        Self::Currency,
        Self::LunchDefaults,
        Self::PayrollDisplay,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CompanyProfile => "company_profile",
            Self::Currency => "currency",
            Self::LunchDefaults => "lunch_defaults",
            Self::PayrollDisplay => "payroll_display",
        }
    }
}

/// Raw stored setting
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct AppSetting {
    pub key: String,
    pub value: Value,
    pub updated_by: Option<i64>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    /// Relative path under the file-store root
    #[serde(default)]
    pub logo_path: Option<String>,
}

impl Default for CompanyProfile {
    fn default() -> Self {
        Self {
            name: "HISP HR System".to_string(),
            address: None,
            phone: None,
            email: None,
            logo_path: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencySettings {
    pub code: String,
    pub symbol: String,
    pub decimals: u8,
}

impl Default for CurrencySettings {
    fn default() -> Self {
        Self {
            code: "TZS".to_string(),
            symbol: "TZS".to_string(),
            decimals: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LunchDefaults {
    pub plate_cost_amount: i64,
    pub staff_contribution_amount: i64,
}

impl Default for LunchDefaults {
    fn default() -> Self {
        Self {
            plate_cost_amount: DEFAULT_PLATE_COST_AMOUNT,
            staff_contribution_amount: DEFAULT_STAFF_CONTRIBUTION_AMOUNT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayrollDisplay {
    pub decimals: u8,
}

impl Default for PayrollDisplay {
    fn default() -> Self {
        Self { decimals: 2 }
    }
}

/// All settings, defaults filled in
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSettings {
    pub company_profile: CompanyProfile,
    pub currency: CurrencySettings,
    pub lunch_defaults: LunchDefaults,
    pub payroll_display: PayrollDisplay,
}

/// Partial update; absent sections are left untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsUpdate {
    pub company_profile: Option<CompanyProfile>,
    pub currency: Option<CurrencySettings>,
    pub lunch_defaults: Option<LunchDefaults>,
    pub payroll_display: Option<PayrollDisplay>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = AppSettings::default();
        assert_eq!(settings.company_profile.name, "HISP HR System");
        assert_eq!(settings.currency.code, "TZS");
        assert_eq!(settings.currency.decimals, 0);
        assert_eq!(settings.lunch_defaults.plate_cost_amount, 12_000);
        assert_eq!(settings.lunch_defaults.staff_contribution_amount, 4_000);
        assert_eq!(settings.payroll_display.decimals, 2);
    }

    #[test]
    fn test_key_names() {
        let names: Vec<_> = SettingKey::ALL.iter().map(|k| k.as_str()).collect();
        assert_eq!(
            names,
            ["company_profile", "currency", "lunch_defaults", "payroll_display"]
        );
    }
}
