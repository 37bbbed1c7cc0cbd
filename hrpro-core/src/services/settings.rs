//! Company settings and the branding logo

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{
    AppSettings, CompanyProfile, CurrencySettings, LunchDefaults, PayrollDisplay, SettingKey,
    SettingsUpdate, StoredFile, validate_lunch_amounts,
};
use shared::util::clean_optional;

use super::roles;
use crate::audit::{AuditEvent, AuditRecorder, noop_recorder};
use crate::auth::{Claims, require_role};
use crate::db::{SettingsStore, Store};
use crate::storage::{FileStore, extension_of, logo_path};
use crate::utils::validation::{
    MAX_NAME_LEN, validate_currency_code, validate_decimals, validate_email, validate_required_text,
};

/// Upper bound for an uploaded logo
pub const MAX_LOGO_BYTES: usize = 5 * 1024 * 1024;

const LOGO_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "svg", "webp"];

/// Read every setting, filling defaults for missing or unreadable keys
pub async fn load_settings(store: &dyn Store) -> AppResult<AppSettings> {
    let mut settings = AppSettings::default();
    for row in store.list_settings().await? {
        let Some(key) = SettingKey::ALL.into_iter().find(|k| k.as_str() == row.key) else {
            tracing::debug!(key = %row.key, "Ignoring unknown setting key");
            continue;
        };
        match key {
            SettingKey::CompanyProfile => decode_into(&row.key, row.value, &mut settings.company_profile),
            SettingKey::Currency => decode_into(&row.key, row.value, &mut settings.currency),
            SettingKey::LunchDefaults => decode_into(&row.key, row.value, &mut settings.lunch_defaults),
            SettingKey::PayrollDisplay => decode_into(&row.key, row.value, &mut settings.payroll_display),
        }
    }
    Ok(settings)
}

fn decode_into<T: DeserializeOwned>(key: &str, value: serde_json::Value, slot: &mut T) {
    match serde_json::from_value(value) {
        Ok(parsed) => *slot = parsed,
        Err(e) => tracing::warn!(key, error = %e, "Stored setting is malformed, using default"),
    }
}

pub struct SettingsService {
    store: Arc<dyn Store>,
    files: FileStore,
    audit: Arc<dyn AuditRecorder>,
}

impl SettingsService {
    pub fn new(store: Arc<dyn Store>, files: FileStore) -> Self {
        Self {
            store,
            files,
            audit: noop_recorder(),
        }
    }

    pub fn set_audit_recorder(&mut self, recorder: Arc<dyn AuditRecorder>) {
        self.audit = recorder;
    }

    /// Open to any authenticated caller
    pub async fn get(&self, _claims: &Claims) -> AppResult<AppSettings> {
        load_settings(self.store.as_ref()).await
    }

    pub async fn update(&self, claims: &Claims, update: SettingsUpdate) -> AppResult<AppSettings> {
        require_role(claims, roles::ADMIN_ONLY)?;

        let company = update.company_profile.map(validate_company).transpose()?;
        let currency = update.currency.map(validate_currency).transpose()?;
        if let Some(lunch) = &update.lunch_defaults {
            validate_lunch(lunch)?;
        }
        if let Some(display) = &update.payroll_display {
            validate_decimals("payroll decimals", display.decimals)?;
        }

        let mut changed = Vec::new();
        if let Some(mut company) = company {
            // the logo is managed by its own upload/remove calls
            company.logo_path = load_settings(self.store.as_ref()).await?.company_profile.logo_path;
            self.put(claims, SettingKey::CompanyProfile, &company).await?;
            changed.push(SettingKey::CompanyProfile.as_str());
        }
        if let Some(currency) = currency {
            self.put(claims, SettingKey::Currency, &currency).await?;
            changed.push(SettingKey::Currency.as_str());
        }
        if let Some(lunch) = update.lunch_defaults {
            self.put(claims, SettingKey::LunchDefaults, &lunch).await?;
            changed.push(SettingKey::LunchDefaults.as_str());
        }
        if let Some(display) = update.payroll_display {
            self.put(claims, SettingKey::PayrollDisplay, &display).await?;
            changed.push(SettingKey::PayrollDisplay.as_str());
        }

        if !changed.is_empty() {
            tracing::info!(keys = ?changed, "Settings updated");
            self.audit
                .record(
                    AuditEvent::new("settings.update", "app_settings")
                        .actor(claims.user_id)
                        .metadata(json!({ "keys": changed })),
                )
                .await;
        }
        load_settings(self.store.as_ref()).await
    }

    pub async fn upload_logo(&self, claims: &Claims, filename: &str, bytes: &[u8]) -> AppResult<CompanyProfile> {
        require_role(claims, roles::ADMIN_ONLY)?;
        if bytes.is_empty() {
            return Err(AppError::new(ErrorCode::EmptyFile));
        }
        if bytes.len() > MAX_LOGO_BYTES {
            return Err(AppError::with_message(
                ErrorCode::FileTooLarge,
                format!("logo exceeds {} bytes", MAX_LOGO_BYTES),
            ));
        }
        let ext = extension_of(filename).unwrap_or_default();
        if !LOGO_EXTENSIONS.contains(&ext.as_str()) {
            return Err(AppError::with_message(
                ErrorCode::UnsupportedFileFormat,
                format!("logo must be one of {}", LOGO_EXTENSIONS.join(", ")),
            ));
        }

        let path = logo_path(filename);
        self.files.put(&path, bytes).await?;

        let mut profile = load_settings(self.store.as_ref()).await?.company_profile;
        let previous = profile.logo_path.replace(path.clone());
        if let Err(e) = self.put(claims, SettingKey::CompanyProfile, &profile).await {
            let _ = self.files.delete(&path).await;
            return Err(e);
        }
        if let Some(previous) = previous {
            self.remove_file_best_effort(&previous).await;
        }

        self.audit
            .record(
                AuditEvent::new("settings.logo.upload", "app_settings")
                    .actor(claims.user_id)
                    .metadata(json!({ "path": path, "size": bytes.len() })),
            )
            .await;
        Ok(profile)
    }

    pub async fn read_logo(&self, _claims: &Claims) -> AppResult<StoredFile> {
        let profile = load_settings(self.store.as_ref()).await?.company_profile;
        let path = profile
            .logo_path
            .ok_or_else(|| AppError::not_found("company logo"))?;
        self.files.get(&path).await
    }

    pub async fn remove_logo(&self, claims: &Claims) -> AppResult<CompanyProfile> {
        require_role(claims, roles::ADMIN_ONLY)?;
        let mut profile = load_settings(self.store.as_ref()).await?.company_profile;
        let Some(path) = profile.logo_path.take() else {
            return Ok(profile);
        };
        self.files.delete(&path).await?;
        self.put(claims, SettingKey::CompanyProfile, &profile).await?;

        self.audit
            .record(
                AuditEvent::new("settings.logo.remove", "app_settings")
                    .actor(claims.user_id)
                    .metadata(json!({ "path": path })),
            )
            .await;
        Ok(profile)
    }

    async fn put<T: Serialize>(&self, claims: &Claims, key: SettingKey, value: &T) -> AppResult<()> {
        let value = serde_json::to_value(value)
            .map_err(|e| AppError::internal(format!("serialize {}: {e}", key.as_str())))?;
        self.store
            .upsert_setting(key, &value, Some(claims.user_id))
            .await?;
        Ok(())
    }

    async fn remove_file_best_effort(&self, path: &str) {
        if let Err(e) = self.files.delete(path).await {
            tracing::warn!(path, error = %e, "Failed to remove previous logo");
        }
    }
}

fn validate_company(mut company: CompanyProfile) -> AppResult<CompanyProfile> {
    company.name = company.name.trim().to_string();
    validate_required_text(&company.name, "company name", MAX_NAME_LEN)?;
    company.address = clean_optional(company.address);
    company.phone = clean_optional(company.phone);
    company.email = clean_optional(company.email);
    if let Some(email) = &company.email {
        validate_email(email)?;
    }
    Ok(company)
}

fn validate_currency(mut currency: CurrencySettings) -> AppResult<CurrencySettings> {
    currency.code = currency.code.trim().to_string();
    currency.symbol = currency.symbol.trim().to_string();
    validate_currency_code(&currency.code)?;
    if currency.symbol.is_empty() {
        return Err(AppError::validation("currency symbol is required"));
    }
    validate_decimals("currency decimals", currency.decimals)?;
    Ok(currency)
}

fn validate_lunch(lunch: &LunchDefaults) -> AppResult<()> {
    validate_lunch_amounts(lunch.plate_cost_amount, lunch.staff_contribution_amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;

    fn admin() -> Claims {
        Claims::for_user(1, "root", "admin")
    }

    fn service(dir: &std::path::Path) -> SettingsService {
        SettingsService::new(Arc::new(MemoryStore::new()), FileStore::new(dir))
    }

    #[tokio::test]
    async fn test_defaults_on_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let settings = service(dir.path()).get(&admin()).await.unwrap();
        assert_eq!(settings, AppSettings::default());
    }

    #[tokio::test]
    async fn test_partial_update() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(dir.path());
        let updated = svc
            .update(
                &admin(),
                SettingsUpdate {
                    currency: Some(CurrencySettings {
                        code: "USD".into(),
                        symbol: "$".into(),
                        decimals: 2,
                    }),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.currency.code, "USD");
        assert_eq!(updated.lunch_defaults, LunchDefaults::default());
    }

    #[tokio::test]
    async fn test_validation_rules() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(dir.path());
        let bad_code = SettingsUpdate {
            currency: Some(CurrencySettings {
                code: "usd".into(),
                symbol: "$".into(),
                decimals: 2,
            }),
            ..Default::default()
        };
        assert!(svc.update(&admin(), bad_code).await.is_err());

        let bad_lunch = SettingsUpdate {
            lunch_defaults: Some(LunchDefaults {
                plate_cost_amount: 0,
                staff_contribution_amount: 0,
            }),
            ..Default::default()
        };
        assert!(svc.update(&admin(), bad_lunch).await.is_err());

        let huge_lunch = SettingsUpdate {
            lunch_defaults: Some(LunchDefaults {
                plate_cost_amount: i64::MAX / 2,
                staff_contribution_amount: 0,
            }),
            ..Default::default()
        };
        let err = svc.update(&admin(), huge_lunch).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);

        let bad_display = SettingsUpdate {
            payroll_display: Some(PayrollDisplay { decimals: 7 }),
            ..Default::default()
        };
        assert!(svc.update(&admin(), bad_display).await.is_err());
    }

    #[tokio::test]
    async fn test_non_admin_cannot_write() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(dir.path());
        let hr = Claims::for_user(2, "amina", "hr_officer");
        let err = svc.update(&hr, SettingsUpdate::default()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);
        assert!(svc.get(&hr).await.is_ok());
    }

    #[tokio::test]
    async fn test_logo_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(dir.path());

        let profile = svc.upload_logo(&admin(), "../Brand Logo.png", b"png").await.unwrap();
        let path = profile.logo_path.clone().unwrap();
        assert!(path.starts_with("branding/"));
        assert!(path.ends_with("Brand_Logo.png"));

        let file = svc.read_logo(&admin()).await.unwrap();
        assert_eq!(file.bytes, b"png");
        assert_eq!(file.mime_type, "image/png");

        let replaced = svc.upload_logo(&admin(), "new.svg", b"<svg/>").await.unwrap();
        assert_ne!(replaced.logo_path, profile.logo_path);
        assert!(!dir.path().join(&path).exists());

        let cleared = svc.remove_logo(&admin()).await.unwrap();
        assert!(cleared.logo_path.is_none());
        assert_eq!(
            svc.read_logo(&admin()).await.unwrap_err().code,
            ErrorCode::NotFound
        );
    }

    #[tokio::test]
    async fn test_logo_rejections() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(dir.path());
        let err = svc.upload_logo(&admin(), "logo.png", b"").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::EmptyFile);
        let err = svc.upload_logo(&admin(), "logo.exe", b"x").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::UnsupportedFileFormat);
        let big = vec![0u8; MAX_LOGO_BYTES + 1];
        let err = svc.upload_logo(&admin(), "logo.png", &big).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::FileTooLarge);
    }
}
