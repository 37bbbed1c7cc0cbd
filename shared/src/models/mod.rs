//! Data models
//!
//! Shared between hrpro-core and the desktop shell.
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! All IDs are `i64` (Postgres BIGSERIAL).

/// Bind a string-backed enum (`as_str` + `FromStr`) to Postgres TEXT.
#[cfg(feature = "db")]
macro_rules! impl_text_column {
    ($ty:ty) => {
        impl sqlx::Type<sqlx::Postgres> for $ty {
            fn type_info() -> sqlx::postgres::PgTypeInfo {
                <String as sqlx::Type<sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
                <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
            }
        }

        impl<'r> sqlx::Decode<'r, sqlx::Postgres> for $ty {
            fn decode(
                value: sqlx::postgres::PgValueRef<'r>,
            ) -> Result<Self, sqlx::error::BoxDynError> {
                let raw = <&str as sqlx::Decode<'r, sqlx::Postgres>>::decode(value)?;
                Ok(raw.parse::<$ty>()?)
            }
        }

        impl<'q> sqlx::Encode<'q, sqlx::Postgres> for $ty {
            fn encode_by_ref(
                &self,
                buf: &mut sqlx::postgres::PgArgumentBuffer,
            ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
                <&str as sqlx::Encode<'q, sqlx::Postgres>>::encode_by_ref(&self.as_str(), buf)
            }
        }
    };
}

#[cfg(not(feature = "db"))]
macro_rules! impl_text_column {
    ($ty:ty) => {};
}

pub mod attendance;
pub mod audit;
pub mod dashboard;
pub mod department;
pub mod employee;
pub mod export;
pub mod leave;
pub mod pagination;
pub mod payroll;
pub mod report;
pub mod role;
pub mod settings;
pub mod user;

// Re-exports
pub use attendance::*;
pub use audit::*;
pub use dashboard::*;
pub use department::*;
pub use employee::*;
pub use export::*;
pub use leave::*;
pub use pagination::*;
pub use payroll::*;
pub use report::*;
pub use role::*;
pub use settings::*;
pub use user::*;
