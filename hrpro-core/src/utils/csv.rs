//! CSV helpers for exports

use rust_decimal::{Decimal, RoundingStrategy};
use shared::error::{AppError, AppResult};

/// Money with exactly two decimal places
pub fn money(value: Decimal) -> String {
    format!(
        "{:.2}",
        value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    )
}

/// Write a header and rows into an in-memory UTF-8 CSV (no BOM)
pub fn write_csv<I>(header: &[&str], rows: I) -> AppResult<Vec<u8>>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let mut writer = ::csv::Writer::from_writer(Vec::new());
    writer.write_record(header).map_err(csv_error)?;
    for row in rows {
        writer.write_record(&row).map_err(csv_error)?;
    }
    writer
        .into_inner()
        .map_err(|e| AppError::internal(format!("csv flush failed: {e}")))
}

fn csv_error(err: ::csv::Error) -> AppError {
    AppError::internal(format!("csv write failed: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_money_two_places() {
        assert_eq!(money(dec!(1500)), "1500.00");
        assert_eq!(money(dec!(1070.155)), "1070.16");
        assert_eq!(money(dec!(-3.5)), "-3.50");
    }

    #[test]
    fn test_write_csv_quotes_commas() {
        let bytes = write_csv(
            &["Employee ID", "Employee Name"],
            vec![vec!["7".to_string(), "Doe, Jane".to_string()]],
        )
        .unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(text, "Employee ID,Employee Name\n7,\"Doe, Jane\"\n");
    }
}
