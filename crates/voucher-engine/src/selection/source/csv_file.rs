use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer};
use tracing::debug;

use super::{SourceError, VoucherSource};
use crate::selection::domain::Voucher;
use crate::selection::run::RunContext;

/// Reads a `vouchers` table export on every fetch.
///
/// Expected header: `id,code,min_order_amount,discount_amount,
/// discount_percentage,max_discount_amount`. Blank cells and `NULL` are read
/// as missing values; the three discount columns may be omitted entirely.
#[derive(Debug, Clone)]
pub struct CsvVoucherSource {
    path: PathBuf,
}

impl CsvVoucherSource {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl VoucherSource for CsvVoucherSource {
    fn fetch_vouchers(&self, run: &RunContext) -> Result<Vec<Voucher>, SourceError> {
        if let Some(reason) = run.interruption() {
            return Err(SourceError::Interrupted(reason));
        }

        let file = File::open(&self.path)?;
        let vouchers = parse_vouchers(file)?;
        debug!(path = %self.path.display(), count = vouchers.len(), "vouchers loaded");
        Ok(vouchers)
    }
}

pub fn parse_vouchers<R: Read>(reader: R) -> Result<Vec<Voucher>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    csv_reader
        .deserialize::<VoucherRow>()
        .map(|row| row.map(Voucher::from))
        .collect()
}

#[derive(Debug, Deserialize)]
struct VoucherRow {
    id: i64,
    code: String,
    min_order_amount: f64,
    #[serde(default, deserialize_with = "nullable")]
    discount_amount: Option<f64>,
    #[serde(default, deserialize_with = "nullable")]
    discount_percentage: Option<u32>,
    #[serde(default, deserialize_with = "nullable")]
    max_discount_amount: Option<f64>,
}

impl From<VoucherRow> for Voucher {
    fn from(row: VoucherRow) -> Self {
        Voucher {
            id: row.id,
            code: row.code,
            min_order_amount: row.min_order_amount,
            discount_amount: row.discount_amount,
            discount_percentage: row.discount_percentage,
            max_discount_amount: row.max_discount_amount,
        }
    }
}

fn nullable<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) if value.eq_ignore_ascii_case("null") => Ok(None),
        Some(value) => value
            .parse::<T>()
            .map(Some)
            .map_err(|err| serde::de::Error::custom(format!("'{value}': {err}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const EXPORT: &str = "\
id,code,min_order_amount,discount_amount,discount_percentage,max_discount_amount
1,FLAT50,100,50,,
2,PCT20,100,,20,90
3,BROKEN,0,NULL,NULL,NULL
";

    #[test]
    fn parses_nullable_discount_columns() {
        let vouchers = parse_vouchers(Cursor::new(EXPORT)).expect("export parses");

        assert_eq!(vouchers.len(), 3);
        assert_eq!(vouchers[0], Voucher::flat(1, "FLAT50", 100.0, 50.0));
        assert_eq!(
            vouchers[1],
            Voucher::percentage(2, "PCT20", 100.0, 20, Some(90.0))
        );
        assert_eq!(vouchers[2].discount_rule(), None);
    }

    #[test]
    fn missing_discount_columns_default_to_none() {
        let export = "id,code,min_order_amount,discount_amount\n4,ONLYFLAT,0,15\n";
        let vouchers = parse_vouchers(Cursor::new(export)).expect("export parses");

        assert_eq!(vouchers, vec![Voucher::flat(4, "ONLYFLAT", 0.0, 15.0)]);
    }

    #[test]
    fn rejects_non_numeric_amounts() {
        let export = "id,code,min_order_amount,discount_amount\n5,BAD,0,lots\n";
        assert!(parse_vouchers(Cursor::new(export)).is_err());
    }

    #[test]
    fn non_finite_minimums_never_score() {
        use crate::selection::domain::OrderContext;
        use crate::selection::scoring::calculate_discount;

        let export = "id,code,min_order_amount,discount_amount\n1,NANMIN,NaN,500\n2,NEGINF,-inf,400\n";
        let vouchers = parse_vouchers(Cursor::new(export)).expect("export parses");
        let order = OrderContext::new(0.0).expect("valid order");

        assert_eq!(vouchers.len(), 2);
        for voucher in &vouchers {
            let err = calculate_discount(voucher, &order).expect_err("threshold rejected");
            assert!(err.is_malformed(), "{} scored: {err:?}", voucher.code);
        }
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let source = CsvVoucherSource::new("definitely/not/here.csv");

        match source.fetch_vouchers(&RunContext::background()) {
            Err(SourceError::Io(_)) => {}
            other => panic!("expected io error, got {other:?}"),
        }
    }
}
