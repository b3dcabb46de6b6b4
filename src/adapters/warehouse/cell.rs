//! Text rendering of warehouse cell values
//!
//! Reports are JSON objects of strings, so every cell is converted to text as
//! soon as it is read. SQL NULL becomes the empty string.

use std::error::Error;
use std::fmt::Write as _;
use tokio_postgres::types::{FromSql, Type};

type BoxError = Box<dyn Error + Sync + Send>;

/// A cell value rendered as text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellText(pub String);

impl CellText {
    /// Returns the rendered value
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl<'a> FromSql<'a> for CellText {
    fn from_sql(ty: &Type, raw: &'a [u8]) -> Result<Self, BoxError> {
        let text = match ty.name() {
            "text" | "varchar" | "bpchar" | "name" | "citext" | "unknown" => {
                <&str as FromSql>::from_sql(ty, raw)?.to_string()
            }
            "bool" => bool::from_sql(ty, raw)?.to_string(),
            "int2" => i16::from_sql(ty, raw)?.to_string(),
            "int4" => i32::from_sql(ty, raw)?.to_string(),
            "int8" => i64::from_sql(ty, raw)?.to_string(),
            "oid" => u32::from_sql(ty, raw)?.to_string(),
            "float4" => f32::from_sql(ty, raw)?.to_string(),
            "float8" => f64::from_sql(ty, raw)?.to_string(),
            "numeric" => numeric_to_string(raw)?,
            "date" => chrono::NaiveDate::from_sql(ty, raw)?.to_string(),
            "timestamp" => chrono::NaiveDateTime::from_sql(ty, raw)?
                .format("%Y-%m-%dT%H:%M:%S%.f")
                .to_string(),
            "timestamptz" => chrono::DateTime::<chrono::Utc>::from_sql(ty, raw)?.to_rfc3339(),
            "uuid" => uuid::Uuid::from_sql(ty, raw)?.to_string(),
            "json" | "jsonb" => serde_json::Value::from_sql(ty, raw)?.to_string(),
            other => return Err(format!("unsupported column type '{other}'").into()),
        };
        Ok(CellText(text))
    }

    fn from_sql_null(_ty: &Type) -> Result<Self, BoxError> {
        Ok(CellText(String::new()))
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }
}

const NUMERIC_NEG: u16 = 0x4000;
const NUMERIC_NAN: u16 = 0xC000;
const NUMERIC_PINF: u16 = 0xD000;
const NUMERIC_NINF: u16 = 0xF000;

/// Renders PostgreSQL's binary NUMERIC (base-10000 digit groups) as decimal text
fn numeric_to_string(raw: &[u8]) -> Result<String, BoxError> {
    if raw.len() < 8 {
        return Err("numeric value is truncated".into());
    }
    let header = |i: usize| u16::from_be_bytes([raw[i], raw[i + 1]]);
    let ndigits = header(0) as usize;
    let weight = header(2) as i16 as i32;
    let sign = header(4);
    let dscale = header(6) as usize;

    if raw.len() != 8 + ndigits * 2 {
        return Err("numeric value has an inconsistent digit count".into());
    }

    match sign {
        NUMERIC_NAN => return Ok("NaN".to_string()),
        NUMERIC_PINF => return Ok("Infinity".to_string()),
        NUMERIC_NINF => return Ok("-Infinity".to_string()),
        _ => {}
    }

    let digits: Vec<u16> = raw[8..]
        .chunks_exact(2)
        .map(|c| u16::from_be_bytes([c[0], c[1]]))
        .collect();
    let digit_at = |i: i32| -> u16 {
        if i < 0 {
            0
        } else {
            digits.get(i as usize).copied().unwrap_or(0)
        }
    };

    let mut out = String::new();
    if sign == NUMERIC_NEG {
        out.push('-');
    }

    if weight < 0 {
        out.push('0');
    } else {
        for i in 0..=weight {
            let group = digit_at(i);
            if i == 0 {
                let _ = write!(out, "{group}");
            } else {
                let _ = write!(out, "{group:04}");
            }
        }
    }

    if dscale > 0 {
        let mut fraction = String::with_capacity(dscale + 4);
        let mut i = weight + 1;
        while fraction.len() < dscale {
            let _ = write!(fraction, "{:04}", digit_at(i));
            i += 1;
        }
        fraction.truncate(dscale);
        out.push('.');
        out.push_str(&fraction);
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numeric(weight: i16, sign: u16, dscale: u16, digits: &[u16]) -> Vec<u8> {
        let mut raw = Vec::new();
        raw.extend_from_slice(&(digits.len() as u16).to_be_bytes());
        raw.extend_from_slice(&weight.to_be_bytes());
        raw.extend_from_slice(&sign.to_be_bytes());
        raw.extend_from_slice(&dscale.to_be_bytes());
        for d in digits {
            raw.extend_from_slice(&d.to_be_bytes());
        }
        raw
    }

    #[test]
    fn test_numeric_integer() {
        let raw = numeric(1, 0, 0, &[1234, 5678]);
        assert_eq!(numeric_to_string(&raw).unwrap(), "12345678");
    }

    #[test]
    fn test_numeric_with_fraction() {
        let raw = numeric(0, 0, 2, &[123, 4500]);
        assert_eq!(numeric_to_string(&raw).unwrap(), "123.45");
    }

    #[test]
    fn test_numeric_small_fraction() {
        let raw = numeric(-2, 0, 5, &[1000]);
        assert_eq!(numeric_to_string(&raw).unwrap(), "0.00001");
    }

    #[test]
    fn test_numeric_negative_and_zero() {
        assert_eq!(
            numeric_to_string(&numeric(0, NUMERIC_NEG, 1, &[7, 5000])).unwrap(),
            "-7.5"
        );
        assert_eq!(numeric_to_string(&numeric(0, 0, 0, &[])).unwrap(), "0");
    }

    #[test]
    fn test_numeric_trailing_zero_groups() {
        // 1000000 is stored as a single group with weight 1
        let raw = numeric(1, 0, 0, &[100]);
        assert_eq!(numeric_to_string(&raw).unwrap(), "1000000");
    }

    #[test]
    fn test_numeric_nan() {
        assert_eq!(numeric_to_string(&numeric(0, NUMERIC_NAN, 0, &[])).unwrap(), "NaN");
    }

    #[test]
    fn test_numeric_malformed() {
        assert!(numeric_to_string(&[0, 1]).is_err());
        assert!(numeric_to_string(&numeric(0, 0, 0, &[1])[..9]).is_err());
    }

    #[test]
    fn test_cells_from_sql() {
        assert_eq!(
            CellText::from_sql(&Type::INT8, &42i64.to_be_bytes()).unwrap(),
            CellText("42".to_string())
        );
        assert_eq!(
            CellText::from_sql(&Type::TEXT, b"Foo.Bar").unwrap(),
            CellText("Foo.Bar".to_string())
        );
        assert_eq!(
            CellText::from_sql(&Type::BOOL, &[1]).unwrap(),
            CellText("true".to_string())
        );
    }

    #[test]
    fn test_null_is_empty() {
        assert_eq!(
            CellText::from_sql_null(&Type::INT4).unwrap(),
            CellText(String::new())
        );
    }

    #[test]
    fn test_unsupported_type() {
        let err = CellText::from_sql(&Type::BYTEA, b"\x00").unwrap_err();
        assert!(err.to_string().contains("bytea"));
    }
}
