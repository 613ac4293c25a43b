//! Tagged-union row values (spec §3, §8.2, §8.4).
//!
//! The original C layout packs a row into one contiguous allocation (a
//! header array of variants followed by the text payloads they point
//! into). That layout is an optimization, not a correctness requirement
//! (spec §9) — here `Variant` owns its text directly and `Row`/`RowText`
//! are plain `Vec`s. Dropping the row drops every string it owns in one
//! step regardless.

use crate::logging::Level;
use crate::log;

/// A single tagged-union database cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Variant {
    Invalid,
    Integer(i64),
    Text(String),
    Real(f64),
    Null,
}

impl Variant {
    fn type_name(&self) -> &'static str {
        match self {
            Variant::Invalid => "[invalid type]",
            Variant::Integer(_) => "[number]",
            Variant::Text(_) => "[string]",
            Variant::Real(_) => "[float]",
            Variant::Null => "[null]",
        }
    }

    /// Returns the integer value, or logs at `Error` and returns `0` if
    /// this variant is not an integer.
    pub fn expect_number(&self) -> i64 {
        match self {
            Variant::Integer(n) => *n,
            other => {
                log!(
                    Level::Error,
                    "type error, wanted [number] got {}",
                    other.type_name()
                );
                0
            }
        }
    }

    /// Returns the string value, or logs at `Error` and returns `""` if
    /// this variant is not text.
    pub fn expect_string(&self) -> &str {
        match self {
            Variant::Text(s) => s.as_str(),
            other => {
                log!(
                    Level::Error,
                    "type error, wanted [string] got {}",
                    other.type_name()
                );
                ""
            }
        }
    }

    /// Returns `(text, length)`, or logs at `Error` and returns `("", 0)`
    /// if this variant is not text. Distinct from `expect_string` in the
    /// original API because C strings needed an explicit length to handle
    /// embedded NULs in blob-as-text columns; kept for interface parity.
    pub fn expect_lstring(&self) -> (&str, usize) {
        match self {
            Variant::Text(s) => (s.as_str(), s.len()),
            other => {
                log!(
                    Level::Error,
                    "type error, wanted [string] got {}",
                    other.type_name()
                );
                ("", 0)
            }
        }
    }

    /// Returns the float value, or logs at `Error` and returns `0.0` if
    /// this variant is not a float.
    pub fn expect_real(&self) -> f64 {
        match self {
            Variant::Real(r) => *r,
            other => {
                log!(
                    Level::Error,
                    "type error, wanted [float] got {}",
                    other.type_name()
                );
                0.0
            }
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Variant::Null)
    }
}

/// A full row, one variant per column, type-preserving.
pub type Row = Vec<Variant>;

/// A row where every column has been rendered as text (spec §3
/// "Row-of-strings"): integers/floats stringified, `NULL` becomes `None`.
pub type RowText = Vec<Option<String>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors_return_typed_zero_on_mismatch() {
        let v = Variant::Text("hello".into());
        assert_eq!(v.expect_number(), 0);
        assert_eq!(v.expect_real(), 0.0);

        let n = Variant::Integer(7);
        assert_eq!(n.expect_string(), "");
        let (s, len) = n.expect_lstring();
        assert_eq!(s, "");
        assert_eq!(len, 0);
    }

    #[test]
    fn accessors_return_value_on_match() {
        assert_eq!(Variant::Integer(42).expect_number(), 42);
        assert_eq!(Variant::Text("héllo".into()).expect_string(), "héllo");
        assert_eq!(Variant::Real(3.5).expect_real(), 3.5);
        assert!(Variant::Null.is_null());
    }

    #[test]
    fn row_owns_all_its_strings() {
        let row: Row = vec![
            Variant::Integer(42),
            Variant::Text("héllo".to_string()),
            Variant::Real(3.5),
            Variant::Null,
        ];
        assert_eq!(row.len(), 4);
        assert_eq!(row[1].expect_string(), "héllo");
        drop(row); // freeing the row frees every string it owns.
    }
}
