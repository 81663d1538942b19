//! Conversions between Rust values and `FieldValue`.
//!
//! `#[derive(FormRecord)]` relies on these traits for every field of a
//! record, so a record can hold any type implementing both of them.

use crate::{FieldValue, FieldValueError, FormData};

/// Convert a Rust value into the value stored in `FormData`.
pub trait IntoFieldValue {
    fn into_field_value(self) -> FieldValue;
}

/// Read a Rust value back out of `FormData`.
pub trait FromFieldValue: Sized {
    fn from_field_value(value: &FieldValue) -> Result<Self, FieldValueError>;
}

fn mismatch(expected: &'static str, actual: &FieldValue) -> FieldValueError {
    if actual.is_null() {
        FieldValueError::Missing
    } else {
        FieldValueError::TypeMismatch {
            expected,
            actual: actual.type_name(),
        }
    }
}

impl IntoFieldValue for FieldValue {
    fn into_field_value(self) -> FieldValue {
        self
    }
}

impl FromFieldValue for FieldValue {
    fn from_field_value(value: &FieldValue) -> Result<Self, FieldValueError> {
        Ok(value.clone())
    }
}

impl IntoFieldValue for String {
    fn into_field_value(self) -> FieldValue {
        FieldValue::Text(self)
    }
}

impl FromFieldValue for String {
    fn from_field_value(value: &FieldValue) -> Result<Self, FieldValueError> {
        match value {
            FieldValue::Text(s) => Ok(s.clone()),
            FieldValue::Number(n) => Ok(n.to_string()),
            other => Err(mismatch("Text", other)),
        }
    }
}

impl IntoFieldValue for bool {
    fn into_field_value(self) -> FieldValue {
        FieldValue::Bool(self)
    }
}

impl FromFieldValue for bool {
    fn from_field_value(value: &FieldValue) -> Result<Self, FieldValueError> {
        match value {
            FieldValue::Bool(b) => Ok(*b),
            other => Err(mismatch("Bool", other)),
        }
    }
}

impl IntoFieldValue for f64 {
    fn into_field_value(self) -> FieldValue {
        FieldValue::Number(self)
    }
}

impl FromFieldValue for f64 {
    fn from_field_value(value: &FieldValue) -> Result<Self, FieldValueError> {
        value.as_number().ok_or_else(|| mismatch("Number", value))
    }
}

impl IntoFieldValue for f32 {
    fn into_field_value(self) -> FieldValue {
        FieldValue::Number(f64::from(self))
    }
}

impl FromFieldValue for f32 {
    fn from_field_value(value: &FieldValue) -> Result<Self, FieldValueError> {
        f64::from_field_value(value).map(|n| n as f32)
    }
}

macro_rules! integer_conversions {
    ($($ty:ty),*) => {
        $(
            impl IntoFieldValue for $ty {
                fn into_field_value(self) -> FieldValue {
                    FieldValue::Number(self as f64)
                }
            }

            impl FromFieldValue for $ty {
                fn from_field_value(value: &FieldValue) -> Result<Self, FieldValueError> {
                    let n = f64::from_field_value(value)?;
                    if n.fract() != 0.0 || n < <$ty>::MIN as f64 || n > <$ty>::MAX as f64 {
                        return Err(FieldValueError::OutOfRange {
                            value: n,
                            target: stringify!($ty),
                        });
                    }
                    Ok(n as $ty)
                }
            }
        )*
    };
}

integer_conversions!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl<T: IntoFieldValue> IntoFieldValue for Option<T> {
    fn into_field_value(self) -> FieldValue {
        self.map_or(FieldValue::Null, IntoFieldValue::into_field_value)
    }
}

impl<T: FromFieldValue> FromFieldValue for Option<T> {
    /// Blank values (null, empty text) read back as `None`.
    fn from_field_value(value: &FieldValue) -> Result<Self, FieldValueError> {
        if value.is_blank() && !matches!(value, FieldValue::List(_)) {
            Ok(None)
        } else {
            T::from_field_value(value).map(Some)
        }
    }
}

impl<T: IntoFieldValue> IntoFieldValue for Vec<T> {
    fn into_field_value(self) -> FieldValue {
        FieldValue::List(self.into_iter().map(IntoFieldValue::into_field_value).collect())
    }
}

impl<T: FromFieldValue> FromFieldValue for Vec<T> {
    /// A missing list reads back as an empty one.
    fn from_field_value(value: &FieldValue) -> Result<Self, FieldValueError> {
        match value {
            FieldValue::Null => Ok(Vec::new()),
            FieldValue::List(items) => items.iter().map(T::from_field_value).collect(),
            other => Err(mismatch("List", other)),
        }
    }
}

impl IntoFieldValue for FormData {
    fn into_field_value(self) -> FieldValue {
        FieldValue::Record(self)
    }
}

impl FromFieldValue for FormData {
    fn from_field_value(value: &FieldValue) -> Result<Self, FieldValueError> {
        match value {
            FieldValue::Record(data) => Ok(data.clone()),
            other => Err(mismatch("Record", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_reject_fractions_and_overflow() {
        assert_eq!(u8::from_field_value(&FieldValue::Number(200.0)), Ok(200));
        assert!(matches!(
            u8::from_field_value(&FieldValue::Number(300.0)),
            Err(FieldValueError::OutOfRange { target: "u8", .. })
        ));
        assert!(matches!(
            i32::from_field_value(&FieldValue::Number(1.5)),
            Err(FieldValueError::OutOfRange { .. })
        ));
        assert_eq!(i32::from_field_value(&FieldValue::from("42")), Ok(42));
    }

    #[test]
    fn options_treat_blank_as_none() {
        assert_eq!(Option::<String>::from_field_value(&FieldValue::Null), Ok(None));
        assert_eq!(Option::<String>::from_field_value(&FieldValue::from("")), Ok(None));
        assert_eq!(
            Option::<String>::from_field_value(&FieldValue::from("x")),
            Ok(Some("x".to_string()))
        );
    }

    #[test]
    fn missing_and_mismatch() {
        assert_eq!(bool::from_field_value(&FieldValue::Null), Err(FieldValueError::Missing));
        assert_eq!(
            bool::from_field_value(&FieldValue::from("yes")),
            Err(FieldValueError::TypeMismatch {
                expected: "Bool",
                actual: "Text"
            })
        );
    }

    #[test]
    fn vectors() {
        let value = vec!["a".to_string(), "b".to_string()].into_field_value();
        assert_eq!(Vec::<String>::from_field_value(&value).unwrap(), vec!["a", "b"]);
        assert!(Vec::<u32>::from_field_value(&FieldValue::Null).unwrap().is_empty());
    }
}
