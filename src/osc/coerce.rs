use std::borrow::Cow;

use rosc::OscType;

use crate::error::CoercionError;
use crate::osc::types::{is_numeric, type_code};

/// How strictly a method signature has to agree with the incoming type tag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Coercion {
    /// Numeric arguments (`i`, `h`, `f`, `d`) convert into whichever numeric type the method
    /// declared. Conversions are `as` casts and never an error: float to int saturates
    /// (NaN becomes 0), int64 to int32 wraps, and int to float may lose precision.
    #[default]
    Loose,
    /// The signature must equal the type tag.
    Strict,
}

/// Coerces a single argument into the declared type. The original argument is never touched.
pub fn coerce(declared: char, actual: &OscType) -> Result<OscType, CoercionError> {
    // Arrays never make it into a Message; '[' is what they'd be tagged with on the wire.
    let actual_code = type_code(actual).unwrap_or('[');
    if declared == actual_code {
        return Ok(actual.clone());
    }
    if !is_numeric(declared) || !is_numeric(actual_code) {
        return Err(CoercionError::Incompatible {
            declared,
            actual: actual_code,
        });
    }

    let coerced = match (declared, actual) {
        ('i', OscType::Long(v)) => OscType::Int(*v as i32),
        ('i', OscType::Float(v)) => OscType::Int(*v as i32),
        ('i', OscType::Double(v)) => OscType::Int(*v as i32),

        ('h', OscType::Int(v)) => OscType::Long(i64::from(*v)),
        ('h', OscType::Float(v)) => OscType::Long(*v as i64),
        ('h', OscType::Double(v)) => OscType::Long(*v as i64),

        ('f', OscType::Int(v)) => OscType::Float(*v as f32),
        ('f', OscType::Long(v)) => OscType::Float(*v as f32),
        ('f', OscType::Double(v)) => OscType::Float(*v as f32),

        ('d', OscType::Int(v)) => OscType::Double(f64::from(*v)),
        ('d', OscType::Long(v)) => OscType::Double(*v as f64),
        ('d', OscType::Float(v)) => OscType::Double(f64::from(*v)),

        _ => {
            return Err(CoercionError::Incompatible {
                declared,
                actual: actual_code,
            });
        }
    };
    Ok(coerced)
}

/// Coerces a whole argument list against a method signature. Either every position coerces
/// or the candidate is rejected as a whole.
///
/// When the signature already equals the message's type tag the arguments are borrowed
/// rather than copied.
pub fn coerce_args<'a>(
    signature: &str,
    types: &str,
    args: &'a [OscType],
    mode: Coercion,
) -> Result<Cow<'a, [OscType]>, CoercionError> {
    let expected = signature.chars().count();
    if expected != args.len() {
        return Err(CoercionError::LengthMismatch {
            expected,
            actual: args.len(),
        });
    }
    if signature == types {
        return Ok(Cow::Borrowed(args));
    }

    match mode {
        Coercion::Strict => {
            let (declared, actual) = signature
                .chars()
                .zip(types.chars())
                .find(|(declared, actual)| declared != actual)
                .unwrap_or(('\0', '\0'));
            Err(CoercionError::Incompatible { declared, actual })
        }
        Coercion::Loose => signature
            .chars()
            .zip(args)
            .map(|(declared, arg)| coerce(declared, arg))
            .collect::<Result<Vec<_>, _>>()
            .map(Cow::Owned),
    }
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};
    use float_cmp::approx_eq;

    use super::*;

    #[test]
    fn identity_coercion_returns_the_argument_unchanged() {
        let arg = OscType::String("hello".into());
        check!(coerce('s', &arg) == Ok(arg.clone()));

        let blob = OscType::Blob(vec![0xde, 0xad]);
        check!(coerce('b', &blob) == Ok(blob.clone()));
    }

    #[test]
    fn int_coerces_to_float() {
        let_assert!(Ok(OscType::Float(v)) = coerce('f', &OscType::Int(5)));
        check!(approx_eq!(f32, v, 5.0, ulps = 2));
    }

    #[test]
    fn numeric_cross_coercion() {
        let_assert!(Ok(OscType::Int(v)) = coerce('i', &OscType::Float(3.9)));
        check!(v == 3);

        let_assert!(Ok(OscType::Double(v)) = coerce('d', &OscType::Float(0.25)));
        check!(approx_eq!(f64, v, 0.25, ulps = 2));

        let_assert!(Ok(OscType::Long(v)) = coerce('h', &OscType::Int(-7)));
        check!(v == -7);

        let_assert!(Ok(OscType::Float(v)) = coerce('f', &OscType::Double(1.5)));
        check!(approx_eq!(f32, v, 1.5, ulps = 2));
    }

    #[test]
    fn lossy_conversions_still_succeed() {
        let_assert!(Ok(OscType::Int(v)) = coerce('i', &OscType::Double(1e12)));
        check!(v == i32::MAX);

        let_assert!(Ok(OscType::Int(v)) = coerce('i', &OscType::Long(i64::from(i32::MAX) + 1)));
        check!(v == i32::MIN);
    }

    #[test]
    fn non_numeric_types_only_coerce_to_themselves() {
        check!(
            coerce('i', &OscType::String("5".into()))
                == Err(CoercionError::Incompatible {
                    declared: 'i',
                    actual: 's'
                })
        );
        check!(coerce('s', &OscType::Int(5)).is_err());
        check!(coerce('T', &OscType::Bool(false)).is_err());
        check!(coerce('N', &OscType::Inf).is_err());
        check!(coerce('b', &OscType::String("x".into())).is_err());
    }

    #[test]
    fn signatures_need_equal_length() {
        let args = [OscType::Int(1), OscType::Int(2)];
        check!(
            coerce_args("i", "ii", &args, Coercion::Loose)
                == Err(CoercionError::LengthMismatch {
                    expected: 1,
                    actual: 2
                })
        );
        check!(coerce_args("", "", &[], Coercion::Loose).is_ok());
    }

    #[test]
    fn matching_signature_borrows() {
        let args = [OscType::Int(1), OscType::Float(2.0)];
        let_assert!(Ok(Cow::Borrowed(out)) = coerce_args("if", "if", &args, Coercion::Loose));
        check!(out == &args[..]);
    }

    #[test]
    fn one_bad_position_rejects_the_whole_signature() {
        let args = [OscType::Int(1), OscType::String("x".into())];
        check!(
            coerce_args("fi", "is", &args, Coercion::Loose)
                == Err(CoercionError::Incompatible {
                    declared: 'i',
                    actual: 's'
                })
        );
    }

    #[test]
    fn loose_mode_coerces_every_position() {
        let args = [OscType::Int(1), OscType::Float(2.5)];
        let_assert!(Ok(out) = coerce_args("dd", "if", &args, Coercion::Loose));
        check!(&*out == &[OscType::Double(1.0), OscType::Double(2.5)][..]);
        // the wire arguments are untouched
        check!(args[0] == OscType::Int(1));
    }

    #[test]
    fn strict_mode_refuses_any_difference() {
        let args = [OscType::Int(1)];
        check!(
            coerce_args("f", "i", &args, Coercion::Strict)
                == Err(CoercionError::Incompatible {
                    declared: 'f',
                    actual: 'i'
                })
        );
        check!(coerce_args("i", "i", &args, Coercion::Strict).is_ok());
    }
}
