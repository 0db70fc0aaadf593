use rosc::OscType;

use crate::error::ConfigError;

/// Every type code a method signature may name.
pub const KNOWN_TYPE_CODES: &str = "ifsbhtdcrmTFNI";

/// Numeric codes coerce freely into each other.
pub const NUMERIC_TYPE_CODES: &str = "ihfd";

/// The OSC type tag of a single argument. Arrays have no single code and yield `None`.
pub fn type_code(arg: &OscType) -> Option<char> {
    let code = match arg {
        OscType::Int(_) => 'i',
        OscType::Float(_) => 'f',
        OscType::String(_) => 's',
        OscType::Blob(_) => 'b',
        OscType::Long(_) => 'h',
        OscType::Time(_) => 't',
        OscType::Double(_) => 'd',
        OscType::Char(_) => 'c',
        OscType::Color(_) => 'r',
        OscType::Midi(_) => 'm',
        OscType::Bool(true) => 'T',
        OscType::Bool(false) => 'F',
        OscType::Nil => 'N',
        OscType::Inf => 'I',
        OscType::Array(_) => return None,
    };
    Some(code)
}

pub fn is_numeric(code: char) -> bool {
    NUMERIC_TYPE_CODES.contains(code)
}

/// Checks a method signature eagerly so bad signatures are refused at registration.
/// The empty signature is valid and only accepts messages without arguments.
pub fn validate_signature(signature: &str) -> Result<(), ConfigError> {
    match signature.chars().find(|c| !KNOWN_TYPE_CODES.contains(*c)) {
        Some(code) => Err(ConfigError::InvalidTypeSignature {
            signature: signature.to_string(),
            code,
        }),
        None => Ok(()),
    }
}
