//! Kernel-source assembly for the accelerator backend contract.
//!
//! Option and parameter text embedded into kernel source must be escaped
//! C-string-style: printable ASCII passes through except quote and
//! backslash (backslash-escaped); every other byte is emitted as a
//! backslash followed by a three-digit octal code. An inverse parser exists
//! so embedded text can be validated round-trip.

use thiserror::Error;

/// Malformed escaped kernel text.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EscapeError {
    #[error("escaped string must be quoted")]
    MissingQuotes,

    #[error("truncated escape sequence at byte {0}")]
    Truncated(usize),

    #[error("invalid octal escape at byte {0}")]
    BadOctal(usize),
}

/// Escape a byte sequence as a quoted C string literal.
pub fn escape_c_string(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() + 2);
    out.push('"');
    for &b in bytes {
        if (32..127).contains(&b) && b != b'"' && b != b'\\' {
            out.push(b as char);
        } else if b == b'"' || b == b'\\' {
            out.push('\\');
            out.push(b as char);
        } else {
            out.push_str(&format!("\\{:03o}", b));
        }
    }
    out.push('"');
    out
}

/// Inverse of [`escape_c_string`]: parse a quoted literal back into the
/// original byte sequence.
pub fn unescape_c_string(text: &str) -> Result<Vec<u8>, EscapeError> {
    let inner = text
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .ok_or(EscapeError::MissingQuotes)?;
    let bytes = inner.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b != b'\\' {
            out.push(b);
            i += 1;
            continue;
        }
        let next = *bytes.get(i + 1).ok_or(EscapeError::Truncated(i))?;
        if next == b'"' || next == b'\\' {
            out.push(next);
            i += 2;
        } else {
            if i + 3 >= bytes.len() {
                return Err(EscapeError::Truncated(i));
            }
            let mut value: u32 = 0;
            for &o in &bytes[i + 1..i + 4] {
                if !(b'0'..=b'7').contains(&o) {
                    return Err(EscapeError::BadOctal(i));
                }
                value = value * 8 + (o - b'0') as u32;
            }
            if value > u8::MAX as u32 {
                return Err(EscapeError::BadOctal(i));
            }
            out.push(value as u8);
            i += 4;
        }
    }
    Ok(out)
}

/// Accumulates `#define` lines for a kernel compilation unit.
///
/// String-valued options are embedded through [`escape_c_string`], so
/// arbitrary parameter text cannot break out of the source literal.
#[derive(Debug, Default, Clone)]
pub struct KernelOptions {
    defines: Vec<(String, String)>,
}

impl KernelOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define_int(mut self, name: &str, value: u64) -> Self {
        self.defines.push((name.to_owned(), value.to_string()));
        self
    }

    pub fn define_str(mut self, name: &str, value: &str) -> Self {
        self.defines
            .push((name.to_owned(), escape_c_string(value.as_bytes())));
        self
    }

    /// Prepend the define header to a kernel body.
    pub fn assemble(&self, body: &str) -> String {
        let mut out = String::new();
        for (name, value) in &self.defines {
            out.push_str(&format!("#define {name} {value}\n"));
        }
        out.push_str(body);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_ascii_passes_through() {
        assert_eq!(escape_c_string(b"abc 123"), "\"abc 123\"");
    }

    #[test]
    fn quote_backslash_and_control_byte_roundtrip() {
        let original: &[u8] = b"a\"b\\c\x01d";
        let escaped = escape_c_string(original);
        assert_eq!(escaped, "\"a\\\"b\\\\c\\001d\"");
        assert_eq!(unescape_c_string(&escaped).unwrap(), original);
    }

    #[test]
    fn all_byte_values_roundtrip() {
        let original: Vec<u8> = (0..=255).collect();
        let escaped = escape_c_string(&original);
        assert_eq!(unescape_c_string(&escaped).unwrap(), original);
    }

    #[test]
    fn high_bytes_use_octal() {
        assert_eq!(escape_c_string(&[0xff]), "\"\\377\"");
        assert_eq!(escape_c_string(&[0x7f]), "\"\\177\"");
    }

    #[test]
    fn unquoted_text_is_rejected() {
        assert_eq!(
            unescape_c_string("abc"),
            Err(EscapeError::MissingQuotes)
        );
    }

    #[test]
    fn truncated_escape_is_rejected() {
        assert!(matches!(
            unescape_c_string("\"ab\\0\""),
            Err(EscapeError::Truncated(_) | EscapeError::BadOctal(_))
        ));
    }

    #[test]
    fn defines_are_prepended_and_escaped() {
        let src = KernelOptions::new()
            .define_int("NV_COUNT", 64)
            .define_str("LABEL", "say \"hi\"")
            .assemble("kernel void f() {}\n");
        assert!(src.starts_with("#define NV_COUNT 64\n"));
        assert!(src.contains("#define LABEL \"say \\\"hi\\\"\"\n"));
        assert!(src.ends_with("kernel void f() {}\n"));
    }
}
