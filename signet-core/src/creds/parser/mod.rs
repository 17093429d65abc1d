//! Tolerant scanners for native credential tool output.
//!
//! Each grammar is scanned line by line. Lines that do not fit are skipped, and
//! empty output means "nothing stored". The scanners never fail: anything they
//! cannot make sense of comes back as [`ParseOutcome::Malformed`], which the
//! calling backend logs and treats as [`ParseOutcome::NotFound`].

pub mod keychain;
pub mod wincred;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use super::SecretRecord;

/// Result of scanning one tool output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
  Found(SecretRecord),
  NotFound,
  Malformed(String),
}

impl ParseOutcome {
  /// Collapse to an optional record, handing malformed output to `on_malformed`.
  pub fn into_record(self, on_malformed: impl FnOnce(&str)) -> Option<SecretRecord> {
    match self {
      Self::Found(record) => Some(record),
      Self::NotFound => None,
      Self::Malformed(reason) => {
        on_malformed(&reason);
        None
      }
    }
  }
}

/// Lines with line endings and trailing whitespace removed.
pub(crate) fn clean_lines(output: &str) -> impl Iterator<Item = &str> {
  output.lines().map(|line| line.trim_end_matches('\r').trim_end())
}

/// True when the output carries nothing but whitespace.
pub(crate) fn is_blank(output: &str) -> bool {
  output.trim().is_empty()
}

/// Decode a secret blob written as hex or base64.
///
/// Whitespace inside the blob is ignored. Hex is tried first because every
/// even-length hex string would also pass as base64.
pub fn decode_secret_blob(blob: &str) -> Result<Vec<u8>, String> {
  let compact: String = blob.chars().filter(|c| !c.is_whitespace()).collect();
  if compact.is_empty() {
    return Err("secret blob is empty".to_string());
  }

  if let Some(bytes) = decode_hex(&compact) {
    return Ok(bytes);
  }

  STANDARD
    .decode(compact.as_bytes())
    .map_err(|err| format!("secret blob is neither hex nor base64: {err}"))
}

/// Encode bytes as lower-case hex.
pub fn encode_hex(bytes: &[u8]) -> String {
  bytes.iter().map(|byte| format!("{byte:02x}")).collect()
}

pub(crate) fn decode_hex(input: &str) -> Option<Vec<u8>> {
  let digits = input.strip_prefix("0x").or_else(|| input.strip_prefix("0X")).unwrap_or(input);
  if digits.is_empty() || digits.len() % 2 != 0 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
    return None;
  }

  (0..digits.len())
    .step_by(2)
    .map(|i| u8::from_str_radix(&digits[i..i + 2], 16).ok())
    .collect()
}
