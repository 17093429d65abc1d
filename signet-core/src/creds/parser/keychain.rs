//! Scanner for `security find-generic-password` output.
//!
//! The attribute listing has one attribute per line, keyed by a quoted
//! four-character code:
//!
//! ```text
//! keychain: "/Users/alice/Library/Keychains/login.keychain-db"
//! class: "genp"
//! attributes:
//!     "acct"<blob>="password"
//!     "cdat"<timedate>=0x32303234303130313132303030305A00  "20240101120000Z\000"
//!     "svce"<blob>="signet"
//! ```
//!
//! The password itself comes from a second call with `-w`, which prints it on
//! a line of its own.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use super::{ParseOutcome, clean_lines, decode_hex, is_blank};
use crate::creds::SecretRecord;

/// `"name"<type>=value` or `"name": value`.
static ATTRIBUTE_LINE: Lazy<Regex> =
  Lazy::new(|| Regex::new(r#"^\s*"(?P<name>[^"]+)"\s*(?:<[^>]*>)?\s*[=:]\s*(?P<value>.*)$"#).expect("valid regex"));

const ACCOUNT_ATTR: &str = "acct";
const SERVICE_ATTR: &str = "svce";

/// Interpret one attribute value, `None` for `<NULL>` and unreadable values.
fn attribute_value(raw: &str) -> Option<String> {
  let raw = raw.trim();

  if let Some(quoted) = raw.strip_prefix('"') {
    return Some(quoted.strip_suffix('"').unwrap_or(quoted).to_string());
  }

  if raw.starts_with("0x") || raw.starts_with("0X") {
    let hex = raw.split_whitespace().next().unwrap_or_default();
    let bytes = decode_hex(hex)?;
    let text = String::from_utf8(bytes).ok()?;
    return Some(text.trim_end_matches('\0').to_string());
  }

  None
}

/// Collect the quoted attributes of a listing.
pub fn parse_attributes(output: &str) -> HashMap<String, String> {
  clean_lines(output)
    .filter_map(|line| ATTRIBUTE_LINE.captures(line))
    .filter_map(|caps| {
      let value = attribute_value(&caps["value"])?;
      Some((caps["name"].to_string(), value))
    })
    .collect()
}

/// Remove the single line ending the tool prints after a revealed password.
pub fn parse_revealed_secret(output: &str) -> Option<String> {
  let secret = output
    .strip_suffix("\r\n")
    .or_else(|| output.strip_suffix('\n'))
    .unwrap_or(output);

  if secret.is_empty() {
    None
  } else {
    Some(secret.to_string())
  }
}

/// Merge the attribute listing and the revealed password into one record.
///
/// The attributes must name the requested service and account, otherwise the
/// tool answered for a different item and the result is malformed.
pub fn parse_item(attributes: &str, secret: &str, service: &str, account: &str) -> ParseOutcome {
  if is_blank(attributes) {
    return ParseOutcome::NotFound;
  }

  let attrs = parse_attributes(attributes);
  let (Some(found_service), Some(found_account)) = (attrs.get(SERVICE_ATTR), attrs.get(ACCOUNT_ATTR)) else {
    return ParseOutcome::Malformed("keychain item lacks service or account attribute".to_string());
  };

  if found_service != service || found_account != account {
    return ParseOutcome::Malformed(format!(
      "keychain returned {found_service}/{found_account} for {service}/{account}"
    ));
  }

  match parse_revealed_secret(secret) {
    Some(password) => ParseOutcome::Found(SecretRecord::new(found_service, found_account, password)),
    None => ParseOutcome::NotFound,
  }
}
