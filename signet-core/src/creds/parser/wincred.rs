//! Scanner for the Windows credential helper listing.
//!
//! The helper prints one block per credential, blocks separated by blank
//! lines, each line a `label: value` pair:
//!
//! ```text
//! Target Name: signet:password
//! Type: Generic
//! User Name: password
//! Secret: 6d79706173737764
//! ```
//!
//! Labels are translated on localized systems, so they are matched loosely and
//! a block with no recognizable label falls back to field position.

use super::{ParseOutcome, clean_lines, decode_secret_blob, is_blank};
use crate::creds::SecretRecord;

const TARGET_LABELS: &[&str] = &["targetname", "target"];
const USER_LABELS: &[&str] = &["username", "user", "account"];
const SECRET_LABELS: &[&str] = &["secret", "password", "credential", "credentialblob", "blob"];

/// Target name under which the helper files a service/account pair.
pub fn target_name(service: &str, account: &str) -> String {
  format!("{service}:{account}")
}

#[derive(Debug, Default)]
struct Block {
  fields: Vec<(String, String)>,
}

impl Block {
  fn labelled(&self, labels: &[&str]) -> Option<&str> {
    self
      .fields
      .iter()
      .find(|(label, _)| labels.contains(&label.as_str()))
      .map(|(_, value)| value.as_str())
  }

  fn has_known_label(&self) -> bool {
    self.fields.iter().any(|(label, _)| {
      TARGET_LABELS.contains(&label.as_str())
        || USER_LABELS.contains(&label.as_str())
        || SECRET_LABELS.contains(&label.as_str())
    })
  }

  /// Returns (target, user, secret blob) when the block is complete.
  fn parts(&self) -> Option<(&str, Option<&str>, &str)> {
    if self.has_known_label() {
      let target = self.labelled(TARGET_LABELS)?;
      let secret = self.labelled(SECRET_LABELS)?;
      return Some((target, self.labelled(USER_LABELS), secret));
    }

    if self.fields.len() < 3 {
      return None;
    }
    let target = self.fields.first().map(|(_, value)| value.as_str())?;
    let user = self.fields.get(1).map(|(_, value)| value.as_str());
    let secret = self.fields.last().map(|(_, value)| value.as_str())?;
    Some((target, user, secret))
  }
}

fn normalize_label(label: &str) -> String {
  label
    .chars()
    .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
    .flat_map(char::to_lowercase)
    .collect()
}

/// Strip decorations such as `LegacyGeneric:target=` from a target name.
fn bare_target(raw: &str) -> &str {
  match raw.find("target=") {
    Some(idx) => raw[idx + "target=".len()..].trim(),
    None => raw.trim(),
  }
}

fn split_blocks(output: &str) -> Vec<Block> {
  let mut blocks = Vec::new();
  let mut current = Block::default();

  for line in clean_lines(output) {
    if line.trim().is_empty() {
      if !current.fields.is_empty() {
        blocks.push(std::mem::take(&mut current));
      }
      continue;
    }

    // Lines without a separator (banners, "Credentials found", ...) carry no field.
    let Some((label, value)) = line.split_once(':') else {
      continue;
    };
    let value = value.trim();
    if value.is_empty() {
      continue;
    }
    current.fields.push((normalize_label(label), value.to_string()));
  }

  if !current.fields.is_empty() {
    blocks.push(current);
  }
  blocks
}

/// Find the credential filed under `target` in a helper listing.
pub fn parse_listing(output: &str, target: &str) -> ParseOutcome {
  if is_blank(output) {
    return ParseOutcome::NotFound;
  }

  let mut unreadable = 0usize;
  for block in split_blocks(output) {
    let Some((raw_target, user, blob)) = block.parts() else {
      unreadable += 1;
      continue;
    };

    let found_target = bare_target(raw_target);
    if !found_target.eq_ignore_ascii_case(target) {
      continue;
    }

    let (service, account) = match found_target.split_once(':') {
      Some((service, account)) if !service.is_empty() && !account.is_empty() => (service, account),
      _ => match user {
        Some(user) if !user.is_empty() => (found_target, user),
        _ => return ParseOutcome::Malformed(format!("target '{found_target}' names no account")),
      },
    };

    // Only a complete record gets its blob decoded.
    let secret = match decode_secret_blob(blob) {
      Ok(bytes) => bytes,
      Err(reason) => return ParseOutcome::Malformed(reason),
    };
    if std::str::from_utf8(&secret).is_err() {
      return ParseOutcome::Malformed("secret is not valid UTF-8".to_string());
    }

    return ParseOutcome::Found(SecretRecord::new(service, account, secret));
  }

  if unreadable > 0 {
    ParseOutcome::Malformed(format!("{unreadable} unreadable credential block(s) in helper output"))
  } else {
    ParseOutcome::NotFound
  }
}
