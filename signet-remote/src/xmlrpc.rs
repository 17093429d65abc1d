//! Just enough XML-RPC for the authentication call.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::consts::AUTHENTICATE_METHOD;

static FAULT_STRING: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r"(?s)<name>\s*faultString\s*</name>\s*<value>\s*(?:<string>)?(?P<text>.*?)(?:</string>)?\s*</value>")
    .expect("valid regex")
});

static FAULT_CODE: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r"(?s)<name>\s*faultCode\s*</name>\s*<value>\s*<(?:int|i4)>\s*(?P<code>-?\d+)\s*</(?:int|i4)>")
    .expect("valid regex")
});

static PARAM_VALUE: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r"(?s)<params>\s*<param>\s*<value>\s*(?:<string>(?P<typed>.*?)</string>|<string\s*/>|(?P<bare>[^<]*))\s*</value>")
    .expect("valid regex")
});

/// Decoded `methodResponse`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodResponse {
  Value(String),
  Fault { code: Option<i64>, message: String },
}

fn escape(text: &str) -> String {
  let mut escaped = String::with_capacity(text.len());
  for c in text.chars() {
    match c {
      '&' => escaped.push_str("&amp;"),
      '<' => escaped.push_str("&lt;"),
      '>' => escaped.push_str("&gt;"),
      '"' => escaped.push_str("&quot;"),
      '\'' => escaped.push_str("&apos;"),
      _ => escaped.push(c),
    }
  }
  escaped
}

fn unescape(text: &str) -> String {
  text
    .replace("&lt;", "<")
    .replace("&gt;", ">")
    .replace("&quot;", "\"")
    .replace("&apos;", "'")
    .replace("&amp;", "&")
}

/// Body of the `RemoteAuthenticationServer.authenticate` call.
pub fn authenticate_call(username: &str, password: &str) -> String {
  format!(
    "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
<methodCall><methodName>{AUTHENTICATE_METHOD}</methodName><params>\
<param><value><string>{}</string></value></param>\
<param><value><string>{}</string></value></param>\
</params></methodCall>",
    escape(username),
    escape(password)
  )
}

/// Decode a `methodResponse` carrying a single string.
pub fn parse_response(body: &str) -> Result<MethodResponse, String> {
  if !body.contains("<methodResponse") {
    return Err("not an XML-RPC response".to_string());
  }

  if body.contains("<fault>") {
    let message = FAULT_STRING
      .captures(body)
      .map(|caps| unescape(caps["text"].trim()))
      .unwrap_or_default();
    let code = FAULT_CODE.captures(body).and_then(|caps| caps["code"].parse().ok());
    return Ok(MethodResponse::Fault { code, message });
  }

  let caps = PARAM_VALUE
    .captures(body)
    .ok_or_else(|| "response carries no value".to_string())?;
  let raw = caps
    .name("typed")
    .or_else(|| caps.name("bare"))
    .map(|m| m.as_str())
    .unwrap_or_default();

  Ok(MethodResponse::Value(unescape(raw.trim())))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_call_escapes_arguments() {
    let body = authenticate_call("alice", "p<&>ss");
    assert!(body.contains("<methodName>RemoteAuthenticationServer.authenticate</methodName>"));
    assert!(body.contains("<string>alice</string>"));
    assert!(body.contains("<string>p&lt;&amp;&gt;ss</string>"));
  }

  #[test]
  fn test_string_value() {
    let body = "<?xml version=\"1.0\"?>\n<methodResponse>\n  <params>\n    <param>\n      <value><string>ABC123:42</string></value>\n    </param>\n  </params>\n</methodResponse>\n";
    assert_eq!(parse_response(body), Ok(MethodResponse::Value("ABC123:42".to_string())));
  }

  #[test]
  fn test_untyped_value() {
    let body = "<methodResponse><params><param><value>ABC123:42</value></param></params></methodResponse>";
    assert_eq!(parse_response(body), Ok(MethodResponse::Value("ABC123:42".to_string())));
  }

  #[test]
  fn test_empty_string_value() {
    let body = "<methodResponse><params><param><value><string/></value></param></params></methodResponse>";
    assert_eq!(parse_response(body), Ok(MethodResponse::Value(String::new())));
  }

  #[test]
  fn test_fault() {
    let body = "<methodResponse><fault><value><struct>\
<member><name>faultCode</name><value><int>1</int></value></member>\
<member><name>faultString</name><value><string>Incorrect username &amp; password</string></value></member>\
</struct></value></fault></methodResponse>";

    assert_eq!(
      parse_response(body),
      Ok(MethodResponse::Fault {
        code: Some(1),
        message: "Incorrect username & password".to_string(),
      })
    );
  }

  #[test]
  fn test_not_xml_rpc() {
    assert!(parse_response("<html><body>Login</body></html>").is_err());
    assert!(parse_response("<methodResponse><params></params></methodResponse>").is_err());
  }
}
