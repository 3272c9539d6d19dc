//! Small utility helpers used across modules.

/// Format `value` with `digits` significant digits in fixed-point notation.
/// Trailing zeros are trimmed but at least one fractional digit is kept,
/// so 97.5312 → "97.53", 100.0 → "100.0", 0.5 → "0.5".
pub fn format_significant(value: f64, digits: usize) -> String {
  if !value.is_finite() {
    return value.to_string();
  }
  if value == 0.0 {
    return "0.0".into();
  }
  let magnitude = value.abs().log10().floor() as i32;
  let decimals = (digits as i32 - 1 - magnitude).max(0) as usize;
  let mut out = format!("{:.*}", decimals, value);
  if out.contains('.') {
    while out.ends_with('0') {
      out.pop();
    }
    if out.ends_with('.') {
      out.push('0');
    }
  } else {
    out.push_str(".0");
  }
  out
}

/// Escape text for inclusion in HTML element content or attribute values.
pub fn escape_html(s: &str) -> String {
  let mut out = String::with_capacity(s.len());
  for ch in s.chars() {
    match ch {
      '&' => out.push_str("&amp;"),
      '<' => out.push_str("&lt;"),
      '>' => out.push_str("&gt;"),
      '"' => out.push_str("&quot;"),
      '\'' => out.push_str("&#39;"),
      _ => out.push(ch),
    }
  }
  out
}

/// Log-safe truncation for large strings.
/// Avoids spamming logs with whole tweets or form bodies.
pub fn trunc_for_log(s: &str, max: usize) -> String {
  if s.len() <= max {
    return s.to_string();
  }
  let mut cut = max;
  while !s.is_char_boundary(cut) {
    cut -= 1;
  }
  format!("{}… ({} bytes total)", &s[..cut], s.len())
}
