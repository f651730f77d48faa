//! Raw identifier to canonical key.
//!
//! Rules, first match wins:
//!
//! 1. Blank input is `missing`.
//! 2. `client:` (case-sensitive) passes through unchanged.
//! 3. A leading `whatsapp:` is stripped, case-insensitively.
//! 4. Any other scheme prefix (`sms:`, `messenger:`, ...) is unsupported.
//! 5. Everything but digits and one leading `+` is discarded.
//! 6. A leading `00` becomes `+`.
//! 7. 8–15 bare digits get a `+`.
//! 8. The result must be E.164: `+`, a non-zero digit, then 1–14 digits.

use crate::canonical::{CHAT_PREFIX, CanonicalId, WHATSAPP_PREFIX};

/// Longest E.164 subscriber number, in digits.
const E164_MAX_DIGITS: usize = 15;

/// Shortest digit run that gets an implicit `+`.
const IMPLICIT_PLUS_MIN_DIGITS: usize = 8;

/// Why an identifier could not be normalized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("missing identifier")]
    Missing,

    #[error("malformed after normalization")]
    Malformed,

    #[error("unsupported prefix `{scheme}:`")]
    UnsupportedPrefix { scheme: String },
}

impl Rejection {
    /// Stable machine-readable reason.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Missing => "missing",
            Self::Malformed => "malformed-after-normalization",
            Self::UnsupportedPrefix { .. } => "unsupported-prefix",
        }
    }
}

/// Normalize a raw identifier to its canonical form.
///
/// Pure and idempotent: feeding a canonical value back in returns it unchanged.
pub fn normalize(raw: &str) -> Result<CanonicalId, Rejection> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(Rejection::Missing);
    }
    if trimmed.starts_with(CHAT_PREFIX) {
        return Ok(CanonicalId::chat(trimmed));
    }
    normalize_e164(trimmed).map(|e164| CanonicalId::whatsapp(&e164))
}

/// Normalize a phone-like value to a bare `+E164` string.
///
/// Accepts an optional `whatsapp:` prefix. Chat identities are not phone
/// numbers and are rejected here as an unsupported prefix.
pub fn normalize_e164(raw: &str) -> Result<String, Rejection> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(Rejection::Missing);
    }

    let rest = strip_whatsapp_prefix(trimmed).trim_start();
    if rest.is_empty() {
        return Err(Rejection::Missing);
    }
    if let Some(scheme) = leading_scheme(rest) {
        return Err(Rejection::UnsupportedPrefix {
            scheme: scheme.to_string(),
        });
    }

    let mut cleaned = String::with_capacity(rest.len());
    for ch in rest.chars() {
        if ch.is_ascii_digit() {
            cleaned.push(ch);
        } else if ch == '+' && cleaned.is_empty() {
            cleaned.push(ch);
        }
    }

    if let Some(national) = cleaned.strip_prefix("00") {
        cleaned = format!("+{national}");
    }

    if !cleaned.starts_with('+')
        && (IMPLICIT_PLUS_MIN_DIGITS..=E164_MAX_DIGITS).contains(&cleaned.len())
    {
        cleaned.insert(0, '+');
    }

    if is_e164(&cleaned) {
        Ok(cleaned)
    } else {
        Err(Rejection::Malformed)
    }
}

fn strip_whatsapp_prefix(value: &str) -> &str {
    match value.get(..WHATSAPP_PREFIX.len()) {
        Some(head) if head.eq_ignore_ascii_case(WHATSAPP_PREFIX) => &value[WHATSAPP_PREFIX.len()..],
        _ => value,
    }
}

/// URI-style scheme at the start of `value`: a letter followed by letters,
/// digits, `+`, `.` or `-`, terminated by `:`.
fn leading_scheme(value: &str) -> Option<&str> {
    let mut chars = value.char_indices();
    match chars.next() {
        Some((_, first)) if first.is_ascii_alphabetic() => {},
        _ => return None,
    }
    for (idx, ch) in chars {
        if ch == ':' {
            return Some(&value[..idx]);
        }
        if !(ch.is_ascii_alphanumeric() || matches!(ch, '+' | '.' | '-')) {
            return None;
        }
    }
    None
}

fn is_e164(value: &str) -> bool {
    let Some(digits) = value.strip_prefix('+') else {
        return false;
    };
    (2..=E164_MAX_DIGITS).contains(&digits.len())
        && digits.bytes().all(|b| b.is_ascii_digit())
        && !digits.starts_with('0')
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    #[rstest]
    #[case("0044 7911 123456", "whatsapp:+447911123456")]
    #[case("+447911123456", "whatsapp:+447911123456")]
    #[case("whatsapp:+447911123456", "whatsapp:+447911123456")]
    #[case("WhatsApp:+44 (7911) 123-456", "whatsapp:+447911123456")]
    #[case("  +1 (555) 123-4567  ", "whatsapp:+15551234567")]
    #[case("15551234567", "whatsapp:+15551234567")]
    #[case("whatsapp:15551234567", "whatsapp:+15551234567")]
    #[case("client:abc123", "client:abc123")]
    #[case("  client:abc123 ", "client:abc123")]
    fn normalizes_to_canonical(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(normalize(input).unwrap().as_str(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("whatsapp:")]
    #[case("WHATSAPP:   ")]
    fn blank_input_is_missing(#[case] input: &str) {
        assert_eq!(normalize(input), Err(Rejection::Missing));
    }

    #[rstest]
    #[case("123")]
    #[case("+1bad")]
    #[case("1234567")]
    #[case("1234567890123456")]
    #[case("+0123456789")]
    #[case("000123456789")]
    #[case("(---)")]
    fn malformed_after_normalization(#[case] input: &str) {
        assert_eq!(normalize(input), Err(Rejection::Malformed));
    }

    #[test]
    fn digit_count_boundaries() {
        // 8 and 15 bare digits are the implicit-plus window.
        assert_eq!(
            normalize("12345678").unwrap().as_str(),
            "whatsapp:+12345678"
        );
        assert_eq!(
            normalize("123456789012345").unwrap().as_str(),
            "whatsapp:+123456789012345"
        );
        assert_eq!(normalize("1234567"), Err(Rejection::Malformed));
        assert_eq!(normalize("1234567890123456"), Err(Rejection::Malformed));
    }

    #[test]
    fn explicit_plus_allows_short_numbers() {
        assert_eq!(normalize("+12").unwrap().as_str(), "whatsapp:+12");
        assert_eq!(normalize("+1"), Err(Rejection::Malformed));
    }

    #[test]
    fn only_the_leading_plus_survives() {
        assert_eq!(
            normalize("+1555+123+4567").unwrap().as_str(),
            "whatsapp:+15551234567"
        );
    }

    #[test]
    fn client_prefix_is_case_sensitive() {
        let err = normalize("Client:abc123").unwrap_err();
        assert_eq!(err.code(), "unsupported-prefix");
    }

    #[test]
    fn client_identity_skips_phone_validation() {
        let id = normalize("client:not a phone at all!").unwrap();
        assert!(id.is_chat());
        assert_eq!(id.as_str(), "client:not a phone at all!");
    }

    #[rstest]
    #[case("sms:+15551234567", "sms")]
    #[case("messenger:12345", "messenger")]
    #[case("whatsapp:tel:+15551234567", "tel")]
    fn other_schemes_are_unsupported(#[case] input: &str, #[case] scheme: &str) {
        assert_eq!(
            normalize(input),
            Err(Rejection::UnsupportedPrefix {
                scheme: scheme.to_string()
            })
        );
    }

    #[test]
    fn e164_helper_returns_bare_number() {
        assert_eq!(normalize_e164("whatsapp:+15551234567").unwrap(), "+15551234567");
        assert!(normalize_e164("client:abc").is_err());
    }

    #[test]
    fn rejection_codes_are_stable() {
        assert_eq!(Rejection::Missing.code(), "missing");
        assert_eq!(Rejection::Malformed.code(), "malformed-after-normalization");
        assert_eq!(Rejection::Missing.to_string(), "missing identifier");
    }
}
