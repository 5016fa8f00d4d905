//! Small string helpers: concatenation, path names, email validation and
//! date formatting.

use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};

/// Format used by the date helpers, e.g. `03/15 2024 12:30`.
const DATE_FORMAT: &str = "%m/%d %Y %H:%M";

const RFC822_SPECIALS: &str = "()<>@,;:\\\"[]";

/// Concatenate two optional strings. Returns `None` only if both are `None`.
pub fn concat_strings(first: Option<&str>, second: Option<&str>) -> Option<String> {
    match (first, second) {
        (None, None) => None,
        (first, second) => Some([first.unwrap_or_default(), second.unwrap_or_default()].concat()),
    }
}

/// Concatenate every string in `parts`.
pub fn concat_all(parts: &[&str]) -> String {
    parts.concat()
}

/// Join two byte streams and append two null bytes, so that the result can
/// also be read as a narrow or wide null-terminated string.
///
/// Returns `None` only if both streams are `None`.
pub fn concat_streams(first: Option<&[u8]>, second: Option<&[u8]>) -> Option<Vec<u8>> {
    if first.is_none() && second.is_none() {
        return None;
    }
    let first = first.unwrap_or_default();
    let second = second.unwrap_or_default();

    let mut stream = Vec::with_capacity(first.len() + second.len() + 2);
    stream.extend_from_slice(first);
    stream.extend_from_slice(second);
    stream.extend_from_slice(&[0, 0]);
    Some(stream)
}

/// Copy at most `amount` characters of `s`.
pub fn string_copy_amount(s: &str, amount: usize) -> String {
    s.chars().take(amount).collect()
}

/// Returns whether `byte` is the first byte of a UTF-8 byte order mark.
pub fn is_utf8_bom_mark(byte: u8) -> bool {
    byte == 0xEF
}

/// Return the last component of `path`. Both `\` and `/` are separators.
pub fn base_file_name(path: &str) -> &str {
    match path.rfind(['\\', '/']) {
        Some(separator) => &path[separator + 1..],
        None => path,
    }
}

/// Check `address` against RFC 822 `local@domain` syntax.
///
/// The local part may be at most 64 characters and the domain, counted with
/// the `@`, at most 256. Quoted local segments may contain specials and
/// escaped spaces. Outside quotes, control characters, non-ASCII characters
/// and the RFC 822 specials are rejected, as are empty parts and empty
/// dot-separated labels.
pub fn is_email_valid(address: &str) -> bool {
    let chars: Vec<char> = address.chars().collect();
    // Past the end reads as a terminator
    let at = |i: usize| chars.get(i).copied().unwrap_or('\0');
    let is_special = |c: char| RFC822_SPECIALS.contains(c);
    let is_invalid = |c: char| c <= ' ' || u32::from(c) >= 127;

    let Some(at_sign) = chars.iter().position(|&c| c == '@') else {
        return false;
    };
    if at_sign > 64 || chars.len() - at_sign > 256 {
        return false;
    }

    // Local part
    let mut i = 0;
    while at(i) != '\0' {
        let c = at(i);

        if c == '"' && (i == 0 || at(i - 1) == '.' || at(i - 1) == '"') {
            loop {
                i += 1;
                match at(i) {
                    '\0' | '"' => break,
                    '\\' => {
                        i += 1;
                        if at(i) == ' ' {
                            continue;
                        }
                    }
                    _ => {}
                }
                if is_invalid(at(i)) {
                    return false;
                }
            }
            // Unterminated quote
            if at(i) == '\0' {
                return false;
            }
            i += 1;
            if at(i) == '@' {
                break;
            }
            if at(i) != '.' {
                return false;
            }
            i += 1;
            continue;
        }

        if c == '@' {
            break;
        }
        if is_invalid(c) || is_special(c) {
            return false;
        }
        i += 1;
    }
    if i == 0 || at(i - 1) == '.' {
        return false;
    }

    // Domain
    i += 1;
    let domain = i;
    if at(domain) == '\0' {
        return false;
    }
    while at(i) != '\0' {
        let c = at(i);
        if c == '.' && (i == domain || at(i - 1) == '.') {
            return false;
        }
        if is_invalid(c) || is_special(c) {
            return false;
        }
        i += 1;
    }

    true
}

/// Format a `YYMMDDHHMM` timestamp, such as an X.509 `UTCTime`, in local
/// time.
///
/// Two-digit years below 50 are in the 2000s. A trailing `Z` marks the input
/// as UTC; otherwise it is taken as local time. Returns `None` if the input
/// is too short or not a valid date.
pub fn date_from_yymmddhhmm(s: &str) -> Option<String> {
    let digits = |index: usize| -> Option<u32> {
        let pair = s.get(index..index + 2)?;
        if !pair.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        pair.parse().ok()
    };

    let year = digits(0)? as i32;
    let year = if year < 50 { 2000 + year } else { 1900 + year };
    let date = NaiveDate::from_ymd_opt(year, digits(2)?, digits(4)?)?;
    let naive = date.and_hms_opt(digits(6)?, digits(8)?, 0)?;

    let local: DateTime<Local> = if s.ends_with('Z') {
        Utc.from_utc_datetime(&naive).with_timezone(&Local)
    } else {
        Local.from_local_datetime(&naive).earliest()?
    };
    Some(local.format(DATE_FORMAT).to_string())
}

/// Format seconds since the Unix epoch in UTC.
pub fn date_from_time_t(time: i64) -> Option<String> {
    let utc = DateTime::<Utc>::from_timestamp(time, 0)?;
    Some(utc.format(DATE_FORMAT).to_string())
}
