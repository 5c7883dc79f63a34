//! Byte scanning over a bounded buffer.
//!
//! The slice length is the end of input: nothing here looks at a byte at or
//! past `buffer.len()`, and no terminator is assumed.

pub fn is_blank(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\r' | b'\n')
}

/// Offset of the first non-blank byte at or after `start`, or `buffer.len()`
/// when only blanks remain.
pub fn next_significant(buffer: &[u8], start: usize) -> usize {
    buffer
        .get(start..)
        .and_then(|rest| rest.iter().position(|&b| !is_blank(b)))
        .map_or(buffer.len(), |n| start + n)
}

fn count_digits(buffer: &[u8], start: usize) -> usize {
    buffer
        .get(start..)
        .map_or(0, |rest| rest.iter().take_while(|b| b.is_ascii_digit()).count())
}

/// Scan an optionally signed base-10 integer starting exactly at `start`.
///
/// Returns the value and the offset just past the last digit, or `None` when
/// no digit was found. Out-of-range values saturate at the `i64` bounds.
pub fn scan_integer(buffer: &[u8], start: usize) -> Option<(i64, usize)> {
    let mut i = start;
    let negative = match buffer.get(i) {
        Some(b'-') => {
            i += 1;
            true
        }
        Some(b'+') => {
            i += 1;
            false
        }
        _ => false,
    };

    let digits = count_digits(buffer, i);
    if digits == 0 {
        return None;
    }

    let mut value: i64 = 0;
    for &b in &buffer[i..i + digits] {
        let digit = i64::from(b - b'0');
        value = value.saturating_mul(10);
        value = if negative {
            value.saturating_sub(digit)
        } else {
            value.saturating_add(digit)
        };
    }
    Some((value, i + digits))
}

/// Scan a decimal real number starting exactly at `start`: optional sign,
/// digits with an optional fractional part, optional exponent.
///
/// At least one mantissa digit is required (`5`, `5.`, `.5` are accepted, `.`
/// is not). An `e` not followed by exponent digits is left unconsumed.
/// Values that overflow `f64` are rejected.
pub fn scan_float(buffer: &[u8], start: usize) -> Option<(f64, usize)> {
    let mut i = start;
    if matches!(buffer.get(i), Some(b'+' | b'-')) {
        i += 1;
    }

    let int_digits = count_digits(buffer, i);
    i += int_digits;

    let mut frac_digits = 0;
    if buffer.get(i) == Some(&b'.') {
        frac_digits = count_digits(buffer, i + 1);
        if int_digits + frac_digits > 0 {
            i += 1 + frac_digits;
        }
    }
    if int_digits + frac_digits == 0 {
        return None;
    }

    if matches!(buffer.get(i), Some(b'e' | b'E')) {
        let mut j = i + 1;
        if matches!(buffer.get(j), Some(b'+' | b'-')) {
            j += 1;
        }
        let exp_digits = count_digits(buffer, j);
        if exp_digits > 0 {
            i = j + exp_digits;
        }
    }

    let text = std::str::from_utf8(&buffer[start..i]).ok()?;
    let value = text.parse::<f64>().ok()?;
    if !value.is_finite() {
        return None;
    }
    Some((value, i))
}
