//! Integer range grammar generator.
//!
//! Emits a fragment matching exactly the decimal encodings of the integers
//! in an inclusive range, with an optional leading `-` and no leading zeros
//! (other than the literal `0`). Negative ranges recurse on the sign-flipped
//! positive range; ranges spanning several digit counts split into one band
//! per digit length; one-sided ranges are capped at `MAX_RANGE_DIGITS`
//! digits so the grammar stays finite.

/// Digit ceiling for one-sided ranges.
pub const MAX_RANGE_DIGITS: usize = 16;

/// Append a grammar fragment for the integers in `[min, max]` to `out`.
/// At least one bound must be present; the visitor guarantees this.
pub fn generate_min_max_int(
    min_value: Option<i64>,
    max_value: Option<i64>,
    out: &mut String,
    decimals_left: usize,
    top_level: bool,
) {
    debug_assert!(min_value.is_some() || max_value.is_some());

    if let (Some(min), Some(max)) = (min_value, max_value) {
        if min < 0 && max < 0 {
            out.push_str("\"-\" (");
            generate_min_max_int(Some(-max), Some(-min), out, decimals_left, true);
            out.push(')');
            return;
        }

        let mut min = min;
        if min < 0 {
            out.push_str("\"-\" (");
            generate_min_max_int(Some(0), Some(-min), out, decimals_left, true);
            out.push_str(") | ");
            min = 0;
        }

        let mut min_s = min.to_string();
        let max_s = max.to_string();
        let min_digits = min_s.len();
        let max_digits = max_s.len();

        // One alternative per digit-length band, then the final partial band.
        for digits in min_digits..max_digits {
            uniform_range(out, &min_s, &"9".repeat(digits));
            min_s = format!("1{}", "0".repeat(digits));
            out.push_str(" | ");
        }
        uniform_range(out, &min_s, &max_s);
        return;
    }

    let less_decimals = decimals_left.saturating_sub(1).max(1);

    if let Some(min) = min_value {
        if min < 0 {
            out.push_str("\"-\" (");
            generate_min_max_int(None, Some(-min), out, decimals_left, false);
            out.push_str(") | [0] | [1-9] ");
            more_digits(out, 0, Some(decimals_left - 1));
        } else if min == 0 {
            if top_level {
                out.push_str("[0] | [1-9] ");
                more_digits(out, 0, Some(less_decimals));
            } else {
                more_digits(out, 1, Some(decimals_left));
            }
        } else if min <= 9 {
            let c = (b'0' + min as u8) as char;
            let range_start = if top_level { '1' } else { '0' };
            if c > range_start {
                digit_range(out, range_start, prev_digit(c));
                out.push(' ');
                more_digits(out, 1, Some(less_decimals));
                out.push_str(" | ");
            }
            digit_range(out, c, '9');
            out.push(' ');
            more_digits(out, 0, Some(less_decimals));
        } else {
            let min_s = min.to_string();
            let length = min_s.len();
            let c = min_s.as_bytes()[0] as char;

            if c > '1' {
                digit_range(out, if top_level { '1' } else { '0' }, prev_digit(c));
                out.push(' ');
                more_digits(out, length, Some(less_decimals));
                out.push_str(" | ");
            }
            digit_range(out, c, c);
            out.push_str(" (");
            let tail: i64 = min_s[1..].parse().unwrap_or(0);
            generate_min_max_int(Some(tail), None, out, less_decimals, false);
            out.push(')');
            if c < '9' {
                out.push_str(" | ");
                digit_range(out, next_digit(c), '9');
                out.push(' ');
                more_digits(out, length - 1, Some(less_decimals));
            }
        }
        return;
    }

    if let Some(max) = max_value {
        if max >= 0 {
            if top_level {
                out.push_str("\"-\" [1-9] ");
                more_digits(out, 0, Some(less_decimals));
                out.push_str(" | ");
            }
            generate_min_max_int(Some(0), Some(max), out, decimals_left, true);
        } else {
            out.push_str("\"-\" (");
            generate_min_max_int(Some(-max), None, out, decimals_left, false);
            out.push(')');
        }
    }
}

fn prev_digit(c: char) -> char {
    (c as u8 - 1) as char
}

fn next_digit(c: char) -> char {
    (c as u8 + 1) as char
}

fn digit_range(out: &mut String, from: char, to: char) {
    out.push('[');
    out.push(from);
    if from != to {
        out.push('-');
        out.push(to);
    }
    out.push(']');
}

fn more_digits(out: &mut String, min_digits: usize, max_digits: Option<usize>) {
    out.push_str("[0-9]");
    if max_digits == Some(min_digits) && min_digits == 1 {
        return;
    }
    out.push('{');
    out.push_str(&min_digits.to_string());
    if max_digits != Some(min_digits) {
        out.push(',');
        if let Some(max) = max_digits {
            out.push_str(&max.to_string());
        }
    }
    out.push('}');
}

/// Emit the digit strings between `from` and `to`, which have equal length.
/// Peels off the common literal prefix, then branches on the first diverging
/// digit: the low edge with a constrained suffix, a free middle band, and
/// the high edge with a constrained suffix.
fn uniform_range(out: &mut String, from: &str, to: &str) {
    debug_assert_eq!(from.len(), to.len());
    let shared = from
        .bytes()
        .zip(to.bytes())
        .take_while(|(a, b)| a == b)
        .count();
    if shared > 0 {
        out.push('"');
        out.push_str(&from[..shared]);
        out.push('"');
    }
    if shared >= from.len() {
        return;
    }
    if shared > 0 {
        out.push(' ');
    }

    let fc = from.as_bytes()[shared] as char;
    let tc = to.as_bytes()[shared] as char;
    let sub_len = from.len() - shared - 1;

    if sub_len == 0 {
        digit_range(out, fc, tc);
        return;
    }

    let from_sub = &from[shared + 1..];
    let to_sub = &to[shared + 1..];
    let sub_zeros = "0".repeat(sub_len);
    let sub_nines = "9".repeat(sub_len);

    let mut to_reached = false;
    out.push('(');
    if from_sub == sub_zeros {
        digit_range(out, fc, prev_digit(tc));
        out.push(' ');
        more_digits(out, sub_len, Some(sub_len));
    } else {
        out.push('[');
        out.push(fc);
        out.push_str("] (");
        uniform_range(out, from_sub, &sub_nines);
        out.push(')');
        if (fc as u8) < tc as u8 - 1 {
            out.push_str(" | ");
            if to_sub == sub_nines {
                digit_range(out, next_digit(fc), tc);
                to_reached = true;
            } else {
                digit_range(out, next_digit(fc), prev_digit(tc));
            }
            out.push(' ');
            more_digits(out, sub_len, Some(sub_len));
        }
    }
    if !to_reached {
        out.push_str(" | ");
        digit_range(out, tc, tc);
        out.push(' ');
        uniform_range(out, &sub_zeros, to_sub);
    }
    out.push(')');
}
