//! Number formatting for display.

/// Shown in place of a suppressed or missing value.
pub const NOT_AVAILABLE: &str = "N/A";

/// Inserts `,` thousands separators into a run of ASCII digits.
fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }

    out
}

/// Formats a count with thousands separators: `12345` → `"12,345"`.
#[must_use]
pub fn format_number(value: u64) -> String {
    group_thousands(&value.to_string())
}

/// Formats whole dollars: `1234.4` → `"$1,234"`.
#[must_use]
pub fn format_currency(value: f64) -> String {
    let rounded = format!("{:.0}", value.abs());
    let sign = if value.round() < 0.0 { "-" } else { "" };
    format!("{sign}${}", group_thousands(&rounded))
}

/// Formats a percentage with one decimal: `12.345` → `"12.3%"`.
#[must_use]
pub fn format_percent(value: f64) -> String {
    format!("{value:.1}%")
}

/// Formats a number in short compact notation: `1234` → `"1.2K"`,
/// `56789` → `"57K"`, `3_400_000` → `"3.4M"`.
///
/// Keeps two significant digits below 100 of a unit and whole units above.
#[must_use]
pub fn format_compact(value: f64) -> String {
    const UNITS: [(f64, &str); 4] = [(1e12, "T"), (1e9, "B"), (1e6, "M"), (1e3, "K")];

    let sign = if value < 0.0 { "-" } else { "" };
    let magnitude = value.abs();

    let mut scaled = None;
    for (i, (size, suffix)) in UNITS.iter().enumerate() {
        if magnitude >= *size {
            let mut shown = compact_round(magnitude / size);
            let mut suffix = *suffix;
            // 999.95K rounds up to 1000K; promote to the next unit instead.
            if shown >= 1000.0 && i > 0 {
                let (bigger, bigger_suffix) = UNITS[i - 1];
                shown = compact_round(magnitude / bigger);
                suffix = bigger_suffix;
            }
            scaled = Some((shown, suffix));
            break;
        }
    }

    match scaled {
        Some((shown, suffix)) => format!("{sign}{}{suffix}", trim_decimal(shown)),
        None => {
            let shown = magnitude.round();
            if shown >= 1000.0 {
                format!("{sign}1K")
            } else {
                format!("{sign}{shown:.0}")
            }
        }
    }
}

fn compact_round(scaled: f64) -> f64 {
    if scaled < 10.0 {
        (scaled * 10.0).round() / 10.0
    } else {
        scaled.round()
    }
}

fn trim_decimal(value: f64) -> String {
    let s = format!("{value:.1}");
    s.strip_suffix(".0").map_or(s.clone(), str::to_string)
}

/// Share of `total` that `value` represents, in percent.
///
/// Returns 0 when `total` is 0.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn percentage(value: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    value as f64 / total as f64 * 100.0
}

/// Formats an optional dollar amount, or [`NOT_AVAILABLE`].
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn format_optional_currency(value: Option<u64>) -> String {
    value.map_or_else(|| NOT_AVAILABLE.to_string(), |v| format_currency(v as f64))
}
