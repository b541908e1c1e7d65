//! Date display styles.
//!
//! `Short` is the compact `<day>-<alias>-<year>` form and parses back to the
//! same date. `Long` and `Wordy` are prose renderings. `Mask` substitutes
//! `$` tokens in a caller-supplied template:
//!
//! | Token | Meaning |
//! |-------|---------|
//! | `$d`  | day number |
//! | `$dd` | day number, zero-padded to two digits |
//! | `$o`  | ordinal day (`3rd`) |
//! | `$O`  | ordinal day in words (`third`) |
//! | `$ma` | month alias |
//! | `$ms` | month short name |
//! | `$mf` | month full name |
//! | `$mn` | month true order |
//! | `$y`  | year |
//! | `$w`  | weekday name (empty on non-weekdays) |
//! | `$ss` | special day short name (empty if none) |
//! | `$sf` | special day full name (empty if none) |
//! | `$$`  | literal `$` |
//!
//! Unknown tokens are copied through unchanged.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::date::MudDate;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisplayMode {
    Short,
    Long,
    Wordy,
    Mask(String),
}

impl FromStr for DisplayMode {
    type Err = String;

    /// `short`, `long`, `wordy`, or any string containing `$` as a mask.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "short" => Ok(DisplayMode::Short),
            "long" => Ok(DisplayMode::Long),
            "wordy" => Ok(DisplayMode::Wordy),
            _ if s.contains('$') => Ok(DisplayMode::Mask(s.to_string())),
            _ => Err(format!(
                "unknown display mode '{}' (expected short, long, wordy or a $-mask)",
                s
            )),
        }
    }
}

/// Render `date` in the given style.
pub fn render(date: &MudDate, mode: &DisplayMode) -> String {
    match mode {
        DisplayMode::Short => date.date_string(),
        DisplayMode::Long => render_long(date),
        DisplayMode::Wordy => render_wordy(date),
        DisplayMode::Mask(mask) => render_mask(date, mask),
    }
}

/// `Moon, 3rd of March, year 12`, with the special day name in parentheses
/// after the month when there is one.
fn render_long(date: &MudDate) -> String {
    let mut out = String::new();
    if date.is_weekday() {
        out.push_str(date.weekday());
        out.push_str(", ");
    }
    out.push_str(&ordinal(date.day() as u64));
    out.push_str(" of ");
    out.push_str(date.month().full_name());
    if let Some(special) = date.special_day() {
        out.push_str(&format!(" ({})", special.full_name));
    }
    out.push_str(&format!(", year {}", date.year()));
    out
}

/// `Moon the third day of March in the year 12`.
fn render_wordy(date: &MudDate) -> String {
    let mut out = String::new();
    if let Some(special) = date.special_day() {
        out.push_str(&special.full_name);
        out.push_str(", ");
    }
    if date.is_weekday() {
        out.push_str(date.weekday());
        out.push(' ');
    }
    out.push_str(&format!(
        "the {} day of {} in the year {}",
        ordinal_words(date.day() as u64),
        date.month().full_name(),
        date.year()
    ));
    capitalise(&out)
}

const MASK_TOKENS: &[&str] = &[
    "dd", "d", "o", "O", "ma", "ms", "mf", "mn", "y", "w", "ss", "sf", "$",
];

fn render_mask(date: &MudDate, mask: &str) -> String {
    let mut out = String::with_capacity(mask.len());
    let mut rest = mask;
    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];
        match MASK_TOKENS.iter().find(|t| after.starts_with(**t)) {
            Some(token) => {
                out.push_str(&expand_token(date, token));
                rest = &after[token.len()..];
            }
            None => {
                out.push('$');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

fn expand_token(date: &MudDate, token: &str) -> String {
    let special = date.special_day();
    match token {
        "d" => date.day().to_string(),
        "dd" => format!("{:02}", date.day()),
        "o" => ordinal(date.day() as u64),
        "O" => ordinal_words(date.day() as u64),
        "ma" => date.month().alias().to_string(),
        "ms" => date.month().short_name().to_string(),
        "mf" => date.month().full_name().to_string(),
        "mn" => date.month().true_order().to_string(),
        "y" => date.year().to_string(),
        "w" => date.weekday().to_string(),
        "ss" => special.map(|s| s.short_name.clone()).unwrap_or_default(),
        "sf" => special.map(|s| s.full_name.clone()).unwrap_or_default(),
        "$" => "$".to_string(),
        other => format!("${}", other),
    }
}

/// `1st`, `2nd`, `3rd`, `11th`, `22nd`.
pub fn ordinal(n: u64) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{}{}", n, suffix)
}

const UNIT_ORDINALS: [&str; 20] = [
    "zeroth", "first", "second", "third", "fourth", "fifth", "sixth", "seventh", "eighth", "ninth",
    "tenth", "eleventh", "twelfth", "thirteenth", "fourteenth", "fifteenth", "sixteenth",
    "seventeenth", "eighteenth", "nineteenth",
];

const TENS: [(&str, &str); 10] = [
    ("", ""),
    ("", ""),
    ("twenty", "twentieth"),
    ("thirty", "thirtieth"),
    ("forty", "fortieth"),
    ("fifty", "fiftieth"),
    ("sixty", "sixtieth"),
    ("seventy", "seventieth"),
    ("eighty", "eightieth"),
    ("ninety", "ninetieth"),
];

/// Ordinal in words below 100 (`twenty-first`), numeric ordinal above.
pub fn ordinal_words(n: u64) -> String {
    match n {
        0..=19 => UNIT_ORDINALS[n as usize].to_string(),
        20..=99 => {
            let (tens, units) = ((n / 10) as usize, (n % 10) as usize);
            if units == 0 {
                TENS[tens].1.to_string()
            } else {
                format!("{}-{}", TENS[tens].0, UNIT_ORDINALS[units])
            }
        }
        _ => ordinal(n),
    }
}

fn capitalise(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
