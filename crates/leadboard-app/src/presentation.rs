// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime, UtcOffset};

pub const NOT_AVAILABLE: &str = "N/A";
pub const NO_COMPANY: &str = "No Company Name";
pub const NO_SUMMARY: &str = "No summary available";
pub const NO_ANALYSIS: &str = "No lead analysis available";
pub const CURRENCY_GLYPH: &str = "₹";
pub const CHAT_LINK_BASE: &str = "https://t.me/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriorityBucket {
    High,
    Medium,
    Low,
    Default,
}

impl PriorityBucket {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
            Self::Default => "default",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreBucket {
    Strong,
    Good,
    Fair,
    Weak,
}

impl ScoreBucket {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Strong => "strong",
            Self::Good => "good",
            Self::Fair => "fair",
            Self::Weak => "weak",
        }
    }
}

pub fn priority_bucket(priority: &str) -> PriorityBucket {
    match priority.to_lowercase().as_str() {
        "high" => PriorityBucket::High,
        "medium" => PriorityBucket::Medium,
        "low" => PriorityBucket::Low,
        _ => PriorityBucket::Default,
    }
}

pub fn score_bucket(score: i64) -> ScoreBucket {
    if score >= 80 {
        ScoreBucket::Strong
    } else if score >= 60 {
        ScoreBucket::Good
    } else if score >= 40 {
        ScoreBucket::Fair
    } else {
        ScoreBucket::Weak
    }
}

/// Share of the possible score, in percent. A zero total clamps to 0.
pub fn score_percentage(score: i64, total: i64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let percentage = (score as f64) / (total as f64) * 100.0;
    if percentage.is_finite() {
        percentage
    } else {
        0.0
    }
}

pub fn chat_link(username: &str) -> String {
    format!("{CHAT_LINK_BASE}{username}")
}

pub fn display_or_na(value: Option<&str>) -> &str {
    display_or(value, NOT_AVAILABLE)
}

pub fn display_or<'a>(value: Option<&'a str>, fallback: &'a str) -> &'a str {
    match value {
        Some(text) if !text.trim().is_empty() => text,
        _ => fallback,
    }
}

/// `₹1,250,000`, with up to three fraction digits when present.
pub fn format_loan_amount(amount: Option<f64>) -> String {
    match amount {
        Some(value) if value.is_finite() => format!("{CURRENCY_GLYPH}{}", group_thousands(value)),
        _ => format!("{CURRENCY_GLYPH}{NOT_AVAILABLE}"),
    }
}

fn group_thousands(value: f64) -> String {
    let sign = if value < 0.0 { "-" } else { "" };
    let scaled = (value.abs() * 1000.0).round() as u128;
    let whole = scaled / 1000;
    let fraction = scaled % 1000;

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if fraction == 0 {
        return format!("{sign}{grouped}");
    }
    let fraction = format!("{fraction:03}");
    format!("{sign}{grouped}.{}", fraction.trim_end_matches('0'))
}

/// Renders an ISO-8601 timestamp in `offset`. Values that do not parse are
/// shown as received.
pub fn format_processed_at(raw: &str, offset: UtcOffset) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return NOT_AVAILABLE.to_owned();
    }

    let parsed = OffsetDateTime::parse(trimmed, &Rfc3339).ok().or_else(|| {
        PrimitiveDateTime::parse(
            trimmed,
            format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
        )
        .ok()
        .map(|naive| naive.assume_offset(offset))
    });

    parsed
        .and_then(|moment| {
            moment
                .to_offset(offset)
                .format(format_description!(
                    "[year]-[month]-[day] [hour]:[minute]:[second]"
                ))
                .ok()
        })
        .unwrap_or_else(|| trimmed.to_owned())
}

/// `loanRatio` becomes `Loan Ratio`.
pub fn humanize_key(key: &str) -> String {
    let mut spaced = String::with_capacity(key.len() + 4);
    for ch in key.chars() {
        if ch.is_ascii_uppercase() {
            spaced.push(' ');
        }
        spaced.push(ch);
    }

    spaced
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn format_breakdown_value(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

pub fn lead_count_label(count: usize) -> String {
    let plural = if count == 1 { "" } else { "s" };
    format!("{count} lead{plural} found")
}
