// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::de::{IgnoredAny, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::ids::UserId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadRecord {
    #[serde(rename = "userid")]
    pub user_id: UserId,
    #[serde(default, deserialize_with = "lenient_text")]
    pub company: Option<String>,
    #[serde(
        default,
        rename = "typeOfBusiness",
        deserialize_with = "lenient_text"
    )]
    pub business_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub turnover: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub profit_margin: Option<String>,
    #[serde(default)]
    pub loan_amount: Option<f64>,
    #[serde(default, rename = "reasonForLoan", deserialize_with = "lenient_text")]
    pub loan_reason: Option<String>,
    #[serde(
        default,
        rename = "durationOfLoan",
        deserialize_with = "lenient_text"
    )]
    pub loan_duration: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub collateral: Option<String>,
    #[serde(default, rename = "shortSummary", deserialize_with = "lenient_text")]
    pub summary: Option<String>,
    #[serde(default, rename = "leadInference")]
    pub inference: Option<LeadInference>,
}

impl LeadRecord {
    /// Score used for ordering; an unscored lead counts as zero.
    pub fn effective_score(&self) -> i64 {
        self.inference
            .as_ref()
            .map(|inference| inference.lead_score)
            .unwrap_or(0)
    }
}

/// Scoring output attached to a lead. Loosely typed or `null` values decode
/// to empty text or a zero score so one odd lead never sinks the list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadInference {
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[serde(default, deserialize_with = "lenient_score")]
    pub lead_score: i64,
    #[serde(default, deserialize_with = "lenient_string")]
    pub lead_category: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub priority: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub recommended_action: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub conversion_probability: String,
    #[serde(default)]
    pub score_breakdown: ScoreBreakdown,
    #[serde(default, deserialize_with = "lenient_score")]
    pub total_possible_score: i64,
    #[serde(default, deserialize_with = "lenient_string")]
    pub processed_at: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreComponent {
    pub name: String,
    pub value: f64,
}

/// Named sub-scores in the order the backend sent them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreBreakdown(Vec<ScoreComponent>);

impl ScoreBreakdown {
    pub fn new(components: Vec<ScoreComponent>) -> Self {
        Self(components)
    }

    pub fn components(&self) -> &[ScoreComponent] {
        &self.0
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.0
            .iter()
            .find(|component| component.name == name)
            .map(|component| component.value)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, f64)> for ScoreBreakdown {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(name, value)| ScoreComponent { name, value })
                .collect(),
        )
    }
}

impl Serialize for ScoreBreakdown {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for component in &self.0 {
            map.serialize_entry(&component.name, &component.value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ScoreBreakdown {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct BreakdownVisitor;

        impl<'de> Visitor<'de> for BreakdownVisitor {
            type Value = ScoreBreakdown;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of sub-score names to numbers")
            }

            fn visit_unit<E>(self) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(ScoreBreakdown::default())
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut components = Vec::with_capacity(access.size_hint().unwrap_or(9));
                while let Some((name, raw)) =
                    access.next_entry::<String, Option<RawNumber>>()?
                {
                    // Null or non-numeric sub-scores are skipped.
                    if let Some(value) = raw.and_then(RawNumber::as_f64) {
                        components.push(ScoreComponent { name, value });
                    }
                }
                Ok(ScoreBreakdown(components))
            }
        }

        deserializer.deserialize_any(BreakdownVisitor)
    }
}

/// Display fields are free-form; numbers and booleans are kept as their text.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawText {
        Text(String),
        Integer(i64),
        Float(f64),
        Flag(bool),
    }

    let raw = Option::<RawText>::deserialize(deserializer)?;
    Ok(raw.map(|value| match value {
        RawText::Text(text) => text,
        RawText::Integer(number) => number.to_string(),
        RawText::Float(number) => number.to_string(),
        RawText::Flag(flag) => flag.to_string(),
    }))
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    lenient_text(deserializer).map(Option::unwrap_or_default)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawNumber {
    Integer(i64),
    Float(f64),
    Text(String),
    Other(IgnoredAny),
}

impl RawNumber {
    fn as_f64(self) -> Option<f64> {
        let value = match self {
            RawNumber::Integer(number) => number as f64,
            RawNumber::Float(number) => number,
            RawNumber::Text(text) => text.trim().parse().ok()?,
            RawNumber::Other(_) => return None,
        };
        value.is_finite().then_some(value)
    }
}

/// Whole-point score; fractions are truncated and anything unreadable is 0.
fn lenient_score<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawNumber>::deserialize(deserializer)?;
    Ok(match raw {
        Some(RawNumber::Integer(number)) => number,
        Some(other) => other.as_f64().map_or(0, |value| value.trunc() as i64),
        None => 0,
    })
}

/// Reply of the chat-handle lookup. An empty username means the lead has no
/// Telegram handle on file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatHandle {
    #[serde(default)]
    pub username: Option<String>,
}

impl ChatHandle {
    pub fn username(&self) -> Option<&str> {
        self.username
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}
