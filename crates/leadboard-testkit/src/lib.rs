// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use leadboard_app::{ChatHandle, LeadInference, LeadRecord, ScoreBreakdown, UserId};
use std::path::PathBuf;
use time::format_description::well_known::Rfc3339;
use time::{Date, Duration, Month, OffsetDateTime, Time};

const COMPANY_STEMS: [&str; 16] = [
    "Sharma", "Patel", "Iyer", "Kapoor", "Reddy", "Mehta", "Nair", "Ghosh", "Bose", "Verma",
    "Joshi", "Khanna", "Rao", "Desai", "Pillai", "Saxena",
];

const COMPANY_TRADES: [&str; 12] = [
    "Textiles",
    "Foods",
    "Logistics",
    "Pharma",
    "Electricals",
    "Agro",
    "Motors",
    "Packaging",
    "Steel",
    "Furnishings",
    "Traders",
    "Dairy",
];

const COMPANY_SUFFIXES: [&str; 5] = ["Pvt Ltd", "Enterprises", "& Sons", "Industries", "LLP"];

const BUSINESS_TYPES: [&str; 8] = [
    "Manufacturing",
    "Retail",
    "Wholesale",
    "Services",
    "Trading",
    "Export",
    "Food Processing",
    "Transport",
];

const TURNOVER_BANDS: [&str; 6] = [
    "Below 50 Lakh",
    "50 Lakh - 1 Cr",
    "1 - 5 Cr",
    "5 - 10 Cr",
    "10 - 25 Cr",
    "Above 25 Cr",
];

const LOAN_REASONS: [&str; 8] = [
    "Working capital",
    "Machinery purchase",
    "Expansion to a second unit",
    "Inventory build-up for festive season",
    "Vehicle fleet upgrade",
    "Debt consolidation",
    "Warehouse construction",
    "Export order financing",
];

const LOAN_DURATIONS: [&str; 6] = [
    "6 months",
    "12 months",
    "24 months",
    "36 months",
    "48 months",
    "60 months",
];

const COLLATERALS: [&str; 6] = [
    "Residential property",
    "Commercial property",
    "Machinery",
    "Fixed deposit",
    "Gold",
    "None",
];

const RECOMMENDED_ACTIONS: [&str; 6] = [
    "Call within 24 hours",
    "Schedule a site visit",
    "Request bank statements",
    "Send document checklist",
    "Add to nurture campaign",
    "Verify collateral valuation",
];

const SUMMARY_WORDS: [&str; 24] = [
    "steady",
    "growing",
    "seasonal",
    "orders",
    "demand",
    "margins",
    "suppliers",
    "customers",
    "cash",
    "flow",
    "repeat",
    "business",
    "family",
    "owned",
    "second",
    "generation",
    "export",
    "regional",
    "distribution",
    "capacity",
    "upgrade",
    "banking",
    "history",
    "stable",
];

const TELEGRAM_HANDLES: [&str; 10] = [
    "arjun_k", "meera.s", "rohit_traders", "anita_p", "vikram_r", "kavya_n", "suresh_m",
    "deepa_i", "nikhil_b", "pooja_v",
];

/// Sub-score names and their maximum points, in the order the scorer emits
/// them. `penalty` only ever subtracts.
const BREAKDOWN_MAXIMA: [(&str, i64); 9] = [
    ("businessType", 10),
    ("businessClarity", 10),
    ("loanRatio", 15),
    ("turnover", 15),
    ("loanPurpose", 10),
    ("growthIntent", 10),
    ("collateral", 15),
    ("completeness", 15),
    ("penalty", 0),
];

const TOTAL_POSSIBLE_SCORE: i64 = 100;
const REFERENCE_YEAR: i32 = 2026;
const DEMO_SEED: u64 = 42;
const DEMO_LEAD_COUNT: usize = 12;

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }
}

#[derive(Debug, Clone)]
pub struct LeadFaker {
    rng: DeterministicRng,
    next_id: u64,
}

impl LeadFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
            next_id: normalized.wrapping_mul(1_000),
        }
    }

    /// A lead that is scored roughly five times out of six.
    pub fn lead(&mut self) -> LeadRecord {
        if self.rng.int_n(6) == 0 {
            self.unscored_lead()
        } else {
            self.scored_lead()
        }
    }

    pub fn leads(&mut self, count: usize) -> Vec<LeadRecord> {
        (0..count).map(|_| self.lead()).collect()
    }

    pub fn unscored_lead(&mut self) -> LeadRecord {
        let user_id = self.next_user_id();
        let company = format!(
            "{} {} {}",
            self.pick(&COMPANY_STEMS),
            self.pick(&COMPANY_TRADES),
            self.pick(&COMPANY_SUFFIXES),
        );
        let profit_margin = if self.rng.int_n(5) == 0 {
            None
        } else {
            Some(format!("{}%", self.int_range(4, 28)))
        };

        LeadRecord {
            user_id,
            company: Some(company),
            business_type: Some(self.pick(&BUSINESS_TYPES).to_owned()),
            turnover: Some(self.pick(&TURNOVER_BANDS).to_owned()),
            profit_margin,
            loan_amount: Some((self.int_range(1, 200) * 50_000) as f64),
            loan_reason: Some(self.pick(&LOAN_REASONS).to_owned()),
            loan_duration: Some(self.pick(&LOAN_DURATIONS).to_owned()),
            collateral: Some(self.pick(&COLLATERALS).to_owned()),
            summary: Some(self.sentence(8, 18)),
            inference: None,
        }
    }

    pub fn scored_lead(&mut self) -> LeadRecord {
        let mut lead = self.unscored_lead();
        lead.inference = Some(self.inference(&lead.user_id));
        lead
    }

    pub fn inference(&mut self, user_id: &UserId) -> LeadInference {
        let breakdown: ScoreBreakdown = BREAKDOWN_MAXIMA
            .iter()
            .map(|(name, max)| {
                let value = if *max == 0 {
                    -self.int_range(0, 10)
                } else {
                    self.int_range(0, *max)
                };
                ((*name).to_owned(), value as f64)
            })
            .collect();
        let raw_score: f64 = breakdown
            .components()
            .iter()
            .map(|component| component.value)
            .sum();
        let lead_score = (raw_score as i64).clamp(0, TOTAL_POSSIBLE_SCORE);

        let (category, priority) = match lead_score {
            score if score >= 80 => ("Hot Lead", "High"),
            60..=79 => ("Warm Lead", "Medium"),
            40..=59 => ("Nurture", "Medium"),
            _ => ("Cold Lead", "Low"),
        };
        let start = reference_now();
        let processed_at =
            self.random_datetime_between(start, start + Duration::days(60));

        LeadInference {
            user_id: Some(user_id.clone()),
            lead_score,
            lead_category: category.to_owned(),
            priority: priority.to_owned(),
            recommended_action: self.pick(&RECOMMENDED_ACTIONS).to_owned(),
            conversion_probability: format!("{}%", (lead_score * 9 / 10).max(5)),
            score_breakdown: breakdown,
            total_possible_score: TOTAL_POSSIBLE_SCORE,
            processed_at: processed_at
                .format(&Rfc3339)
                .unwrap_or_else(|_| fixture_datetime().to_owned()),
        }
    }

    /// Stable per-id answer for the chat-handle lookup; roughly one lead in
    /// four has no handle on file.
    pub fn chat_handle_for(user_id: &UserId) -> ChatHandle {
        let hash = user_id
            .as_str()
            .bytes()
            .fold(0_u64, |acc, byte| acc.wrapping_mul(31).wrapping_add(u64::from(byte)));
        if hash % 4 == 0 {
            return ChatHandle { username: None };
        }
        let handle = TELEGRAM_HANDLES[(hash as usize) % TELEGRAM_HANDLES.len()];
        ChatHandle {
            username: Some(handle.to_owned()),
        }
    }

    fn next_user_id(&mut self) -> UserId {
        self.next_id = self.next_id.wrapping_add(1 + self.rng.int_n(17) as u64);
        UserId::new(format!("{}", 5_000_000_000_u64 + self.next_id))
    }

    fn pick<'a>(&mut self, items: &'a [&'a str]) -> &'a str {
        items[self.rng.int_n(items.len())]
    }

    fn int_range(&mut self, min: i64, max: i64) -> i64 {
        if max <= min {
            return min;
        }
        let span = max - min + 1;
        min + (self.rng.next_u64() % (span as u64)) as i64
    }

    fn random_datetime_between(
        &mut self,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> OffsetDateTime {
        let start_ts = start.unix_timestamp();
        let end_ts = end.unix_timestamp();
        if end_ts <= start_ts {
            return start;
        }
        let span = (end_ts - start_ts) as u64;
        let offset = self.rng.next_u64() % (span + 1);
        OffsetDateTime::from_unix_timestamp(start_ts + offset as i64).unwrap_or(start)
    }

    fn sentence(&mut self, min_words: usize, max_words: usize) -> String {
        let span = max_words.saturating_sub(min_words) + 1;
        let count = min_words + self.rng.int_n(span);
        let mut sentence = (0..count)
            .map(|_| self.pick(&SUMMARY_WORDS))
            .collect::<Vec<_>>()
            .join(" ");
        if let Some(first) = sentence.get_mut(0..1) {
            first.make_ascii_uppercase();
        }
        sentence.push('.');
        sentence
    }
}

/// The fixed lead set served by `--demo`.
pub fn demo_leads() -> Vec<LeadRecord> {
    LeadFaker::new(DEMO_SEED).leads(DEMO_LEAD_COUNT)
}

/// Minimal lead with an optional score, for ordering tests.
pub fn lead_with_score(user_id: &str, score: Option<i64>, priority: &str) -> LeadRecord {
    LeadRecord {
        user_id: UserId::from(user_id),
        company: Some(format!("Lead {user_id}")),
        business_type: None,
        turnover: None,
        profit_margin: None,
        loan_amount: None,
        loan_reason: None,
        loan_duration: None,
        collateral: None,
        summary: None,
        inference: score.map(|lead_score| LeadInference {
            user_id: Some(UserId::from(user_id)),
            lead_score,
            lead_category: "Fixture".to_owned(),
            priority: priority.to_owned(),
            recommended_action: "Follow up".to_owned(),
            conversion_probability: "50%".to_owned(),
            score_breakdown: ScoreBreakdown::default(),
            total_possible_score: TOTAL_POSSIBLE_SCORE,
            processed_at: fixture_datetime().to_owned(),
        }),
    }
}

pub fn fixture_datetime() -> &'static str {
    "2026-02-19T12:34:56Z"
}

pub fn breakdown_keys() -> impl Iterator<Item = &'static str> {
    BREAKDOWN_MAXIMA.iter().map(|(name, _)| *name)
}

pub fn temp_config_path() -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let config_path = dir.path().join("config.toml");
    Ok((dir, config_path))
}

fn reference_now() -> OffsetDateTime {
    let date = Date::from_calendar_date(REFERENCE_YEAR, Month::January, 1)
        .unwrap_or(Date::MIN);
    date.with_time(Time::MIDNIGHT).assume_utc()
}
