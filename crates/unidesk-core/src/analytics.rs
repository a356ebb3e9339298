// SPDX-FileCopyrightText: 2026 Unidesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dashboard analytics computed from stored conversation records.
//!
//! Pure aggregation, no storage access: callers pass the full
//! conversation list and get back the summary the dashboard renders.

use serde::Serialize;
use strum::IntoEnumIterator;

use crate::types::{Category, Conversation, Platform, Sentiment, TicketStatus};

/// One labeled slice of a distribution chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Slice {
    pub name: String,
    pub value: usize,
}

/// Query volume for one UTC day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayCount {
    pub date: chrono::NaiveDate,
    pub count: usize,
}

/// Aggregated view of the conversation store.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSummary {
    pub total_queries: usize,
    pub open: usize,
    pub resolved: usize,
    pub escalated: usize,
    /// Percentage of conversations marked Resolved, rounded.
    pub resolved_rate: u32,
    pub category_distribution: Vec<Slice>,
    pub sentiment_distribution: Vec<Slice>,
    pub platform_distribution: Vec<Slice>,
    /// Ascending by date, keyed on each conversation's last activity.
    pub queries_per_day: Vec<DayCount>,
}

impl AnalyticsSummary {
    /// Aggregates the given conversations.
    ///
    /// Distribution slices follow enum declaration order with zero-count
    /// entries omitted, so output is deterministic.
    pub fn from_conversations(conversations: &[Conversation]) -> Self {
        let total_queries = conversations.len();
        let mut open = 0;
        let mut resolved = 0;
        let mut escalated = 0;
        for conv in conversations {
            match conv.status {
                TicketStatus::Open => open += 1,
                TicketStatus::Resolved => resolved += 1,
                TicketStatus::Escalated => escalated += 1,
            }
        }

        let resolved_rate = if total_queries > 0 {
            ((resolved as f64 / total_queries as f64) * 100.0).round() as u32
        } else {
            0
        };

        let category_distribution = distribution(Category::iter(), |variant| {
            conversations.iter().filter(|c| c.category == variant).count()
        });
        let sentiment_distribution = distribution(Sentiment::iter(), |variant| {
            conversations.iter().filter(|c| c.sentiment == variant).count()
        });
        let platform_distribution = distribution(Platform::iter(), |variant| {
            conversations.iter().filter(|c| c.platform == variant).count()
        });

        let mut per_day = std::collections::BTreeMap::new();
        for conv in conversations {
            if let Some(when) = chrono::DateTime::from_timestamp_millis(conv.last_activity) {
                *per_day.entry(when.date_naive()).or_insert(0usize) += 1;
            }
        }
        let queries_per_day = per_day
            .into_iter()
            .map(|(date, count)| DayCount { date, count })
            .collect();

        Self {
            total_queries,
            open,
            resolved,
            escalated,
            resolved_rate,
            category_distribution,
            sentiment_distribution,
            platform_distribution,
            queries_per_day,
        }
    }
}

fn distribution<V, I, F>(variants: I, count: F) -> Vec<Slice>
where
    V: std::fmt::Display,
    I: Iterator<Item = V>,
    F: Fn(V) -> usize,
    V: Copy,
{
    variants
        .filter_map(|variant| {
            let value = count(variant);
            (value > 0).then(|| Slice {
                name: variant.to_string(),
                value,
            })
        })
        .collect()
}
