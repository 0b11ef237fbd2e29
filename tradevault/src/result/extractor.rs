//! Interpretation of decoded job output.
//!
//! Rules are evaluated in a fixed priority order and the first one that
//! recognizes the payload wins. Anything unrecognized stays an unstructured
//! text preview; that is not an error.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::classifier::{ClassifiedContent, ContentKind};
use crate::config::PREVIEW_MAX_CHARS;

pub const ACTION_PREVIEW: &str = "Transaction Ready for Execution";
pub const DEFAULT_ACTION_SUMMARY: &str = "Transaction generated successfully.";

const SCORE_FIELD: &str = "fiability-score";

static FALLBACK_BUY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\[fallback\s+BUY\]").expect("valid regex"));
static FALLBACK_SELL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\[fallback\s+SELL\]").expect("valid regex"));
static PERCENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9]+(?:\.[0-9]+)?)%").expect("valid regex"));

/// A transaction descriptor emitted by the remote application.
///
/// The object is kept verbatim so unknown fields survive to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutableAction(pub Map<String, Value>);

impl ExecutableAction {
    fn field(&self, name: &str) -> Option<&str> {
        self.0
            .get(name)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn target_contract(&self) -> Option<&str> {
        self.field("target_contract")
    }

    pub fn calldata(&self) -> Option<&str> {
        self.field("calldata")
    }

    /// Value to send with the transaction (defaults to zero).
    pub fn value(&self) -> &str {
        self.field("value").unwrap_or("0x0")
    }
}

/// What a result turned out to be.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Interpretation {
    Binary,
    UnstructuredText,
    FiabilityScore {
        score: Value,
    },
    Recommendation {
        buy_percent: Option<f64>,
        sell_percent: Option<f64>,
        advice: String,
    },
    ExecutableAction {
        action: ExecutableAction,
    },
}

/// Interpreted result handed back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedOutcome {
    /// Bounded preview text (empty for binary results).
    pub preview: String,
    pub filename: String,
    pub kind: ContentKind,
    pub summary: Option<String>,
    pub interpretation: Interpretation,
}

impl ExtractedOutcome {
    /// Interpret classified content.
    pub fn from_content(content: &ClassifiedContent) -> Self {
        let (preview, summary, interpretation) = match &content.text {
            Some(text) => {
                let parsed = interpret_text(text);
                (parsed.preview, parsed.summary, parsed.interpretation)
            }
            None => (String::new(), None, Interpretation::Binary),
        };
        Self {
            preview,
            filename: content.filename.clone(),
            kind: content.kind,
            summary,
            interpretation,
        }
    }

    pub const fn action(&self) -> Option<&ExecutableAction> {
        match &self.interpretation {
            Interpretation::ExecutableAction { action } => Some(action),
            _ => None,
        }
    }

    pub const fn mime(&self) -> &'static str {
        self.kind.mime()
    }
}

/// Preview, summary and interpretation of a text payload.
#[derive(Debug, Clone, PartialEq)]
pub struct TextInterpretation {
    pub preview: String,
    pub summary: Option<String>,
    pub interpretation: Interpretation,
}

type Rule = fn(&Map<String, Value>) -> Option<TextInterpretation>;

/// Interpretation rules in priority order.
const RULES: &[(&str, Rule)] = &[
    ("action", action_rule),
    ("fiability-score", score_rule),
    ("recommendation", recommendation_rule),
];

/// First `max` characters of `text`.
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Apply the interpretation rules to decoded text.
pub fn interpret_text(text: &str) -> TextInterpretation {
    let unstructured = || TextInterpretation {
        preview: truncate_chars(text, PREVIEW_MAX_CHARS).to_string(),
        summary: None,
        interpretation: Interpretation::UnstructuredText,
    };

    let Ok(Value::Object(object)) = serde_json::from_str::<Value>(text) else {
        return unstructured();
    };

    RULES
        .iter()
        .find_map(|(name, rule)| {
            let hit = rule(&object);
            if hit.is_some() {
                tracing::debug!("Result matched the {} rule", name);
            }
            hit
        })
        .unwrap_or_else(unstructured)
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn action_rule(object: &Map<String, Value>) -> Option<TextInterpretation> {
    let action = object.get("action")?.as_object()?;
    if !action.get("calldata").is_some_and(is_truthy) {
        return None;
    }
    let summary = object
        .get("message")
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty())
        .unwrap_or(DEFAULT_ACTION_SUMMARY);

    Some(TextInterpretation {
        preview: ACTION_PREVIEW.to_string(),
        summary: Some(summary.to_string()),
        interpretation: Interpretation::ExecutableAction {
            action: ExecutableAction(action.clone()),
        },
    })
}

fn score_rule(object: &Map<String, Value>) -> Option<TextInterpretation> {
    let score = object.get(SCORE_FIELD)?;
    Some(TextInterpretation {
        preview: format!("Fiability score: {}", render_scalar(score)),
        summary: None,
        interpretation: Interpretation::FiabilityScore {
            score: score.clone(),
        },
    })
}

fn recommendation_rule(object: &Map<String, Value>) -> Option<TextInterpretation> {
    let explanations: Vec<&str> = object
        .get("explanations")
        .and_then(Value::as_array)
        .map(|lines| lines.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();
    let buy_line = explanations.iter().copied().find(|l| FALLBACK_BUY.is_match(l));
    let sell_line = explanations.iter().copied().find(|l| FALLBACK_SELL.is_match(l));

    let recommendation = object.get("recommendation").and_then(Value::as_object);
    let number = |field: &str| {
        recommendation
            .and_then(|r| r.get(field))
            .and_then(Value::as_f64)
    };

    let buy_percent = number("buy_percent")
        .or_else(|| number("percent"))
        .or_else(|| buy_line.and_then(percent_in_line));
    let sell_percent = number("sell_percent").or_else(|| sell_line.and_then(percent_in_line));

    if buy_percent.is_none() && sell_percent.is_none() {
        return None;
    }

    let advice = compose_advice(buy_percent, sell_percent);
    let fallback_text = [buy_line, sell_line]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join("\n");
    let preview = if fallback_text.is_empty() {
        advice.clone()
    } else {
        fallback_text
    };

    Some(TextInterpretation {
        preview,
        summary: (!advice.is_empty()).then(|| advice.clone()),
        interpretation: Interpretation::Recommendation {
            buy_percent,
            sell_percent,
            advice,
        },
    })
}

fn percent_in_line(line: &str) -> Option<f64> {
    PERCENT
        .captures(line)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Render a percentage with at most two decimals, trailing zeros stripped.
pub fn format_percent(value: f64) -> Option<String> {
    if !value.is_finite() {
        return None;
    }
    let fixed = format!("{value:.2}");
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    Some(match trimmed {
        "" | "-" | "-0" => "0".to_string(),
        other => other.to_string(),
    })
}

/// Compose the capital allocation sentence, e.g. `Use 60% of your capital to long and 40% to short.`
pub fn compose_advice(buy_percent: Option<f64>, sell_percent: Option<f64>) -> String {
    let mut pieces = Vec::with_capacity(2);
    if let Some(buy) = buy_percent.and_then(format_percent) {
        pieces.push(format!("{buy}% of your capital to long"));
    }
    if let Some(sell) = sell_percent.and_then(format_percent) {
        pieces.push(format!("{sell}% to short"));
    }
    if pieces.is_empty() {
        String::new()
    } else {
        format!("Use {}.", pieces.join(" and "))
    }
}

fn render_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
            Some(f) => f.to_string(),
            None => n.to_string(),
        },
        other => other.to_string(),
    }
}
