//! Chat turn handling and meal plan generation.

use chrono::{DateTime, Utc};
use healthroute_core::meal_plan::parse_week_plan_at;
use healthroute_core::models::WeekPlan;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, info};

use crate::completion::{
    CompletionError, CompletionResult, CompletionSource, CHAT_MAX_TOKENS, MEAL_PLAN_MAX_TOKENS,
};
use crate::prompts::{build_meal_plan_prompt, format_conversation, with_meal_plan_format, ChatMessage};

lazy_static! {
    static ref NUMBERED_LINE: Regex = Regex::new(r"\n\d+\.").unwrap();
    static ref SENTENCE_END: Regex = Regex::new(r"[.!?]\s+").unwrap();
}

/// Whether a user message asks for a meal or diet plan.
pub fn is_meal_plan_request(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("meal plan") || lower.contains("diet plan")
}

/// Put each sentence of a chat reply on its own `• ` line.
///
/// Replies that already carry bullets or numbering are returned unchanged.
pub fn format_with_bullets(text: &str) -> String {
    if text.contains("\n- ") || text.contains("\n* ") || NUMBERED_LINE.is_match(text) {
        return text.to_string();
    }

    let mut sentences = Vec::new();
    let mut start = 0;
    for m in SENTENCE_END.find_iter(text) {
        // keep the punctuation, drop the whitespace after it
        sentences.push(&text[start..m.start() + 1]);
        start = m.end();
    }
    sentences.push(&text[start..]);

    sentences
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| format!("• {}", s))
        .collect::<Vec<_>>()
        .join("\n")
}

/// What the assistant produced for one turn.
#[derive(Debug, Clone, PartialEq)]
pub enum AssistantReply {
    /// Ordinary answer, bullet formatted
    Chat(String),
    /// Raw plan text and the plan parsed from it
    MealPlan { text: String, plan: WeekPlan },
}

impl AssistantReply {
    /// Text shown in the conversation.
    pub fn text(&self) -> &str {
        match self {
            AssistantReply::Chat(text) => text,
            AssistantReply::MealPlan { text, .. } => text,
        }
    }
}

/// Request a seven-day plan and parse the completion.
pub fn generate_week_plan<S: CompletionSource + ?Sized>(
    source: &S,
    history: &[ChatMessage],
    allergies: &[String],
    now: DateTime<Utc>,
) -> CompletionResult<WeekPlan> {
    let prompt = build_meal_plan_prompt(history, allergies);
    let text = complete_trimmed(source, &prompt, MEAL_PLAN_MAX_TOKENS)?;
    let plan = parse_week_plan_at(&text, now);
    info!(meals = plan.meal_count(), allergies = allergies.len(), "Generated week plan");
    Ok(plan)
}

/// Answer the latest user message in `history`.
///
/// Plan requests get the format instructions and the larger token budget,
/// and their reply is parsed into a [`WeekPlan`].
pub fn respond<S: CompletionSource + ?Sized>(
    source: &S,
    history: &[ChatMessage],
    now: DateTime<Utc>,
) -> CompletionResult<AssistantReply> {
    let wants_plan = history
        .last()
        .map(|m| is_meal_plan_request(&m.text))
        .unwrap_or(false);

    let prompt = format_conversation(history);
    if wants_plan {
        debug!("Treating message as meal plan request");
        let text = complete_trimmed(source, &with_meal_plan_format(prompt), MEAL_PLAN_MAX_TOKENS)?;
        let plan = parse_week_plan_at(&text, now);
        Ok(AssistantReply::MealPlan { text, plan })
    } else {
        let text = complete_trimmed(source, &prompt, CHAT_MAX_TOKENS)?;
        Ok(AssistantReply::Chat(format_with_bullets(&text)))
    }
}

fn complete_trimmed<S: CompletionSource + ?Sized>(
    source: &S,
    prompt: &str,
    max_tokens: u32,
) -> CompletionResult<String> {
    let text = source.complete(prompt, max_tokens)?;
    let text = text.trim();
    if text.is_empty() {
        return Err(CompletionError::Empty);
    }
    Ok(text.to_string())
}
