//! Prompts for the health assistant.
//!
//! The completion endpoint takes a single plain-text prompt, so the
//! conversation is flattened into a `User:` / `Assistant:` transcript.

use serde::{Deserialize, Serialize};

/// Preamble placed before every conversation.
pub const ASSISTANT_PREAMBLE: &str = "You are a helpful health assistant chatbot specializing in nutrition advice and meal planning. Be concise and clear.";

/// Format instructions appended to meal plan requests.
///
/// The layout here is what `healthroute_core::meal_plan` parses.
pub const MEAL_PLAN_FORMAT_INSTRUCTIONS: &str = r#"Please generate a comprehensive 7-day meal plan with breakfast, lunch, dinner, and snacks for each day. Use this exact format:

# Monday
## Breakfast
Recipe: [Recipe Name], [ingredient1], [ingredient2], [ingredient3]
## Lunch
Recipe: [Recipe Name], [ingredient1], [ingredient2], [ingredient3]
## Dinner
Recipe: [Recipe Name], [ingredient1], [ingredient2], [ingredient3]
## Snack
Recipe: [Recipe Name], [ingredient1], [ingredient2]

Repeat this format for all 7 days (Monday through Sunday). Focus on nutritious, balanced options."#;

/// Request sent when the user asks for a plan without typing one.
pub const DEFAULT_MEAL_PLAN_REQUEST: &str = "Generate a detailed 7-day meal plan with breakfast, lunch, dinner, and snacks. Include healthy options with a good balance of nutrients.";

/// Who wrote a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    fn label(self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Assistant => "Assistant",
        }
    }
}

/// One message of a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub text: String,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
        }
    }
}

/// Flatten a conversation into a prompt ending with `Assistant:`.
pub fn format_conversation(history: &[ChatMessage]) -> String {
    let mut prompt = String::new();
    prompt.push_str(ASSISTANT_PREAMBLE);
    prompt.push_str("\n\n");

    for message in history {
        prompt.push_str(message.role.label());
        prompt.push_str(": ");
        prompt.push_str(&message.text);
        prompt.push('\n');
    }

    prompt.push_str("Assistant:");
    prompt
}

/// The default plan request, with an allergy clause when needed.
pub fn make_meal_plan_request(allergies: &[String]) -> String {
    let mut request = DEFAULT_MEAL_PLAN_REQUEST.to_string();
    if !allergies.is_empty() {
        request.push_str(&format!(
            " IMPORTANT: The user has the following food allergies: {}. Please ensure that NO meals contain any of these allergens.",
            allergies.join(", ")
        ));
    }
    request
}

/// Build a complete meal plan prompt.
///
/// The plan request is appended to the history as the latest user message,
/// followed by the format instructions.
pub fn build_meal_plan_prompt(history: &[ChatMessage], allergies: &[String]) -> String {
    let mut messages = history.to_vec();
    messages.push(ChatMessage::user(make_meal_plan_request(allergies)));
    with_meal_plan_format(format_conversation(&messages))
}

/// Append the format instructions to an already formatted prompt.
pub fn with_meal_plan_format(mut prompt: String) -> String {
    prompt.push('\n');
    prompt.push_str(MEAL_PLAN_FORMAT_INSTRUCTIONS);
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_conversation() {
        let history = vec![
            ChatMessage::user("Is spinach high in iron?"),
            ChatMessage::assistant("Yes, it is a good source."),
            ChatMessage::user("What about lentils?"),
        ];
        let prompt = format_conversation(&history);

        assert!(prompt.starts_with(ASSISTANT_PREAMBLE));
        assert!(prompt.contains("\n\nUser: Is spinach high in iron?\nAssistant: Yes, it is a good source.\n"));
        assert!(prompt.ends_with("User: What about lentils?\nAssistant:"));
    }

    #[test]
    fn test_empty_conversation() {
        let prompt = format_conversation(&[]);
        assert_eq!(prompt, format!("{}\n\nAssistant:", ASSISTANT_PREAMBLE));
    }

    #[test]
    fn test_meal_plan_request_allergies() {
        assert_eq!(make_meal_plan_request(&[]), DEFAULT_MEAL_PLAN_REQUEST);

        let request = make_meal_plan_request(&["peanuts".into(), "shellfish".into()]);
        assert!(request.starts_with(DEFAULT_MEAL_PLAN_REQUEST));
        assert!(request.contains("food allergies: peanuts, shellfish."));
    }

    #[test]
    fn test_meal_plan_prompt() {
        let prompt = build_meal_plan_prompt(&[ChatMessage::user("hi")], &["dairy".into()]);
        assert!(prompt.contains("User: hi\n"));
        assert!(prompt.contains("allergies: dairy"));
        assert!(prompt.contains("Assistant:\nPlease generate a comprehensive 7-day meal plan"));
        assert!(prompt.ends_with("balanced options."));
        assert!(prompt.contains("# Monday\n## Breakfast\nRecipe: [Recipe Name]"));
    }
}
