//! Conversation messages and the history trimming/condensation rules.

use crate::capability::{CapabilityRequest, CapabilityResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Author of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Human,
    Assistant,
    Tool,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Human => write!(f, "human"),
            Role::Assistant => write!(f, "assistant"),
            Role::Tool => write!(f, "tool"),
        }
    }
}

/// One conversational message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    /// Capability calls requested by an assistant planning message.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requests: Vec<CapabilityRequest>,
    /// Capability output carried by a tool message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<CapabilityResult>,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    fn new(role: Role, content: String) -> Self {
        Self {
            role,
            content,
            requests: Vec::new(),
            result: None,
            timestamp: Utc::now(),
        }
    }

    pub fn human(content: impl Into<String>) -> Self {
        Self::new(Role::Human, content.into())
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content.into())
    }

    /// Assistant message that asks for capability calls.
    pub fn planning(content: impl Into<String>, requests: Vec<CapabilityRequest>) -> Self {
        Self {
            requests,
            ..Self::new(Role::Assistant, content.into())
        }
    }

    /// Tool message carrying one capability result.
    pub fn tool(result: CapabilityResult) -> Self {
        Self {
            content: result.to_content(),
            result: Some(result),
            ..Self::new(Role::Tool, String::new())
        }
    }

    /// An assistant message with no pending capability requests.
    pub fn is_final_answer(&self) -> bool {
        self.role == Role::Assistant && self.requests.is_empty()
    }
}

/// Keep only the most recent `max_pairs` conversational pairs.
///
/// A pair starts at a human message and runs up to the next human message, so
/// planning and tool messages stay with the turn they belong to. Anything
/// before the first kept human message is dropped.
pub fn trim(messages: &[Message], max_pairs: usize) -> Vec<Message> {
    if max_pairs == 0 {
        return Vec::new();
    }

    let human_positions: Vec<usize> = messages
        .iter()
        .enumerate()
        .filter(|(_, m)| m.role == Role::Human)
        .map(|(i, _)| i)
        .collect();

    let start = if human_positions.len() > max_pairs {
        human_positions[human_positions.len() - max_pairs]
    } else {
        human_positions.first().copied().unwrap_or(messages.len())
    };

    messages[start..].to_vec()
}

/// Reduce each turn to its human message and final assistant answer.
///
/// Planning and tool messages are dropped. A human message that never got a
/// final answer is dropped too, as is any answer with no human before it, so
/// the output strictly alternates human/assistant.
pub fn condense(messages: &[Message]) -> Vec<Message> {
    let mut condensed = Vec::new();
    let mut pending: Option<&Message> = None;
    let mut answer: Option<&Message> = None;

    let mut flush = |pending: Option<&Message>, answer: Option<&Message>| {
        if let (Some(human), Some(reply)) = (pending, answer) {
            condensed.push(human.clone());
            condensed.push(reply.clone());
        }
    };

    for message in messages {
        match message.role {
            Role::Human => {
                flush(pending, answer);
                pending = Some(message);
                answer = None;
            }
            Role::Assistant if message.is_final_answer() && pending.is_some() => {
                answer = Some(message);
            }
            _ => {}
        }
    }
    flush(pending, answer);

    condensed
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pair(i: usize) -> Vec<Message> {
        vec![
            Message::human(format!("question {}", i)),
            Message::assistant(format!("answer {}", i)),
        ]
    }

    fn tool_turn(question: &str, tool_calls: usize) -> Vec<Message> {
        let mut turn = vec![Message::human(question)];
        for i in 0..tool_calls {
            let request = CapabilityRequest::new(
                format!("call_{}", i),
                "module_overview",
                json!({"module_code": "CS2040"}),
            );
            turn.push(Message::planning("", vec![request.clone()]));
            turn.push(Message::tool(CapabilityResult::success(
                &request,
                json!({"moduleCode": "CS2040"}),
            )));
        }
        turn.push(Message::assistant("final"));
        turn
    }

    fn contents(messages: &[Message]) -> Vec<&str> {
        messages.iter().map(|m| m.content.as_str()).collect()
    }

    #[test]
    fn test_trim_keeps_last_pairs_in_order() {
        let history: Vec<Message> = (1..=8).flat_map(pair).collect();
        let trimmed = trim(&history, 5);

        assert_eq!(trimmed.len(), 10);
        assert_eq!(
            contents(&trimmed),
            (4..=8)
                .flat_map(|i| [format!("question {}", i), format!("answer {}", i)])
                .collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_trim_does_not_split_tool_exchange() {
        let mut history: Vec<Message> = (1..=3).flat_map(pair).collect();
        history.extend(tool_turn("timetable?", 2));

        let trimmed = trim(&history, 2);
        assert_eq!(trimmed[0].content, "question 3");
        assert_eq!(trimmed.len(), 2 + 6);
        assert_eq!(trimmed.last().unwrap().content, "final");
    }

    #[test]
    fn test_trim_edge_cases() {
        let history: Vec<Message> = (1..=2).flat_map(pair).collect();
        assert!(trim(&history, 0).is_empty());
        assert_eq!(trim(&history, 5).len(), 4);

        let mut orphaned = vec![Message::assistant("dangling")];
        orphaned.extend(pair(1));
        assert_eq!(contents(&trim(&orphaned, 3)), vec!["question 1", "answer 1"]);
        assert!(trim(&[Message::assistant("only")], 3).is_empty());
    }

    #[test]
    fn test_condense_drops_tool_messages() {
        for n in [0, 1, 3, 7] {
            let condensed = condense(&tool_turn("q", n));
            assert_eq!(condensed.len(), 2, "turn with {} tool calls", n);
            assert_eq!(condensed[0].role, Role::Human);
            assert_eq!(condensed[1].role, Role::Assistant);
            assert_eq!(condensed[1].content, "final");
        }
    }

    #[test]
    fn test_condense_alternates() {
        let mut messages = vec![Message::assistant("orphan")];
        messages.extend(pair(1));
        messages.extend(tool_turn("second", 2));
        messages.push(Message::human("unanswered"));
        messages.extend(pair(3));

        let condensed = condense(&messages);
        assert_eq!(
            contents(&condensed),
            vec!["question 1", "answer 1", "second", "final", "question 3", "answer 3"]
        );
        for (i, m) in condensed.iter().enumerate() {
            let expected = if i % 2 == 0 { Role::Human } else { Role::Assistant };
            assert_eq!(m.role, expected);
            assert!(m.requests.is_empty());
        }
    }

    #[test]
    fn test_tool_message_content() {
        let request = CapabilityRequest::new("c1", "module_search", json!({"query": "data"}));
        let message = Message::tool(CapabilityResult::success(&request, json!({"count": 0})));
        assert_eq!(message.role, Role::Tool);
        assert_eq!(message.content, r#"{"count":0}"#);
        assert!(!message.is_final_answer());
    }
}
