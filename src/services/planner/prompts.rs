//! Planning Prompts
//!
//! Prompt builders for the planning call and the single-intent router
//! fallback. The instruction set is fixed: a decision table over the
//! intents, a few worked examples, and explicit chapter-range extraction
//! rules.

use storyweave_llm::{Message, MessageRole};

use crate::services::session::ProjectContext;

/// System prompt for the multi-step planning call.
pub fn planning_system_prompt() -> String {
    r#"You are the planning module of StoryWeave, a knowledge-assisted writing tool.
Decompose the user's request into an ordered list of steps. Respond with a JSON object only.

## Intents
Pick each step's intent from this table:
- "clarify": the request is ambiguous; ask the user one question
- "web-lookup": facts outside the story world are needed
- "numeric-calc": arithmetic over story data (counts, word totals, ages)
- "data-mutation": the user asks to save, extract, update, or delete stored knowledge
- "read-content": read specific chapters or documents
- "timeline-query": questions about event order or story chronology
- "structured-query": query records by a structured tag (e.g. all items tagged "weapon")
- "mixed-context": the answer needs several context kinds at once
- "fragment-search": find passages inside chapter text
- "knowledge-search": look up entities in the knowledge store
- "suggest-multistep": the user asks how to approach a larger task
- "casual-chat": everything else

## Data mutations
For "data-mutation" set args.mutation_op (extract | update | delete | remember)
and args.mutation_target (knowledge-entity | relation | timeline | segmentation | rule).

## Chapter ranges
Set args.range_mode and the chapter bounds:
- "chapters 3 to 5" -> range_mode "explicit", chapter_start 3, chapter_end 5
- "the first 4 chapters" -> range_mode "first-n", chapter_start 1, chapter_end 4
- "the last 2 chapters" -> range_mode "last-n", no fixed bounds
- no chapters mentioned -> range_mode "none"

## Output shape
{
  "analysis": "<one sentence on what the user wants>",
  "verification_required": <true when any step must be checked against evidence>,
  "steps": [
    {
      "step_id": 1,
      "intent": "knowledge-search",
      "dependency": null,
      "args": {
        "query": "<refined query>",
        "documents": [],
        "entities": [],
        "chapter_start": null,
        "chapter_end": null,
        "range_mode": "none",
        "categories": [],
        "mutation_op": null,
        "mutation_target": null,
        "structured_target": null,
        "clarification": null,
        "update_summary": null
      }
    }
  ]
}

## Examples
Request: "Who is Mara and when did she first appear?"
-> steps: knowledge-search (query "Mara"), timeline-query (query "Mara first appearance")

Request: "Extract the characters from chapters 3 to 5"
-> steps: data-mutation (mutation_op "extract", mutation_target "knowledge-entity",
   range_mode "explicit", chapter_start 3, chapter_end 5)

Request: "thanks, that helps"
-> steps: casual-chat

Keep plans short. Never invent intents outside the table."#
        .to_string()
}

/// User message for the planning call: recent history, project material,
/// the advisory hint, and the request itself.
pub fn planning_user_message(
    user_text: &str,
    recent_history: &[Message],
    project: &ProjectContext,
    hint: &str,
) -> String {
    let mut sections: Vec<String> = Vec::new();

    if !recent_history.is_empty() {
        let mut lines = vec!["## Recent conversation".to_string()];
        for msg in recent_history {
            let speaker = match msg.role {
                MessageRole::User => "user",
                MessageRole::Assistant => "assistant",
                MessageRole::System => "system",
            };
            lines.push(format!("{}: {}", speaker, msg.content));
        }
        sections.push(lines.join("\n"));
    }

    if let Some(rules) = &project.rules {
        sections.push(format!("## Project rules\n{}", rules));
    }
    if let Some(index) = &project.index_summary {
        sections.push(format!("## Knowledge index\n{}", index));
    }

    sections.push(hint.to_string());
    sections.push(format!("## Request\n{}", user_text));

    sections.join("\n\n")
}

/// System prompt for the single-intent router fallback.
pub fn router_system_prompt() -> String {
    r#"You are the intent router of StoryWeave, a knowledge-assisted writing tool.
Classify the user's request into exactly one intent from:
clarify, web-lookup, numeric-calc, data-mutation, read-content, timeline-query,
structured-query, mixed-context, fragment-search, knowledge-search,
suggest-multistep, casual-chat.

Respond with a JSON object only:
{"intent": "<intent>", "args": {"query": "<refined query>"}}"#
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_prompt_lists_all_intents() {
        let prompt = planning_system_prompt();
        for intent in [
            "clarify",
            "web-lookup",
            "numeric-calc",
            "data-mutation",
            "read-content",
            "timeline-query",
            "structured-query",
            "mixed-context",
            "fragment-search",
            "knowledge-search",
            "suggest-multistep",
            "casual-chat",
        ] {
            assert!(prompt.contains(intent), "missing intent {intent}");
        }
        assert!(prompt.contains("range_mode"));
        assert!(prompt.contains("verification_required"));
    }

    #[test]
    fn test_user_message_includes_request_and_hint() {
        let msg = planning_user_message(
            "Who is Mara?",
            &[],
            &ProjectContext::default(),
            "Hint: none",
        );
        assert!(msg.contains("Who is Mara?"));
        assert!(msg.contains("Hint: none"));
    }

    #[test]
    fn test_user_message_includes_history_and_project() {
        let history = vec![Message::user("hi"), Message::assistant("hello")];
        let project = ProjectContext {
            rules: Some("write tersely".to_string()),
            index_summary: Some("characters: Mara, Io".to_string()),
        };
        let msg = planning_user_message("next", &history, &project, "");
        assert!(msg.contains("user: hi"));
        assert!(msg.contains("assistant: hello"));
        assert!(msg.contains("write tersely"));
        assert!(msg.contains("characters: Mara, Io"));
    }

    #[test]
    fn test_router_prompt_shape() {
        let prompt = router_system_prompt();
        assert!(prompt.contains("exactly one intent"));
        assert!(prompt.contains("\"intent\""));
    }
}
