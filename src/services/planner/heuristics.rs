//! Planning Heuristics
//!
//! Cheap pattern signals computed before the planning LLM call and passed
//! into the prompt as a hint line. They are advisory only: they never
//! override the model's decision.

use std::sync::OnceLock;

use regex::Regex;

/// Topic keywords whose co-occurrence suggests a multi-source request.
const TOPIC_KEYWORDS: [&str; 4] = ["character", "chapter", "timeline", "plot"];

/// Phrases that explicitly ask for stepwise work.
const MULTI_STEP_PATTERNS: [&str; 5] = [
    r"(?i)step[ -]by[ -]step",
    r"(?i)multi[ -]?step",
    r"(?i)\bfirst\b.*\bthen\b",
    r"(?i)one by one",
    r"(?i)\band then\b",
];

fn multi_step_regexes() -> &'static Vec<Regex> {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        MULTI_STEP_PATTERNS
            .iter()
            .filter_map(|p| Regex::new(p).ok())
            .collect()
    })
}

/// Number of distinct topic keywords present in the text.
pub fn topic_keyword_count(text: &str) -> usize {
    let lower = text.to_lowercase();
    TOPIC_KEYWORDS.iter().filter(|k| lower.contains(*k)).count()
}

/// True iff the text contains any explicit multi-step phrase.
pub fn has_multistep_phrase(text: &str) -> bool {
    multi_step_regexes().iter().any(|p| p.is_match(text))
}

/// Combined advisory signal: two or more topic keywords, or any
/// multi-step phrase.
pub fn suggests_multistep(text: &str) -> bool {
    topic_keyword_count(text) >= 2 || has_multistep_phrase(text)
}

/// Render the hint line embedded in the planning prompt.
pub fn planning_hint(text: &str) -> String {
    let topics = topic_keyword_count(text);
    let phrased = has_multistep_phrase(text);
    format!(
        "Hint (advisory, from pattern analysis): topic_keywords={}, \
         multi_step_phrasing={}, likely_multi_step={}",
        topics,
        phrased,
        suggests_multistep(text)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_keyword_count() {
        assert_eq!(topic_keyword_count("tell me a joke"), 0);
        assert_eq!(topic_keyword_count("which character appears in chapter 3"), 2);
        assert_eq!(
            topic_keyword_count("plot the timeline of the main character per chapter"),
            4
        );
    }

    #[test]
    fn test_two_topic_keywords_signal() {
        assert!(suggests_multistep("summarize the plot and the timeline"));
        assert!(!suggests_multistep("summarize the plot"));
    }

    #[test]
    fn test_multistep_phrase_signal() {
        assert!(suggests_multistep("do this step by step"));
        assert!(suggests_multistep("first find Alice, then check her age"));
        assert!(suggests_multistep("a multi-step review please"));
        assert!(!suggests_multistep("just a quick answer"));
    }

    #[test]
    fn test_hint_line_mentions_signals() {
        let hint = planning_hint("step by step, please");
        assert!(hint.contains("multi_step_phrasing=true"));
        assert!(hint.contains("likely_multi_step=true"));
    }
}
