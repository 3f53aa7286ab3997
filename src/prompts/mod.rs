//! System prompts for the assistant, the SQL notes agent and the summarizer

pub mod assistant_prompt;
pub mod sql_prompt;
pub mod summary_prompt;

pub use assistant_prompt::ASSISTANT_SYSTEM_PROMPT;
pub use sql_prompt::generate_sql_prompt;
pub use summary_prompt::generate_summary_prompt;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assistant_prompt_mentions_summary_marker() {
        assert!(ASSISTANT_SYSTEM_PROMPT.contains(crate::history::SUMMARY_MARKER.trim_end()));
    }

    #[test]
    fn test_sql_prompt_renders_limits() {
        let prompt = generate_sql_prompt(5, 3);
        assert!(prompt.contains("Default row limit (for SELECT): 5"));
        assert!(prompt.contains("max 3 attempts"));
        assert!(prompt.contains("sqlite"));
    }

    #[test]
    fn test_summary_prompt_embeds_conversation() {
        let prompt = generate_summary_prompt("human: hi\nai: hello");
        assert!(prompt.contains("Conversation:\nhuman: hi\nai: hello\n"));
        assert!(prompt.trim_end().ends_with("Summary:"));
        assert!(!prompt.contains("{conversation}"));
    }
}
