//! Utilities for extracting structured data from model responses.
//!
//! Models wrap JSON in markdown fences or surround it with commentary. These
//! helpers find the JSON value and deserialize it.

use fabula_error::{FabulaResult, StoryError, StoryErrorKind};
use serde::de::DeserializeOwned;

/// Extract JSON from a response that may contain markdown or extra text.
///
/// Strategies, in order:
/// 1. Markdown code blocks: ```json ... ```, when they hold JSON
/// 2. Balanced braces `{ ... }` or brackets `[ ... ]`, whichever opens first
///
/// # Errors
///
/// Returns `NoJsonFound` if the response contains no JSON candidate.
///
/// # Examples
///
/// ```
/// use fabula_story::extract_json;
///
/// let response = "Here is your story:\n```json\n{\"storyline\": \"Once...\"}\n```";
/// let json = extract_json(response).unwrap();
/// assert_eq!(json, "{\"storyline\": \"Once...\"}");
/// ```
pub fn extract_json(response: &str) -> FabulaResult<String> {
    if let Some(json) = extract_from_code_block(response) {
        return Ok(json);
    }

    let bracket_pos = response.find('[');
    let brace_pos = response.find('{');

    let order: [(char, char); 2] = match (bracket_pos, brace_pos) {
        (Some(b), Some(c)) if b < c => [('[', ']'), ('{', '}')],
        (Some(_), None) => [('[', ']'), ('{', '}')],
        _ => [('{', '}'), ('[', ']')],
    };

    for (open, close) in order {
        if let Some(json) = extract_balanced(response, open, close) {
            return Ok(json);
        }
    }

    tracing::error!(
        response_length = response.len(),
        "No JSON found in model response"
    );
    Err(StoryError::new(StoryErrorKind::NoJsonFound(response.len())).into())
}

/// Extract JSON from `response` and deserialize it into `T`.
///
/// # Examples
///
/// ```
/// use fabula_core::AudioDescription;
/// use fabula_story::parse_json;
///
/// let audio: AudioDescription =
///     parse_json("Sure! {\"audio_description\": \"Low drums, crackling fire\"}").unwrap();
/// assert_eq!(audio.audio_description, "Low drums, crackling fire");
/// ```
pub fn parse_json<T: DeserializeOwned>(response: &str) -> FabulaResult<T> {
    let json = extract_json(response)?;
    serde_json::from_str(&json).map_err(|e| {
        tracing::error!(error = %e, json = %json, "Model JSON did not match expected shape");
        StoryError::new(StoryErrorKind::Parse(e.to_string())).into()
    })
}

/// Content of the first fenced code block, preferring one tagged `json`.
///
/// An unterminated fence (truncated response) yields everything after it.
/// Fenced text that does not open with `{` or `[` is ignored.
fn extract_from_code_block(response: &str) -> Option<String> {
    let content = if let Some(start) = response.find("```json") {
        fenced_content(response, start + "```json".len())
    } else {
        let start = response.find("```")?;
        let content_start = start + 3;
        // Skip a language tag on the fence line.
        let skip_to = response[content_start..]
            .find('\n')
            .map(|n| content_start + n + 1)
            .unwrap_or(content_start);
        fenced_content(response, skip_to)
    };

    content.starts_with(['{', '[']).then_some(content)
}

fn fenced_content(response: &str, from: usize) -> String {
    let rest = &response[from..];
    match rest.find("```") {
        Some(end) => rest[..end].trim().to_string(),
        None => rest.trim().to_string(),
    }
}

/// Text from the first `open` to its matching `close`, ignoring delimiters
/// inside JSON strings.
fn extract_balanced(response: &str, open: char, close: char) -> Option<String> {
    let start = response.find(open)?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, ch) in response[start..].char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match ch {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            c if c == open && !in_string => depth += 1,
            c if c == close && !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(response[start..start + i + ch.len_utf8()].to_string());
                }
            }
            _ => {}
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use fabula_core::{SceneDescriptions, Script, StoryData};
    use fabula_error::FabulaErrorKind;

    #[test]
    fn test_plain_object() {
        let json = extract_json(r#"{"scenes": ["a", "b"]}"#).unwrap();
        assert_eq!(json, r#"{"scenes": ["a", "b"]}"#);
    }

    #[test]
    fn test_untagged_fence() {
        let response = "```\n{\"scenes\": []}\n```";
        assert_eq!(extract_json(response).unwrap(), "{\"scenes\": []}");
    }

    #[test]
    fn test_prose_fence_falls_back_to_scan() {
        let response = "```\nHere you go\n```\n{\"scenes\": [\"a\"]}";
        assert_eq!(extract_json(response).unwrap(), "{\"scenes\": [\"a\"]}");
    }

    #[test]
    fn test_loose_story_and_script_shapes() {
        let story: StoryData = parse_json(
            r#"{"storyline": "Once.", "character_descriptions": [{"name": "Volt", "traits": ["curious", "brave"]}]}"#,
        )
        .unwrap();
        assert_eq!(story.character_descriptions[0].traits, "curious, brave");

        let script: Script =
            parse_json(r#"{"script": [{"scene": "1", "narration": "Dawn."}]}"#).unwrap();
        assert_eq!(script.script[0].scene, 1);
    }

    #[test]
    fn test_truncated_fence_returns_rest() {
        let response = "```json\n{\"scenes\": [\"a\"]}";
        assert_eq!(extract_json(response).unwrap(), "{\"scenes\": [\"a\"]}");
    }

    #[test]
    fn test_braces_inside_strings_are_ignored() {
        let response = r#"Result: {"storyline": "She drew a } in the sand \"{\"", "character_descriptions": []} trailing"#;
        let story: StoryData = parse_json(response).unwrap();
        assert_eq!(story.storyline, r#"She drew a } in the sand "{""#);
    }

    #[test]
    fn test_array_before_object() {
        let json = extract_json(r#"Scenes: ["one {x}", "two"] and {"ignored": true}"#).unwrap();
        assert_eq!(json, r#"["one {x}", "two"]"#);
    }

    #[test]
    fn test_chatter_around_object() {
        let scenes: SceneDescriptions =
            parse_json("Of course!\n{\"scenes\": [\"Scene 1: dawn\"]}\nEnjoy.").unwrap();
        assert_eq!(scenes.scenes, vec!["Scene 1: dawn"]);
    }

    #[test]
    fn test_no_json_reports_length() {
        let err = extract_json("I cannot help with that.").unwrap_err();
        match err.kind() {
            FabulaErrorKind::Story(e) => assert_eq!(e.kind, StoryErrorKind::NoJsonFound(24)),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_wrong_shape_is_parse_error() {
        let err = parse_json::<StoryData>(r#"{"title": "no storyline"}"#).unwrap_err();
        match err.kind() {
            FabulaErrorKind::Story(e) => assert!(matches!(e.kind, StoryErrorKind::Parse(_))),
            other => panic!("unexpected error: {other}"),
        }
    }
}
