//! Story domain types exchanged between the generator, the HTTP API and clients.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// The user's brief for a new story.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StoryRequest {
    /// Subject of the story, e.g. "The Discovery of Fire"
    pub topic: String,
    /// Free-text description of what should happen
    pub description: String,
    /// Art and narrative style, e.g. "Prehistoric cave painting style"
    pub style: String,
}

fn default_character_name() -> String {
    "Unknown_Character".to_string()
}

fn default_appearance() -> String {
    "No appearance described".to_string()
}

/// One member of the cast.
///
/// Missing fields fall back to neutral defaults so that loosely formatted
/// model output still yields a usable character.
///
/// # Examples
///
/// ```
/// use fabula_core::Character;
///
/// let character: Character = serde_json::from_str(r#"{"name": "Kael"}"#).unwrap();
/// assert_eq!(character.name, "Kael");
/// assert_eq!(character.appearance, "No appearance described");
/// assert!(character.traits.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Character {
    /// Character name
    #[serde(default = "default_character_name")]
    pub name: String,
    /// Personality traits
    #[serde(default, deserialize_with = "trait_text")]
    pub traits: String,
    /// Physical appearance
    #[serde(default = "default_appearance")]
    pub appearance: String,
    /// Setting the character is usually seen in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_scene: Option<String>,
}

/// Storyline, cast and empty background settings produced in step one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryData {
    /// Roughly 300 words of narrative
    pub storyline: String,
    /// The cast
    #[serde(default)]
    pub character_descriptions: Vec<Character>,
    /// Environment-only descriptions, free of characters
    #[serde(default)]
    pub background_descriptions: Vec<String>,
}

/// Ordered scene descriptions.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SceneDescriptions {
    /// One entry per scene
    #[serde(default)]
    pub scenes: Vec<String>,
}

/// Narration and dialogue for every scene.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Script {
    /// One entry per scene
    #[serde(default)]
    pub script: Vec<ScriptEntry>,
}

/// Narration and dialogue for one scene.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptEntry {
    /// 1-based scene number
    #[serde(default, deserialize_with = "scene_number")]
    pub scene: u32,
    /// Narrator voice-over
    #[serde(default)]
    pub narration: String,
    /// Spoken lines, newline separated
    #[serde(default, deserialize_with = "dialogue_lines")]
    pub dialogue: String,
}

/// Sound design notes for one scene.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioDescription {
    /// Background music and sound effects
    pub audio_description: String,
}

/// Accept traits as a string or as a list joined with `", "`.
fn trait_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Null => String::new(),
        Value::String(text) => text,
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            })
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    })
}

/// Accept the scene number as an integer or a numeric string such as `"3"`.
fn scene_number<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    match &value {
        Value::Null => Ok(0),
        Value::Number(n) => n
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(|| D::Error::custom(format!("invalid scene number: {n}"))),
        Value::String(text) => text
            .trim()
            .trim_start_matches(|c: char| !c.is_ascii_digit())
            .parse::<u32>()
            .map_err(|_| D::Error::custom(format!("invalid scene number: {text:?}"))),
        other => Err(D::Error::custom(format!("invalid scene number: {other}"))),
    }
}

/// Accept dialogue as a string, or as a list of lines or `{speaker, line}` objects.
fn dialogue_lines<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(render_dialogue(&value))
}

fn render_dialogue(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        Value::Array(items) => items
            .iter()
            .map(render_dialogue)
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n"),
        Value::Object(map) => {
            let speaker = ["speaker", "character", "name"]
                .iter()
                .find_map(|key| map.get(*key).and_then(Value::as_str));
            let line = ["line", "text", "dialogue"]
                .iter()
                .find_map(|key| map.get(*key).and_then(Value::as_str));
            match (speaker, line) {
                (Some(speaker), Some(line)) => format!("{speaker}: {line}"),
                (None, Some(line)) => line.to_string(),
                _ => value.to_string(),
            }
        }
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dialogue_accepts_plain_string() {
        let entry: ScriptEntry = serde_json::from_str(
            r#"{"scene": 1, "narration": "Night falls.", "dialogue": "Kael: Look!"}"#,
        )
        .unwrap();
        assert_eq!(entry.scene, 1);
        assert_eq!(entry.dialogue, "Kael: Look!");
    }

    #[test]
    fn test_dialogue_accepts_speaker_objects() {
        let entry: ScriptEntry = serde_json::from_str(
            r#"{"scene": 2, "narration": "", "dialogue": [
                {"speaker": "Kael", "line": "It burns!"},
                {"character": "Lyra", "text": "Keep it small."},
                "(silence)"
            ]}"#,
        )
        .unwrap();
        assert_eq!(
            entry.dialogue,
            "Kael: It burns!\nLyra: Keep it small.\n(silence)"
        );
    }

    #[test]
    fn test_missing_dialogue_is_empty() {
        let entry: ScriptEntry = serde_json::from_str(r#"{"scene": 3, "narration": "Dawn."}"#).unwrap();
        assert!(entry.dialogue.is_empty());
    }

    #[test]
    fn test_story_data_without_backgrounds() {
        let story: StoryData = serde_json::from_str(
            r#"{"storyline": "Once.", "character_descriptions": [{"name": "Volt", "traits": "curious", "appearance": "tiny"}]}"#,
        )
        .unwrap();
        assert_eq!(story.character_descriptions.len(), 1);
        assert!(story.background_descriptions.is_empty());
    }

    #[test]
    fn test_character_omits_empty_background_scene() {
        let character = Character {
            name: "Resi".to_string(),
            traits: "stubborn".to_string(),
            appearance: "striped".to_string(),
            background_scene: None,
        };
        let json = serde_json::to_value(&character).unwrap();
        assert!(json.get("background_scene").is_none());
    }

    #[test]
    fn test_traits_list_is_joined() {
        let story: StoryData = serde_json::from_str(
            r#"{"storyline": "Once.", "character_descriptions": [{"name": "Volt", "traits": ["curious", "brave"]}]}"#,
        )
        .unwrap();
        assert_eq!(story.character_descriptions[0].traits, "curious, brave");
    }

    #[test]
    fn test_scene_number_accepts_numeric_string() {
        let script: Script = serde_json::from_str(
            r#"{"script": [{"scene": "1", "narration": "Dawn."}, {"scene": "Scene 2", "narration": "Noon."}, {"scene": 3}]}"#,
        )
        .unwrap();
        let scenes: Vec<u32> = script.script.iter().map(|e| e.scene).collect();
        assert_eq!(scenes, vec![1, 2, 3]);
    }

    #[test]
    fn test_scene_number_rejects_words() {
        let result = serde_json::from_str::<ScriptEntry>(r#"{"scene": "first"}"#);
        assert!(result.is_err());
    }
}
