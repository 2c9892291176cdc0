//! Prompt builders for each generation step.
//!
//! Text prompts ask for strict JSON in the shape of the matching
//! `fabula_core` type. Image prompts spell out composition rules the image
//! model tends to ignore otherwise (plain backgrounds, open space, no extra
//! figures).

use fabula_core::{Character, Input};

/// Exact scene count requested when scenes are mapped onto backgrounds.
pub const MAPPED_SCENE_COUNT: usize = 9;

/// Number of empty background settings requested with the story.
pub const BACKGROUND_COUNT: usize = 5;

/// Storyline, cast and background settings as one JSON object.
pub fn story(topic: &str, description: &str, style: &str) -> String {
    format!(
        r#"You are a creative story writer and art director. Produce a single JSON object by working through these steps in order.

Step 1. Storyline: write an engaging storyline of about 300 words from the topic, description and style below.
Step 2. Characters: list every character in the storyline as "character_descriptions". Each entry has "name", "traits" and "appearance". Characters must be fully clothed and appropriate for all audiences.
Step 3. Backgrounds: re-read your storyline and pick {count} distinct physical locations in the order the story visits them. Describe each one richly as "background_descriptions".

Rules for "background_descriptions":
- They are used to paint EMPTY background plates, so they MUST NOT mention characters, people, creatures or figures.
- Describe the physical environment only.
- Good: "A sunlit archery range with straw targets in the distance and a rack of bows to one side."
- Bad: "Kaelen practises at the archery range."
- Vary the locations and follow the flow of the storyline.

Respond with JSON only, exactly in this shape:
{{
  "storyline": "...",
  "character_descriptions": [{{"name": "...", "traits": "...", "appearance": "..."}}],
  "background_descriptions": ["...", "...", "...", "...", "..."]
}}

Topic: {topic}
Story description: {description}
Style: {style}"#,
        count = BACKGROUND_COUNT,
    )
}

/// Single character portrait on a plain white background.
pub fn character_image(character: &Character, style: &str) -> String {
    format!(
        r#"Create high-quality character concept art showing exactly one character and nothing else.
Character name: {name}
Art style: {style}
Character appearance: {appearance}

Background requirements:
- The background MUST be solid, plain white.
- No other elements, objects, shadows or ground textures.
- Show the character isolated on the pure white background in a neutral standing pose.
- No text or captions."#,
        name = character.name,
        appearance = character.appearance,
    )
}

/// Empty background plate with room left for characters.
pub fn background_image(description: &str, style: &str) -> String {
    format!(
        r#"Generate a high-quality background illustration to be used as a background plate in a composite scene.

Art style: {style}
Scene description: "{description}"

Composition rules:
1. Leave open space. Keep a clear area in the foreground or mid-ground where characters will be placed later.
2. Use a medium or wide shot so the environment and the open area are clearly visible.
3. Keep the centre uncluttered. Put the main point of interest off-centre.
4. Environment only. There must be NO people, characters, figures or creatures.

The image should look beautiful but intentionally unfinished, ready for the cast to be added."#
    )
}

/// Scene descriptions. With backgrounds, exactly [`MAPPED_SCENE_COUNT`]
/// scenes each set in one of them; without, three to five free-form scenes.
pub fn scene_descriptions(
    storyline: &str,
    characters: &[Character],
    style: &str,
    backgrounds: Option<&[String]>,
) -> String {
    let cast = serde_json::to_string_pretty(characters).unwrap_or_else(|_| "[]".to_string());

    match backgrounds.filter(|b| !b.is_empty()) {
        Some(backgrounds) => {
            let locations =
                serde_json::to_string_pretty(backgrounds).unwrap_or_else(|_| "[]".to_string());
            format!(
                r#"You are a meticulous scene director. Write EXACTLY {count} visually grounded scene descriptions that follow the STORYLINE, placing the CHARACTERS inside the BACKGROUNDS.

Instructions:
- For every scene choose the most fitting background from the list. Use only these locations; a location may repeat if the story stays there.
- Decide which characters are present. Not every character has to appear in every scene.
- Say clearly what happens, continuing from the previous scene.
- For each character present, describe where they are, what they are doing and their body language.
- Give positions relative to each other and to landmarks in the chosen background.

Respond with JSON only:
{{
  "scenes": [
    "Scene 1: [chosen background] ...",
    "Scene 2: [chosen background] ..."
  ]
}}

STORYLINE:
{storyline}

CHARACTERS:
{cast}

BACKGROUNDS:
{locations}

ART STYLE:
{style}"#,
                count = MAPPED_SCENE_COUNT,
            )
        }
        None => format!(
            r#"Based on the storyline and characters below, write 3 to 5 scene descriptions in the given style. Stay faithful to the storyline and keep every character consistent with their description.

Respond with JSON only: {{"scenes": ["Description of scene 1.", "..."]}}

Style: {style}

Characters:
{cast}

Storyline:
{storyline}"#
        ),
    }
}

/// Composite scene prompt: instructions, then the background (if any), then
/// the character portraits, as one ordered list of inputs.
pub fn scene_image(
    scene_description: &str,
    style: &str,
    character_images: &[(String, Vec<u8>)],
    background: Option<(String, Vec<u8>)>,
) -> Vec<Input> {
    let background_rule = if background.is_some() {
        "1. Fixed background: use the provided background image as is. Do not add or remove background elements."
    } else {
        "1. Setting: paint a background that fits the scene description."
    };

    let mut inputs = vec![Input::text(format!(
        r#"Create a high-quality composite illustration in {style} style.
Scene description: "{scene_description}"

Composition and consistency rules:
{background_rule}
2. Place the characters exactly as described: their locations, actions and positions relative to each other.
3. Match perspective and scale to the background. Characters nearer the viewer appear larger.
4. Match the characters' lighting and shadows to the background's light source.
5. Characters interact with the environment believably: sitting on chairs, leaning on trees, standing on the ground.
6. Cast natural shadows beneath characters. Nobody floats or clips through surfaces.
7. Keep each character's face, outfit, hairstyle and proportions identical to their reference image. Never swap identities.
8. Do not add characters that are not in the description, and never duplicate one.
9. No text or speech bubbles."#
    ))];

    if let Some((mime, bytes)) = background {
        inputs.push(Input::text("Use this image as the background:"));
        inputs.push(Input::image(mime, bytes));
    }

    if !character_images.is_empty() {
        inputs.push(Input::text(
            "Place these characters consistently within the scene:",
        ));
        inputs.extend(
            character_images
                .iter()
                .map(|(mime, bytes)| Input::image(mime.clone(), bytes.clone())),
        );
    }

    inputs
}

/// Narration and dialogue, one entry per scene.
pub fn script(storyline: &str, scene_descriptions: &[String]) -> String {
    let scenes =
        serde_json::to_string_pretty(scene_descriptions).unwrap_or_else(|_| "[]".to_string());
    format!(
        r#"You are a scriptwriter. Using the storyline and the {count} scene descriptions, write narration and dialogue for every scene, in order.

Respond with JSON only:
{{"script": [{{"scene": 1, "narration": "...", "dialogue": "Name: line"}}]}}

STORYLINE:
{storyline}

SCENES:
{scenes}"#,
        count = scene_descriptions.len(),
    )
}

/// Background music and sound effects for one scene.
pub fn audio_description(scene_description: &str) -> String {
    format!(
        r#"You are a sound designer. Describe the background music and sound effects for this scene.

Respond with JSON only: {{"audio_description": "..."}}

SCENE: "{scene_description}""#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kael() -> Character {
        Character {
            name: "Kael".to_string(),
            traits: "curious".to_string(),
            appearance: "wiry, ochre face paint".to_string(),
            background_scene: None,
        }
    }

    #[test]
    fn test_story_prompt_embeds_inputs() {
        let prompt = story("Fire", "The first spark", "Cave painting");
        assert!(prompt.contains("Topic: Fire"));
        assert!(prompt.contains("Story description: The first spark"));
        assert!(prompt.contains("Style: Cave painting"));
        assert!(prompt.contains("\"background_descriptions\": ["));
    }

    #[test]
    fn test_character_prompt_forces_white_background() {
        let prompt = character_image(&kael(), "Watercolor");
        assert!(prompt.contains("Character name: Kael"));
        assert!(prompt.contains("wiry, ochre face paint"));
        assert!(prompt.contains("plain white"));
    }

    #[test]
    fn test_scene_prompt_variants() {
        let backgrounds = vec!["A cave mouth at dusk".to_string()];
        let mapped = scene_descriptions("story", &[kael()], "ink", Some(backgrounds.as_slice()));
        assert!(mapped.contains("EXACTLY 9"));
        assert!(mapped.contains("A cave mouth at dusk"));

        let free = scene_descriptions("story", &[kael()], "ink", None);
        assert!(free.contains("3 to 5"));
        assert!(free.contains("\"name\": \"Kael\""));

        let empty: Vec<String> = Vec::new();
        let also_free = scene_descriptions("story", &[kael()], "ink", Some(empty.as_slice()));
        assert!(also_free.contains("3 to 5"));
    }

    #[test]
    fn test_scene_image_orders_background_before_characters() {
        let inputs = scene_image(
            "Kael kneels by the fire",
            "ink",
            &[("image/png".to_string(), vec![1]), ("image/jpeg".to_string(), vec![2])],
            Some(("image/webp".to_string(), vec![9])),
        );

        assert_eq!(inputs.len(), 6);
        assert!(inputs[0].is_text());
        assert_eq!(inputs[1], Input::text("Use this image as the background:"));
        assert_eq!(inputs[2], Input::image("image/webp", vec![9]));
        assert_eq!(inputs[4], Input::image("image/png", vec![1]));
        assert_eq!(inputs[5], Input::image("image/jpeg", vec![2]));
    }

    #[test]
    fn test_scene_image_without_background() {
        let inputs = scene_image("x", "ink", &[("image/png".to_string(), vec![1])], None);
        assert_eq!(inputs.len(), 3);
        match &inputs[0] {
            Input::Text(text) => assert!(text.contains("paint a background")),
            other => panic!("unexpected input {other:?}"),
        }
    }

    #[test]
    fn test_script_prompt_counts_scenes() {
        let prompt = script("story", &["a".to_string(), "b".to_string()]);
        assert!(prompt.contains("the 2 scene descriptions"));
    }
}
