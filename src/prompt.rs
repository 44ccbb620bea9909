// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Scouting prompt construction.
//!
//! The backend forwards the prompt verbatim to the language model together
//! with the video, so everything the model needs to find the player (frame,
//! time, pixel position) is spelled out in the text.

use crate::models::analysis::PlayerMetadata;
use crate::models::player::DetectedPlayer;

const GENERIC_SUBJECT: &str = "the player";

/// Ready-made analysis questions offered next to the focus field.
pub const FOCUS_TEMPLATES: [&str; 4] = [
    "Analyze this player's off-the-ball movement and tactical awareness.",
    "Evaluate this player's technique and ball control.",
    "Analyze this player's defensive contribution at this moment.",
    "Is this player's positioning at this moment a good choice?",
];

/// Inputs for one prompt.
pub struct PromptContext<'a> {
    pub player: &'a DetectedPlayer,
    pub timestamp_secs: f64,
    pub fps: f64,
    pub metadata: &'a PlayerMetadata,
    pub language: &'a str,
}

/// Frame number shown to the model. Never negative.
pub fn frame_index(timestamp_secs: f64, fps: f64) -> u64 {
    if !(timestamp_secs.is_finite() && fps.is_finite()) || timestamp_secs <= 0.0 || fps <= 0.0 {
        return 0;
    }
    (timestamp_secs * fps).round() as u64
}

/// How the report should refer to the player.
///
/// "Rivera (#10, Left Winger)", "#10 (Left Winger)", "the Left Winger", or
/// "the player" when nothing was filled in.
pub fn display_name(metadata: &PlayerMetadata) -> String {
    let name = metadata.name.trim();
    let jersey = metadata.jersey_number.trim().trim_start_matches('#').trim();
    let position = metadata.position.trim();

    let jersey_label = (!jersey.is_empty()).then(|| format!("#{}", jersey));

    if !name.is_empty() {
        let details: Vec<&str> = jersey_label
            .as_deref()
            .into_iter()
            .chain((!position.is_empty()).then_some(position))
            .collect();
        if details.is_empty() {
            name.to_string()
        } else {
            format!("{} ({})", name, details.join(", "))
        }
    } else if let Some(label) = jersey_label {
        if position.is_empty() {
            label
        } else {
            format!("{} ({})", label, position)
        }
    } else if !position.is_empty() {
        format!("the {}", position)
    } else {
        GENERIC_SUBJECT.to_string()
    }
}

fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn format_coordinate(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{}", v as i64)
    } else {
        format!("{:.1}", v)
    }
}

/// Put `subject` in place of generic references in a user question.
fn personalize(text: &str, subject: &str) -> String {
    let subject_start = capitalize_first(subject);
    let possessive = format!("{}'s", subject);
    let possessive_start = format!("{}'s", subject_start);
    text.replace("This player's", &possessive_start)
        .replace("this player's", &possessive)
        .replace("The player's", &possessive_start)
        .replace("the player's", &possessive)
        .replace("This player", &subject_start)
        .replace("this player", subject)
        .replace("The player", &subject_start)
        .replace("the player", subject)
}

/// Build the full scouting prompt for the selected player.
pub fn build_prompt(ctx: &PromptContext) -> String {
    let subject = display_name(ctx.metadata);
    let subject_start = capitalize_first(&subject);
    let frame = frame_index(ctx.timestamp_secs, ctx.fps);
    let x = format_coordinate(ctx.player.center.x);
    let y = format_coordinate(ctx.player.center.y);

    let mut prompt = String::new();
    prompt.push_str(&format!(
        "You are a professional soccer scout. Analyze {subject} in the attached match video.\n"
    ));
    prompt.push_str(&format!(
        "{subject_start} appears in frame {frame}, {:.2} seconds into the video, \
         centered at pixel coordinates x={x}, y={y} of that frame.\n",
        ctx.timestamp_secs
    ));
    prompt.push_str(&format!(
        "Follow {subject} through the footage around this moment and write a structured report \
         with the following sections:\n"
    ));
    prompt.push_str(&format!(
        "1. Behavior analysis: how {subject} moves, positions themselves and reacts to play.\n"
    ));
    prompt.push_str(&format!(
        "2. Key events: passes, duels, shots, tackles and off-the-ball runs involving {subject}, with approximate times.\n"
    ));
    prompt.push_str(&format!(
        "3. Tactical analysis: the role {subject} plays in the team's shape, in and out of possession.\n"
    ));
    prompt.push_str(&format!(
        "4. Strengths and weaknesses: what {subject} does well and where {subject} falls short.\n"
    ));
    prompt.push_str(&format!(
        "5. Recommendations: concrete training or tactical advice for {subject}.\n"
    ));
    prompt.push_str(&format!(
        "Write the entire report in {}. Refer to the subject as \"{subject}\" throughout.",
        ctx.language
    ));

    let focus = ctx.metadata.focus.trim();
    if !focus.is_empty() {
        prompt.push_str(&format!(
            "\nPay particular attention to this question: {}",
            personalize(focus, &subject)
        ));
    }
    prompt
}
