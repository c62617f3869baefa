//! Character-name cleanup and the captions shown under a chosen link.
use serde::{Deserialize, Serialize};

use crate::item::Item;

/// Annotations appended by the provider that read poorly in a caption.
const CREDIT_ANNOTATIONS: [&str; 5] = [
    " (archive footage)",
    " (voice)",
    " - Narrator",
    " (Uncredited)",
    " (uncredited)",
];

const SELF_CREDIT: &str = "Self";
const SELF_LABEL: &str = "himself";

/// Clean up a raw character credit for display.
///
/// Each annotation is removed once (case-sensitive). A credit that then reads
/// `Self`, or repeats the acting actor's own name, becomes `himself`.
#[must_use]
pub fn normalize_character(raw: &str, actor_name: &str) -> String {
    let mut name = raw.to_string();
    for annotation in CREDIT_ANNOTATIONS {
        name = name.replacen(annotation, "", 1);
    }
    if name == SELF_CREDIT || name == actor_name {
        SELF_LABEL.to_string()
    } else {
        name
    }
}

/// Text describing the link formed by choosing an option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkCaption {
    /// Short label rendered under the item the choice was made from.
    pub label: String,
    /// Full sentence for assistive-technology announcements.
    pub announcement: String,
}

/// Build the caption for choosing `chosen` from `from`, which sits at
/// `from_index` in its chain. Returns `None` when the credit names no character.
#[must_use]
pub fn link_caption(from: &Item, chosen: &Item, from_index: usize) -> Option<LinkCaption> {
    let raw = chosen.character()?;
    match (from, chosen) {
        (Item::Actor(actor), Item::Movie(movie)) => {
            let character = normalize_character(raw, &actor.name);
            let lead = if from_index == 0 { "" } else { "who " };
            Some(LinkCaption {
                label: format!("{lead}played {character} in..."),
                announcement: format!("{} played {character} in {}", actor.name, movie.name),
            })
        }
        (Item::Movie(movie), Item::Actor(actor)) => {
            let character = normalize_character(raw, &actor.name);
            Some(LinkCaption {
                label: format!("which featured {character} played by..."),
                announcement: format!(
                    "{} featured {character} played by {}",
                    movie.name, actor.name
                ),
            })
        }
        _ => None,
    }
}
