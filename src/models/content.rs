//! Typed payload content items and their persisted JSON layout.
//!
//! Every alarm payload is an ordered sequence of [`ContentItem`]s. The serde
//! representation is adjacently tagged as `{"type": ..., "value": ...}`,
//! which is also the element layout inside the persisted snapshot.

use serde::{Deserialize, Serialize};

/// One typed item of an alarm payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ContentItem {
    /// Plain text.
    Text(String),
    /// Reference to an externally stored image attachment.
    Image(String),
    /// Platform emote, by numeric code.
    Face(u32),
    /// Mention of a group member, by user id.
    Mention(u64),
}

impl ContentItem {
    /// Attachment reference id when this item is an image.
    #[must_use]
    pub fn image_ref(&self) -> Option<&str> {
        match self {
            Self::Image(ref_id) => Some(ref_id),
            _ => None,
        }
    }
}

/// Filter inbound content down to what an alarm payload may carry.
///
/// Text, images, and faces pass through; mentions pass through unless they
/// target the bot itself (`self_id`). Everything else was already dropped at
/// the transport boundary, so an unsupported kind never reaches this point.
#[must_use]
pub fn filter_payload(items: &[ContentItem], self_id: u64) -> Vec<ContentItem> {
    items
        .iter()
        .filter(|item| match item {
            ContentItem::Mention(target) => *target != self_id,
            ContentItem::Text(_) | ContentItem::Image(_) | ContentItem::Face(_) => true,
        })
        .cloned()
        .collect()
}

/// Render a payload as plain text for `show alarm` output.
#[must_use]
pub fn render_text(items: &[ContentItem]) -> String {
    let mut out = String::new();
    for item in items {
        match item {
            ContentItem::Text(text) => out.push_str(text),
            ContentItem::Image(ref_id) => {
                out.push_str("[image ");
                out.push_str(ref_id);
                out.push(']');
            }
            ContentItem::Face(code) => {
                out.push_str("[face ");
                out.push_str(&code.to_string());
                out.push(']');
            }
            ContentItem::Mention(target) => {
                out.push('@');
                out.push_str(&target.to_string());
            }
        }
    }
    out
}
