//! Unit tests for payload content items: wire layout, filtering, rendering.

use serde_json::json;

use chime::models::content::{filter_payload, render_text, ContentItem};

const BOT_ID: u64 = 999;

#[test]
fn items_serialize_as_type_value_pairs() {
    assert_eq!(
        serde_json::to_value(ContentItem::Text("hello".into())).unwrap(),
        json!({"type": "text", "value": "hello"})
    );
    assert_eq!(
        serde_json::to_value(ContentItem::Image("img-ref".into())).unwrap(),
        json!({"type": "image", "value": "img-ref"})
    );
    assert_eq!(
        serde_json::to_value(ContentItem::Face(14)).unwrap(),
        json!({"type": "face", "value": 14})
    );
    assert_eq!(
        serde_json::to_value(ContentItem::Mention(42)).unwrap(),
        json!({"type": "mention", "value": 42})
    );
}

#[test]
fn items_deserialize_from_type_value_pairs() {
    let item: ContentItem =
        serde_json::from_value(json!({"type": "text", "value": "hi"})).unwrap();
    assert_eq!(item, ContentItem::Text("hi".into()));

    let item: ContentItem =
        serde_json::from_value(json!({"type": "image", "value": "abc"})).unwrap();
    assert_eq!(item.image_ref(), Some("abc"));
}

#[test]
fn filter_drops_mentions_of_the_bot_only() {
    let items = vec![
        ContentItem::Text("morning ".into()),
        ContentItem::Mention(BOT_ID),
        ContentItem::Mention(7),
        ContentItem::Face(3),
        ContentItem::Image("pic".into()),
    ];
    let filtered = filter_payload(&items, BOT_ID);
    assert_eq!(
        filtered,
        vec![
            ContentItem::Text("morning ".into()),
            ContentItem::Mention(7),
            ContentItem::Face(3),
            ContentItem::Image("pic".into()),
        ]
    );
}

#[test]
fn filter_preserves_order() {
    let items = vec![
        ContentItem::Mention(BOT_ID),
        ContentItem::Text("a".into()),
        ContentItem::Mention(BOT_ID),
        ContentItem::Text("b".into()),
    ];
    let filtered = filter_payload(&items, BOT_ID);
    assert_eq!(
        filtered,
        vec![ContentItem::Text("a".into()), ContentItem::Text("b".into())]
    );
}

#[test]
fn render_text_covers_all_kinds() {
    let items = vec![
        ContentItem::Text("standup ".into()),
        ContentItem::Mention(7),
        ContentItem::Face(3),
        ContentItem::Image("pic".into()),
    ];
    assert_eq!(render_text(&items), "standup @7[face 3][image pic]");
}

#[test]
fn image_ref_is_none_for_other_kinds() {
    assert_eq!(ContentItem::Text("x".into()).image_ref(), None);
    assert_eq!(ContentItem::Face(1).image_ref(), None);
    assert_eq!(ContentItem::Mention(1).image_ref(), None);
}
