//! Integration tests for the command surface.

use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use uuid::Uuid;

use chime::models::content::ContentItem;

use super::test_helpers::{env, expect_silence, message, next_quote, GROUP, OTHER_GROUP};

#[tokio::test]
async fn show_all_alarms_lists_only_own_group() {
    let mut env = env().await;
    let start = Utc::now() + ChronoDuration::hours(1);
    let id = env
        .scheduler
        .create(start, 3_600_000, GROUP, vec![ContentItem::Text("a".into())])
        .await
        .unwrap();
    env.scheduler
        .create(start, 3_600_000, OTHER_GROUP, vec![ContentItem::Text("b".into())])
        .await
        .unwrap();

    env.router
        .handle_message(&message(GROUP, "show all alarms"))
        .await;
    let (_, listing) = next_quote(&mut env.outbound).await;
    assert_eq!(listing, format!("Alarms:\n{id}"));
}

#[tokio::test]
async fn show_all_alarms_when_empty() {
    let mut env = env().await;
    env.router
        .handle_message(&message(GROUP, "show all alarms"))
        .await;
    let (_, listing) = next_quote(&mut env.outbound).await;
    assert_eq!(listing, "Alarms:");
}

#[tokio::test]
async fn show_alarm_describes_record() {
    let mut env = env().await;
    let start = Utc::now() + ChronoDuration::hours(2);
    let id = env
        .scheduler
        .create(
            start,
            5_400_000,
            GROUP,
            vec![ContentItem::Text("brew ".into()), ContentItem::Face(1)],
        )
        .await
        .unwrap();

    env.router
        .handle_message(&message(GROUP, &format!("show alarm {id}")))
        .await;
    let (_, description) = next_quote(&mut env.outbound).await;
    assert!(description.starts_with("start: "), "{description}");
    assert!(description.contains("duration: 1h 30m"), "{description}");
    assert!(description.ends_with("brew [face 1]"), "{description}");
}

#[tokio::test]
async fn show_alarm_prefix_is_case_insensitive() {
    let mut env = env().await;
    let id = env
        .scheduler
        .create(
            Utc::now() + ChronoDuration::hours(1),
            3_600_000,
            GROUP,
            vec![ContentItem::Text("x".into())],
        )
        .await
        .unwrap();

    env.router
        .handle_message(&message(GROUP, &format!("SHOW ALARM {id}")))
        .await;
    let (_, description) = next_quote(&mut env.outbound).await;
    assert!(description.starts_with("start: "), "{description}");
}

#[tokio::test]
async fn exact_commands_are_case_sensitive() {
    let mut env = env().await;
    env.router.handle_message(&message(GROUP, "NEW ALARM")).await;
    env.router
        .handle_message(&message(GROUP, "Show All Alarms"))
        .await;
    expect_silence(&mut env.outbound, Duration::from_millis(200)).await;
}

#[tokio::test]
async fn show_alarm_unknown_id_reports_not_found() {
    let mut env = env().await;
    let id = Uuid::new_v4();
    env.router
        .handle_message(&message(GROUP, &format!("show alarm {id}")))
        .await;
    let (_, error_text) = next_quote(&mut env.outbound).await;
    assert!(error_text.starts_with("not found:"), "{error_text}");
}

#[tokio::test]
async fn show_alarm_garbage_id_reports_not_found() {
    let mut env = env().await;
    env.router
        .handle_message(&message(GROUP, "show alarm definitely-not-a-uuid"))
        .await;
    let (_, error_text) = next_quote(&mut env.outbound).await;
    assert!(error_text.starts_with("not found:"), "{error_text}");
}

#[tokio::test]
async fn cross_group_show_reports_not_found() {
    let mut env = env().await;
    let id = env
        .scheduler
        .create(
            Utc::now() + ChronoDuration::hours(1),
            3_600_000,
            GROUP,
            vec![ContentItem::Text("x".into())],
        )
        .await
        .unwrap();

    env.router
        .handle_message(&message(OTHER_GROUP, &format!("show alarm {id}")))
        .await;
    let (_, error_text) = next_quote(&mut env.outbound).await;
    assert!(error_text.starts_with("not found:"), "{error_text}");
}

#[tokio::test]
async fn remove_alarm_confirms_and_forgets() {
    let mut env = env().await;
    let id = env
        .scheduler
        .create(
            Utc::now() + ChronoDuration::hours(1),
            3_600_000,
            GROUP,
            vec![ContentItem::Text("x".into())],
        )
        .await
        .unwrap();

    env.router
        .handle_message(&message(GROUP, &format!("remove alarm {id}")))
        .await;
    let (_, confirmation) = next_quote(&mut env.outbound).await;
    assert_eq!(confirmation, "Done.");

    env.router
        .handle_message(&message(GROUP, "show all alarms"))
        .await;
    let (_, listing) = next_quote(&mut env.outbound).await;
    assert_eq!(listing, "Alarms:");
}

#[tokio::test]
async fn remove_alarm_tolerates_surrounding_whitespace() {
    let mut env = env().await;
    let id = env
        .scheduler
        .create(
            Utc::now() + ChronoDuration::hours(1),
            3_600_000,
            GROUP,
            vec![ContentItem::Text("x".into())],
        )
        .await
        .unwrap();

    env.router
        .handle_message(&message(GROUP, &format!("remove alarm   {id} ")))
        .await;
    let (_, confirmation) = next_quote(&mut env.outbound).await;
    assert_eq!(confirmation, "Done.");
}

#[tokio::test]
async fn unrelated_chatter_is_ignored() {
    let mut env = env().await;
    env.router
        .handle_message(&message(GROUP, "good morning everyone"))
        .await;
    env.router.handle_message(&message(GROUP, "alarm")).await;
    env.router.handle_message(&message(GROUP, "show alarm")).await;
    expect_silence(&mut env.outbound, Duration::from_millis(200)).await;
}
