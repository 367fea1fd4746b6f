mod support;

use support::build_stack;
use tagdesk::application::services::ticket_service::IncomingMessage;
use tagdesk::domain::entities::Sender;

fn user(text: &str) -> IncomingMessage {
    IncomingMessage {
        text: text.to_string(),
        sender: Sender::User,
    }
}

#[tokio::test]
async fn detector_surfaces_weakly_tagged_tickets() {
    let (_, tickets, corner_cases) = build_stack();

    // Confident, complete, long enough text: not a corner case.
    tickets
        .process_messages(
            "conv-clean",
            vec![user("I need to cancel my flight booking, PNR ABC123")],
        )
        .await
        .unwrap();

    // Unintelligible and short: lands on the default pair at 0.3.
    tickets
        .process_messages("conv-messy", vec![user("??")])
        .await
        .unwrap();

    let stats = corner_cases.stats().await.unwrap();
    assert_eq!(stats.total_tickets, 2);
    assert_eq!(stats.corner_cases, 1);
    assert!(stats.by_reason.contains_key("low_confidence"));
    assert!(stats.by_reason.contains_key("short_message"));
    assert!(stats.by_reason.contains_key("default_fallback"));
    assert_eq!(stats.critical, 1);
    assert_eq!(stats.confidence_buckets.high, 1);
}

#[tokio::test]
async fn triage_queue_orders_by_ascending_confidence() {
    let (_, tickets, corner_cases) = build_stack();

    // Default pair at 0.3 via the fallback pass.
    tickets
        .process_messages("conv-worst", vec![user("zzz")])
        .await
        .unwrap();
    // One fallback axis resolved: 0.5, still below the acceptance bar.
    tickets
        .process_messages("conv-middle", vec![user("it is about the embassy appointment")])
        .await
        .unwrap();
    // Clean ticket, should not appear at all.
    tickets
        .process_messages(
            "conv-clean",
            vec![user("please cancel my hotel reservation and refund me")],
        )
        .await
        .unwrap();

    let queue = corner_cases.problematic_tickets(10).await.unwrap();
    assert_eq!(queue.len(), 2);
    assert_eq!(queue[0].conversation_id, "conv-worst");
    assert_eq!(queue[1].conversation_id, "conv-middle");
    assert!(queue[0].current_tag.confidence < queue[1].current_tag.confidence);
}

#[tokio::test]
async fn queue_limit_is_honored() {
    let (_, tickets, corner_cases) = build_stack();

    for i in 0..5 {
        tickets
            .process_messages(&format!("conv-{i}"), vec![user("??")])
            .await
            .unwrap();
    }

    let queue = corner_cases.problematic_tickets(2).await.unwrap();
    assert_eq!(queue.len(), 2);
}
