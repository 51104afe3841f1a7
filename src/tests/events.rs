//! Push event and notification flow tests.
//!
//! These tests verify:
//! - Envelope structure for each farm event kind
//! - Bus → wire → store delivery order
//! - Unread accounting across a full drawer session

#[cfg(test)]
pub mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use crate::bus::{EventBus, EventKind};
    use crate::notifications::{NotificationCenter, NotificationStore};
    use crate::tests::sequential_ids;
    use crate::transport::{decode_envelope, EventEnvelope};

    // ====================================================================================
    // ENVELOPE STRUCTURE TESTS
    // ====================================================================================

    #[tokio::test]
    async fn test_farm_event_envelopes_decode() {
        let events = vec![
            (
                json!({"type": "EMERGENCY_ALERT", "title": "Ventilation failure", "message": "House 4 fans stopped", "payload": {"house": 4}}),
                EventKind::EmergencyAlert,
            ),
            (
                json!({"type": "PRODUCTION_REPORT", "title": "Daily collection", "message": "12,480 eggs", "payload": {"batch_id": "B-2031"}}),
                EventKind::ProductionReport,
            ),
            (
                json!({"type": "INVENTORY_ALERT", "title": "Feed below threshold", "message": "Silo B at 8%"}),
                EventKind::InventoryAlert,
            ),
            (
                json!({"type": "READY_FOR_SLAUGHTER", "title": "Batch B-1987", "message": "Reached 42 days"}),
                EventKind::ReadyForSlaughter,
            ),
        ];

        for (raw, expected) in &events {
            let envelope = decode_envelope(&raw.to_string()).unwrap();
            assert_eq!(&envelope.kind, expected);
            assert_eq!(envelope.title, raw["title"].as_str().unwrap());
            assert_eq!(serde_json::to_value(&envelope).unwrap(), *raw);
        }
    }

    // ====================================================================================
    // DELIVERY ORDER TESTS
    // ====================================================================================

    #[tokio::test]
    async fn test_bus_order_is_receipt_order() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        let center = NotificationCenter::from_store(NotificationStore::with_id_generator(
            50,
            sequential_ids(),
        ));

        for i in 0..5 {
            bus.publish(EventEnvelope::new(
                EventKind::ProductionReport,
                format!("report {i}"),
                "",
            ));
        }
        // Duplicates are not collapsed.
        bus.publish(EventEnvelope::new(EventKind::ProductionReport, "report 4", ""));

        for _ in 0..6 {
            let event = rx.recv().await.unwrap();
            let wire = serde_json::to_string(&event.envelope).unwrap();
            center.add_notification(decode_envelope(&wire).unwrap());
        }

        let titles: Vec<String> = center
            .snapshot()
            .notifications
            .into_iter()
            .map(|n| n.title)
            .collect();
        assert_eq!(
            titles,
            vec!["report 4", "report 4", "report 3", "report 2", "report 1", "report 0"]
        );
        assert_eq!(center.unread_count(), 6);
    }

    // ====================================================================================
    // DRAWER SESSION TESTS
    // ====================================================================================

    #[tokio::test]
    async fn test_unread_count_tracks_every_operation() {
        let center = NotificationCenter::from_store(NotificationStore::with_id_generator(
            4,
            sequential_ids(),
        ));
        let check = |center: &NotificationCenter| {
            let snapshot = center.snapshot();
            let unread = snapshot.notifications.iter().filter(|n| !n.is_read()).count();
            assert_eq!(snapshot.unread_count, unread);
        };

        for i in 0..6 {
            center.add_notification(EventEnvelope::new(EventKind::InventoryAlert, format!("item {i}"), ""));
            check(&center);
        }
        assert_eq!(center.len(), 4);

        center.mark_as_read("n6");
        check(&center);
        center.mark_as_read("n1");
        check(&center);
        center.delete_notification("n6");
        check(&center);
        center.delete_notification("n5");
        check(&center);
        center.mark_all_as_read();
        check(&center);
        center.add_notification(EventEnvelope::new(EventKind::EmergencyAlert, "late", ""));
        check(&center);
        assert_eq!(center.unread_count(), 1);
        center.clear_all_notifications();
        check(&center);
        assert_eq!(center.unread_count(), 0);
    }
}
