//! Shared test helpers for taskboard unit tests.

use crate::storage::models::{
    create_default_state, AppState, Card, Deadline, Divider, Zone, ZoneItem,
};

pub fn card(id: &str, text: &str, image_blob_id: Option<&str>) -> Card {
    Card {
        id: id.to_string(),
        task_type_id: "1".to_string(),
        text: text.to_string(),
        image_blob_id: image_blob_id.map(str::to_string),
        deadline: None,
        order: 0.0,
    }
}

pub fn divider(id: &str, text: &str) -> Divider {
    Divider {
        id: id.to_string(),
        text: text.to_string(),
        order: 0.0,
    }
}

/// Two zones: `zone-1` holds `card-a` (image `img-a`, with deadline) and a
/// divider, `zone-2` holds `card-b` (image `img-b`).
pub fn sample_state() -> AppState {
    let mut state = create_default_state();

    let mut card_a = card("card-a", "gather wood", Some("img-a"));
    card_a.deadline = Some(Deadline::new("2024-06-01", 18));
    let mut div = divider("div-1", "later");
    div.order = 1.0;

    let mut zone_1 = Zone::new("zone-1", "Forest", "#2e7d32");
    zone_1.items = vec![ZoneItem::Card(card_a), ZoneItem::Divider(div)];

    let mut zone_2 = Zone::new("zone-2", "Town", "#1565c0");
    zone_2.order = 1.0;
    zone_2.items = vec![ZoneItem::Card(card("card-b", "sell ore", Some("img-b")))];

    state.zones = vec![zone_1, zone_2];
    state
}
