use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::lenient;

/// How a task type's icon is rendered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IconType {
    #[default]
    Emoji,
    Image,
}

impl From<&str> for IconType {
    fn from(keyword: &str) -> Self {
        match keyword {
            "image" => IconType::Image,
            _ => IconType::Emoji,
        }
    }
}

/// Catalog entry referenced by cards through `task_type_id`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TaskType {
    #[serde(deserialize_with = "lenient::string")]
    pub id: String,
    #[serde(deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(deserialize_with = "lenient::string")]
    pub icon: String,
    #[serde(deserialize_with = "lenient::keyword")]
    pub icon_type: IconType,
}

impl TaskType {
    pub fn emoji(id: &str, name: &str, icon: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            icon: icon.to_string(),
            icon_type: IconType::Emoji,
        }
    }
}

/// A due point in local wall-clock time: `YYYY-MM-DD` plus an hour of day
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Deadline {
    #[serde(deserialize_with = "lenient::string")]
    pub date: String,
    /// A missing or `null` hour reads as midnight.
    #[serde(deserialize_with = "lenient::hour")]
    pub hour: u32,
}

impl Deadline {
    pub fn new(date: impl Into<String>, hour: u32) -> Self {
        Self {
            date: date.into(),
            hour,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Card {
    #[serde(deserialize_with = "lenient::string")]
    pub id: String,
    #[serde(deserialize_with = "lenient::string")]
    pub task_type_id: String,
    #[serde(deserialize_with = "lenient::string")]
    pub text: String,
    /// Key into the image blob store. The blob is referenced, not owned.
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::optional_string"
    )]
    pub image_blob_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<Deadline>,
    #[serde(deserialize_with = "lenient::number")]
    pub order: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Divider {
    #[serde(deserialize_with = "lenient::string")]
    pub id: String,
    #[serde(deserialize_with = "lenient::string")]
    pub text: String,
    #[serde(deserialize_with = "lenient::number")]
    pub order: f64,
}

/// An entry in a zone: a task card or a separator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ZoneItem {
    Card(Card),
    Divider(Divider),
}

impl ZoneItem {
    pub fn id(&self) -> &str {
        match self {
            ZoneItem::Card(card) => &card.id,
            ZoneItem::Divider(divider) => &divider.id,
        }
    }

    pub fn order(&self) -> f64 {
        match self {
            ZoneItem::Card(card) => card.order,
            ZoneItem::Divider(divider) => divider.order,
        }
    }

    pub fn as_card(&self) -> Option<&Card> {
        match self {
            ZoneItem::Card(card) => Some(card),
            ZoneItem::Divider(_) => None,
        }
    }

    pub fn as_card_mut(&mut self) -> Option<&mut Card> {
        match self {
            ZoneItem::Card(card) => Some(card),
            ZoneItem::Divider(_) => None,
        }
    }
}

/// Rendered size of a zone. At most one zone is `Max` at a time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollapseState {
    Min,
    #[default]
    Normal,
    Max,
}

impl From<&str> for CollapseState {
    fn from(keyword: &str) -> Self {
        match keyword {
            "min" => CollapseState::Min,
            "max" => CollapseState::Max,
            _ => CollapseState::Normal,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Zone {
    #[serde(deserialize_with = "lenient::string")]
    pub id: String,
    #[serde(deserialize_with = "lenient::string")]
    pub name: String,
    /// Hex color, e.g. `#4a90d9`
    #[serde(deserialize_with = "lenient::string")]
    pub color: String,
    #[serde(deserialize_with = "lenient::keyword")]
    pub collapse_state: CollapseState,
    #[serde(deserialize_with = "lenient::null_as_default")]
    pub items: Vec<ZoneItem>,
    #[serde(deserialize_with = "lenient::number")]
    pub order: f64,
}

impl Zone {
    pub fn new(id: &str, name: &str, color: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            color: color.to_string(),
            ..Default::default()
        }
    }

    /// Items by `order`; equal orders keep their stored sequence.
    pub fn sorted_items(&self) -> Vec<&ZoneItem> {
        let mut items: Vec<&ZoneItem> = self.items.iter().collect();
        items.sort_by(|a, b| a.order().total_cmp(&b.order()));
        items
    }

    pub fn cards(&self) -> impl Iterator<Item = &Card> {
        self.items.iter().filter_map(ZoneItem::as_card)
    }
}

/// The aggregate root; exactly one is persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppState {
    #[serde(deserialize_with = "lenient::string")]
    pub title: String,
    #[serde(deserialize_with = "lenient::null_as_default")]
    pub task_types: Vec<TaskType>,
    #[serde(deserialize_with = "lenient::null_as_default")]
    pub zones: Vec<Zone>,
    #[serde(deserialize_with = "lenient::null_as_default")]
    pub global_min_toggle: bool,
    #[serde(deserialize_with = "lenient::null_as_default")]
    pub global_normal_toggle: bool,
    #[serde(deserialize_with = "lenient::optional_string")]
    pub current_max_zone_id: Option<String>,
    #[serde(deserialize_with = "lenient::optional_string")]
    pub selected_zone_id: Option<String>,
    #[serde(deserialize_with = "lenient::null_as_default")]
    pub dark_mode: bool,
}

/// The state used when nothing has been persisted yet.
pub fn create_default_state() -> AppState {
    AppState {
        title: "TODO LIST".to_string(),
        task_types: vec![
            TaskType::emoji("1", "採集製作", "🔨"),
            TaskType::emoji("2", "主線", "⭐"),
            TaskType::emoji("3", "職業", "💼"),
            TaskType::emoji("4", "其他", "📋"),
        ],
        zones: Vec::new(),
        global_min_toggle: false,
        global_normal_toggle: false,
        current_max_zone_id: None,
        selected_zone_id: None,
        dark_mode: false,
    }
}

/// Generate an id for a newly attached image.
pub fn new_blob_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

impl AppState {
    /// Zones by `order`; equal orders keep their stored sequence.
    pub fn sorted_zones(&self) -> Vec<&Zone> {
        let mut zones: Vec<&Zone> = self.zones.iter().collect();
        zones.sort_by(|a, b| a.order.total_cmp(&b.order));
        zones
    }

    pub fn zone(&self, zone_id: &str) -> Option<&Zone> {
        self.zones.iter().find(|z| z.id == zone_id)
    }

    pub fn zone_mut(&mut self, zone_id: &str) -> Option<&mut Zone> {
        self.zones.iter_mut().find(|z| z.id == zone_id)
    }

    pub fn cards(&self) -> impl Iterator<Item = &Card> {
        self.zones.iter().flat_map(Zone::cards)
    }

    pub fn find_card(&self, card_id: &str) -> Option<&Card> {
        self.cards().find(|c| c.id == card_id)
    }

    pub fn find_card_mut(&mut self, card_id: &str) -> Option<&mut Card> {
        self.zones
            .iter_mut()
            .flat_map(|z| z.items.iter_mut())
            .filter_map(ZoneItem::as_card_mut)
            .find(|c| c.id == card_id)
    }

    /// Blob ids referenced by cards, deduplicated, in first-seen order.
    /// An empty id counts as no image.
    pub fn referenced_blob_ids(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.cards()
            .filter_map(|c| c.image_blob_id.as_deref())
            .filter(|id| !id.is_empty() && seen.insert(*id))
            .map(str::to_string)
            .collect()
    }

    pub fn is_blob_referenced(&self, blob_id: &str) -> bool {
        self.cards()
            .any(|c| c.image_blob_id.as_deref() == Some(blob_id))
    }

    /// Point a card at another image, or at none.
    ///
    /// Returns the card's previous blob id, or `None` when no card has that
    /// id. The previous blob is not deleted.
    pub fn set_card_image(
        &mut self,
        card_id: &str,
        blob_id: Option<String>,
    ) -> Option<Option<String>> {
        let card = self.find_card_mut(card_id)?;
        Some(std::mem::replace(&mut card.image_blob_id, blob_id))
    }

    /// Change a zone's collapse state, keeping at most one zone maximized.
    ///
    /// Maximizing a zone demotes every other maximized zone to `Normal` and
    /// records it in `current_max_zone_id`; leaving `Max` clears that field.
    /// Returns false when the zone does not exist.
    pub fn set_collapse_state(&mut self, zone_id: &str, state: CollapseState) -> bool {
        if self.zone(zone_id).is_none() {
            return false;
        }

        if state == CollapseState::Max {
            for zone in self.zones.iter_mut().filter(|z| z.id != zone_id) {
                if zone.collapse_state == CollapseState::Max {
                    zone.collapse_state = CollapseState::Normal;
                }
            }
            self.current_max_zone_id = Some(zone_id.to_string());
        } else if self.current_max_zone_id.as_deref() == Some(zone_id) {
            self.current_max_zone_id = None;
        }

        if let Some(zone) = self.zone_mut(zone_id) {
            zone.collapse_state = state;
        }
        true
    }

    /// Remove a zone with all its items.
    ///
    /// Returns the blob ids no longer referenced by any remaining card, or
    /// `None` when the zone does not exist. The blobs themselves are left in
    /// place; deleting them is up to the caller.
    pub fn remove_zone(&mut self, zone_id: &str) -> Option<Vec<String>> {
        let index = self.zones.iter().position(|z| z.id == zone_id)?;
        let zone = self.zones.remove(index);

        if self.current_max_zone_id.as_deref() == Some(zone_id) {
            self.current_max_zone_id = None;
        }
        if self.selected_zone_id.as_deref() == Some(zone_id) {
            self.selected_zone_id = None;
        }

        Some(self.unreferenced(zone.cards().filter_map(|c| c.image_blob_id.clone())))
    }

    /// Remove a card or divider from whichever zone holds it.
    ///
    /// Returns the blob ids orphaned by the removal, or `None` when no item
    /// has that id.
    pub fn remove_item(&mut self, item_id: &str) -> Option<Vec<String>> {
        let removed = self.zones.iter_mut().find_map(|zone| {
            let index = zone.items.iter().position(|i| i.id() == item_id)?;
            Some(zone.items.remove(index))
        })?;

        let blob = removed.as_card().and_then(|c| c.image_blob_id.clone());
        Some(self.unreferenced(blob))
    }

    fn unreferenced(&self, candidates: impl IntoIterator<Item = String>) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for id in candidates {
            if !self.is_blob_referenced(&id) && !out.contains(&id) {
                out.push(id);
            }
        }
        out
    }
}
