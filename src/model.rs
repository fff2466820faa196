//! Wire types for the backend's JSON payloads.
//!
//! Fields the server omits on list endpoints are optional here so the same
//! type covers both the summary and detail shapes.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Game {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub start_image_path: Option<String>,
    #[serde(default)]
    pub win_image_path: Option<String>,
    #[serde(default)]
    pub has_saved_game: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub id: i64,
    #[serde(default)]
    pub game_id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_path: Option<String>,
    #[serde(default)]
    pub pos_x: Option<f64>,
    #[serde(default)]
    pub pos_y: Option<f64>,
    /// Only present on the detail endpoint.
    #[serde(default)]
    pub connections: Option<Vec<Connection>>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub id: i64,
    pub from_room_id: i64,
    pub to_room_id: i64,
    pub direction: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    #[default]
    Item,
    Npc,
}

impl EntityKind {
    pub fn label(self) -> &'static str {
        match self {
            EntityKind::Item => "item",
            EntityKind::Npc => "npc",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: i64,
    #[serde(default)]
    pub game_id: i64,
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: EntityKind,
    #[serde(default)]
    pub description: Option<String>,
    /// Location: at most one of `room_id` / `container_entity_id` is set.
    #[serde(default)]
    pub room_id: Option<i64>,
    #[serde(default)]
    pub container_entity_id: Option<i64>,
    #[serde(default)]
    pub is_takable: bool,
    #[serde(default)]
    pub pickup_message: Option<String>,
    #[serde(default)]
    pub conversation_id: Option<i64>,
    #[serde(default)]
    pub image_path: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Script {
    pub id: i64,
    #[serde(default)]
    pub game_id: i64,
    pub trigger: String,
    #[serde(default)]
    pub script: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: i64,
    #[serde(default)]
    pub game_id: i64,
    pub name: String,
    /// Free-form dialogue tree: `{ start_node, nodes: { id: {...} } }`.
    #[serde(default)]
    pub structure: serde_json::Value,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayOption {
    #[serde(default)]
    pub text: String,
}

/// Everything the play endpoint may attach to a single command response.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayResponse {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub image_path: Option<String>,
    #[serde(default)]
    pub current_score: Option<i64>,
    #[serde(default)]
    pub points_awarded: Option<i64>,
    #[serde(default)]
    pub current_room_id: Option<i64>,
    #[serde(default)]
    pub in_conversation: bool,
    #[serde(default)]
    pub node_type: Option<String>,
    #[serde(default)]
    pub options: Vec<PlayOption>,
    #[serde(default)]
    pub npc_name: Option<String>,
    #[serde(default)]
    pub entity_image_path: Option<String>,
    #[serde(default)]
    pub game_won: bool,
    #[serde(default)]
    pub win_image_path: Option<String>,
    #[serde(default)]
    pub game_loss: bool,
    #[serde(default)]
    pub loss_reason: Option<String>,
    #[serde(default)]
    pub loss_image_path: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FileEntry {
    pub name: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub is_dir: bool,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub modified: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HighScore {
    #[serde(default)]
    pub game_name: String,
    #[serde(default)]
    pub player_name: String,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub achieved_at: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    Guest,
    Builder,
    Admin,
}

impl UserRole {
    pub fn label(self) -> &'static str {
        match self {
            UserRole::Guest => "guest",
            UserRole::Builder => "builder",
            UserRole::Admin => "admin",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub role: UserRole,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AdminStats {
    #[serde(default)]
    pub user_count: u64,
    #[serde(default)]
    pub game_count: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AdminSettings {
    #[serde(default)]
    pub default_theme: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default)]
    pub theme: String,
    /// Role of the session user, reported by the server with the preferences.
    #[serde(default)]
    pub role: UserRole,
}

/// Human-readable file size, used by the file manager columns.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, "0 B")]
    #[case(512, "512 B")]
    #[case(1024, "1.0 KB")]
    #[case(1536, "1.5 KB")]
    #[case(1048576, "1.0 MB")]
    #[case(5_368_709_120, "5.0 GB")]
    fn sizes_are_humanized(#[case] bytes: u64, #[case] expected: &str) {
        assert_eq!(format_size(bytes), expected);
    }

    #[test]
    fn entity_kind_round_trips_through_type_field() {
        let entity: Entity =
            serde_json::from_str(r#"{"id":1,"name":"Lantaarn","type":"item"}"#).unwrap();
        assert_eq!(entity.kind, EntityKind::Item);
        let back = serde_json::to_value(&entity).unwrap();
        assert_eq!(back["type"], "item");
    }

    #[test]
    fn room_detail_carries_connections() {
        let room: Room = serde_json::from_str(
            r#"{"id":7,"title":"Kelder","connections":[
                {"id":1,"from_room_id":7,"to_room_id":8,"direction":"noord"}]}"#,
        )
        .unwrap();
        assert_eq!(room.connections.as_ref().map(Vec::len), Some(1));
    }
}
