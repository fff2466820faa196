//! Client-side caches mirroring the backend, shared by every panel.

use std::collections::HashMap;

use crate::model::{Conversation, Entity, Game, Room, Script, UserRole};

/// The single source of truth the panels and graphs render from.
///
/// Mutations happen on the UI thread only, in response to confirmed backend
/// results; a failed call leaves the cache untouched.
#[derive(Default)]
pub struct EditorState {
    pub games: Vec<Game>,
    pub selected_game_id: Option<i64>,

    /// Rooms in the server's sort order; the first one is the start room.
    pub rooms: Vec<Room>,
    /// Full detail of the room open in the detail panel, connections included.
    pub selected_room: Option<Room>,
    /// Entities located in the selected room, for the detail panel.
    pub selected_room_entities: Vec<Entity>,

    pub entities: Vec<Entity>,
    pub selected_entity_id: Option<i64>,

    pub scripts: Vec<Script>,
    pub selected_script_id: Option<i64>,

    pub conversations: Vec<Conversation>,
    pub selected_conversation_id: Option<i64>,

    pub user_role: UserRole,
    pub has_unsaved_changes: bool,
}

impl EditorState {
    /// Switch the active game and drop everything scoped to the old one.
    pub fn select_game(&mut self, game_id: Option<i64>) {
        self.selected_game_id = game_id;
        self.rooms.clear();
        self.selected_room = None;
        self.selected_room_entities.clear();
        self.entities.clear();
        self.selected_entity_id = None;
        self.scripts.clear();
        self.selected_script_id = None;
        self.conversations.clear();
        self.selected_conversation_id = None;
        self.has_unsaved_changes = false;
    }

    pub fn selected_game(&self) -> Option<&Game> {
        let id = self.selected_game_id?;
        self.games.iter().find(|g| g.id == id)
    }

    pub fn room(&self, id: i64) -> Option<&Room> {
        self.rooms.iter().find(|r| r.id == id)
    }

    pub fn room_title(&self, id: i64) -> String {
        self.room(id)
            .map(|r| r.title.clone())
            .unwrap_or_else(|| format!("kamer {id}"))
    }

    pub fn room_titles(&self) -> HashMap<i64, String> {
        self.rooms.iter().map(|r| (r.id, r.title.clone())).collect()
    }

    pub fn is_start_room(&self, id: i64) -> bool {
        self.rooms.first().map(|r| r.id) == Some(id)
    }

    pub fn entity(&self, id: i64) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id == id)
    }

    pub fn selected_entity(&self) -> Option<&Entity> {
        self.entity(self.selected_entity_id?)
    }

    pub fn script(&self, id: i64) -> Option<&Script> {
        self.scripts.iter().find(|s| s.id == id)
    }

    pub fn conversation(&self, id: i64) -> Option<&Conversation> {
        self.conversations.iter().find(|c| c.id == id)
    }

    pub fn selected_conversation(&self) -> Option<&Conversation> {
        self.conversation(self.selected_conversation_id?)
    }

    /// Replace a cached room after a confirmed save; keeps list and detail in
    /// step without a refetch.
    pub fn upsert_room(&mut self, room: Room) {
        if let Some(slot) = self.rooms.iter_mut().find(|r| r.id == room.id) {
            slot.title = room.title.clone();
            slot.description = room.description.clone();
            slot.image_path = room.image_path.clone();
            slot.pos_x = room.pos_x;
            slot.pos_y = room.pos_y;
        } else {
            self.rooms.push(room.clone());
        }
        if self.selected_room.as_ref().map(|r| r.id) == Some(room.id) {
            let connections = self
                .selected_room
                .as_ref()
                .and_then(|r| r.connections.clone());
            let mut room = room;
            if room.connections.is_none() {
                room.connections = connections;
            }
            self.selected_room = Some(room);
        }
    }

    pub fn remove_room(&mut self, id: i64) {
        self.rooms.retain(|r| r.id != id);
        if self.selected_room.as_ref().map(|r| r.id) == Some(id) {
            self.selected_room = None;
            self.selected_room_entities.clear();
        }
        // Entities standing in the deleted room lose their location.
        for entity in &mut self.entities {
            if entity.room_id == Some(id) {
                entity.room_id = None;
            }
        }
    }

    pub fn upsert_entity(&mut self, entity: Entity) {
        if let Some(slot) = self.entities.iter_mut().find(|e| e.id == entity.id) {
            *slot = entity;
        } else {
            self.entities.push(entity);
        }
    }

    pub fn next_room_title(&self) -> String {
        let mut n = self.rooms.len() + 1;
        loop {
            let candidate = format!("Nieuwe Kamer {n}");
            if self.rooms.iter().all(|r| r.title != candidate) {
                return candidate;
            }
            n += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room(id: i64, title: &str) -> Room {
        Room {
            id,
            title: title.into(),
            ..Default::default()
        }
    }

    #[test]
    fn selecting_a_game_clears_scoped_caches_and_dirty_flag() {
        let mut state = EditorState {
            has_unsaved_changes: true,
            rooms: vec![room(1, "Hal")],
            selected_room: Some(room(1, "Hal")),
            ..Default::default()
        };
        state.select_game(Some(9));
        assert_eq!(state.selected_game_id, Some(9));
        assert!(state.rooms.is_empty());
        assert!(state.selected_room.is_none());
        assert!(!state.has_unsaved_changes);
    }

    #[test]
    fn removing_a_room_clears_detail_and_entity_locations() {
        let mut state = EditorState {
            rooms: vec![room(1, "Hal"), room(2, "Kelder")],
            selected_room: Some(room(2, "Kelder")),
            entities: vec![Entity {
                id: 5,
                name: "Lantaarn".into(),
                room_id: Some(2),
                ..Default::default()
            }],
            ..Default::default()
        };
        state.remove_room(2);
        assert!(state.selected_room.is_none());
        assert_eq!(state.rooms.len(), 1);
        assert_eq!(state.entities[0].room_id, None);
    }

    #[test]
    fn upsert_room_keeps_detail_connections() {
        let mut detail = room(3, "Zolder");
        detail.connections = Some(vec![Default::default()]);
        let mut state = EditorState {
            rooms: vec![room(3, "Zolder")],
            selected_room: Some(detail),
            ..Default::default()
        };
        state.upsert_room(room(3, "Zolder (opgeknapt)"));
        let selected = state.selected_room.as_ref().unwrap();
        assert_eq!(selected.title, "Zolder (opgeknapt)");
        assert!(selected.connections.is_some());
    }

    #[test]
    fn new_room_titles_skip_taken_numbers() {
        let mut state = EditorState::default();
        state.rooms = vec![room(1, "Nieuwe Kamer 2")];
        assert_eq!(state.next_room_title(), "Nieuwe Kamer 3");
        state.rooms.push(room(2, "Nieuwe Kamer 3"));
        assert_eq!(state.next_room_title(), "Nieuwe Kamer 4");
    }

    #[test]
    fn first_room_is_the_start_room() {
        let state = EditorState {
            rooms: vec![room(4, "Hal"), room(5, "Kelder")],
            ..Default::default()
        };
        assert!(state.is_start_room(4));
        assert!(!state.is_start_room(5));
    }
}
