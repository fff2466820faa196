//! One module per editor tab.

pub mod admin;
pub mod conversations;
pub mod entities;
pub mod files;
pub mod games;
pub mod play;
pub mod prefs;
pub mod rooms;
pub mod scores;
pub mod scripts;

use crate::model::UserRole;
use crate::net::Jobs;
use crate::state::EditorState;
use crate::ui::Flashes;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Tab {
    #[default]
    Games,
    Rooms,
    Entities,
    Scripts,
    Conversations,
    Play,
    Files,
    Scores,
    Admin,
}

impl Tab {
    pub fn label(self) -> &'static str {
        match self {
            Tab::Games => "Spellen",
            Tab::Rooms => "Kamers",
            Tab::Entities => "Entiteiten",
            Tab::Scripts => "Scripts",
            Tab::Conversations => "Gesprekken",
            Tab::Play => "Spelen",
            Tab::Files => "Bestanden",
            Tab::Scores => "Scores",
            Tab::Admin => "Beheer",
        }
    }

    /// Tabs that are meaningless without an open game are disabled until one
    /// is selected.
    pub fn needs_game(self) -> bool {
        matches!(
            self,
            Tab::Rooms | Tab::Entities | Tab::Scripts | Tab::Conversations | Tab::Play
        )
    }

    /// The Beheer tab only exists for admins.
    pub fn visible_for(self, role: UserRole) -> bool {
        self != Tab::Admin || role == UserRole::Admin
    }
}

/// Cross-panel effects a panel can ask the app shell to perform.
#[derive(Default)]
pub struct Requests {
    pub select_game: Option<i64>,
    pub switch_tab: Option<Tab>,
    pub open_prefs: bool,
}

/// Everything a panel needs each frame.
pub struct PanelCtx<'a> {
    pub state: &'a mut EditorState,
    pub jobs: &'a Jobs,
    pub flashes: &'a mut Flashes,
    pub requests: &'a mut Requests,
    pub now: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn the_admin_tab_is_hidden_from_non_admins() {
        assert!(!Tab::Admin.visible_for(UserRole::Guest));
        assert!(!Tab::Admin.visible_for(UserRole::Builder));
        assert!(Tab::Admin.visible_for(UserRole::Admin));
        assert!(Tab::Files.visible_for(UserRole::Guest));
    }
}
