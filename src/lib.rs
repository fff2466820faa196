//! Desktop authoring studio for Avontuur text adventures.
//!
//! The crate talks to the backend's JSON API with a blocking client on worker
//! threads; all state mutation happens on the UI thread when the confirmed
//! results are drained each frame.

pub mod api;
pub mod graph;
pub mod model;
pub mod net;
pub mod panels;
pub mod state;
pub mod themes;
pub mod ui;
pub mod widgets;

use std::sync::Arc;

use eframe::egui::{self, Align, Layout};
use log::info;

use crate::net::{Jobs, Msg, Remote};
use crate::panels::{
    admin::AdminPanel, conversations::ConversationsPanel, entities::EntitiesPanel,
    files::FilesPanel, games::GamesPanel, play::PlayPanel, prefs::PrefsPanel, rooms::RoomsPanel,
    scores::ScoresPanel, scripts::ScriptsPanel, PanelCtx, Requests, Tab,
};
use crate::state::EditorState;
use crate::themes::ThemePreference;
use crate::ui::Flashes;

pub struct StudioApp {
    state: EditorState,
    jobs: Jobs,
    flashes: Flashes,
    tab: Tab,
    theme: ThemePreference,

    games: GamesPanel,
    rooms: RoomsPanel,
    entities: EntitiesPanel,
    scripts: ScriptsPanel,
    conversations: ConversationsPanel,
    play: PlayPanel,
    files: FilesPanel,
    scores: ScoresPanel,
    admin: AdminPanel,
    prefs: PrefsPanel,
}

impl StudioApp {
    pub fn new(cc: &eframe::CreationContext<'_>, server: String) -> Self {
        let jobs = Jobs::new(
            Arc::new(api::Client::new(&server)),
            cc.egui_ctx.clone(),
        );
        jobs.spawn("spellen laden", |api| api.games().map(Msg::GamesLoaded));
        jobs.spawn("voorkeuren laden", |api| {
            api.preferences().map(Msg::PrefsLoaded)
        });
        info!("verbonden met {server}");

        Self {
            state: EditorState::default(),
            jobs,
            flashes: Flashes::default(),
            tab: Tab::Games,
            theme: ThemePreference::System,
            games: GamesPanel::default(),
            rooms: RoomsPanel::default(),
            entities: EntitiesPanel::default(),
            scripts: ScriptsPanel::default(),
            conversations: ConversationsPanel::default(),
            play: PlayPanel::default(),
            files: FilesPanel::default(),
            scores: ScoresPanel::default(),
            admin: AdminPanel::default(),
            prefs: PrefsPanel::default(),
        }
    }

    /// eframe boilerplate: window persistence, Ctrl-C, and the two theme
    /// styles registered once.
    pub fn run(server: String) -> eframe::Result {
        let mut native_options = eframe::NativeOptions::default();
        native_options.persist_window = true;

        eframe::run_native(
            "Avontuur Studio",
            native_options,
            Box::new(|cc| {
                let ctx = cc.egui_ctx.clone();
                ctrlc::set_handler(move || ctx.send_viewport_cmd(egui::ViewportCommand::Close))
                    .expect("failed to set exit signal handler");

                egui_extras::install_image_loaders(&cc.egui_ctx);
                cc.egui_ctx
                    .set_style_of(egui::Theme::Light, themes::studio_light());
                cc.egui_ctx
                    .set_style_of(egui::Theme::Dark, themes::studio_dark());
                cc.egui_ctx.set_theme(ThemePreference::System.resolve());

                Ok(Box::new(StudioApp::new(cc, server)))
            }),
        )
    }

    fn set_theme(&mut self, egui_ctx: &egui::Context, theme: ThemePreference) {
        self.theme = theme;
        egui_ctx.set_theme(theme.resolve());
    }

    fn select_game(&mut self, game_id: i64) {
        self.state.select_game(Some(game_id));
        self.play.reset();
        self.rooms.rebuild_graph(&[], &[]);
        self.jobs.spawn("spel openen", move |api| {
            let rooms = api.rooms(game_id)?;
            let connections = api.connections(game_id)?;
            let entities = api.entities(game_id)?;
            let scripts = api.scripts(game_id)?;
            let conversations = api.conversations(game_id)?;
            Ok(Msg::GameLoaded {
                game_id,
                rooms,
                connections,
                entities,
                scripts,
                conversations,
            })
        });
    }

    fn apply(&mut self, msg: Msg, now: f64) {
        match msg {
            Msg::GamesLoaded(games) => self.state.games = games,
            Msg::GameSaved(game) => {
                match self.state.games.iter_mut().find(|g| g.id == game.id) {
                    Some(slot) => *slot = game,
                    None => self.state.games.push(game),
                }
                self.state.has_unsaved_changes = false;
                self.flashes.info("Spel opgeslagen.", now);
            }
            Msg::GameDeleted(id) => {
                self.state.games.retain(|g| g.id != id);
                if self.state.selected_game_id == Some(id) {
                    self.state.select_game(None);
                    self.tab = Tab::Games;
                }
            }
            Msg::GameExported { name, path } => {
                self.flashes
                    .info(format!("'{name}' geëxporteerd naar {}", path.display()), now);
            }
            Msg::GameImported(game) => {
                self.flashes
                    .info(format!("'{}' geïmporteerd.", game.name), now);
                self.state.games.push(game);
            }

            Msg::GameLoaded {
                game_id,
                rooms,
                connections,
                entities,
                scripts,
                conversations,
            } => {
                // A stale load for a game we already left gets dropped.
                if self.state.selected_game_id == Some(game_id) {
                    self.state.rooms = rooms;
                    self.state.entities = entities;
                    self.state.scripts = scripts;
                    self.state.conversations = conversations;
                    self.rooms.rebuild_graph(&self.state.rooms, &connections);
                }
            }

            Msg::RoomsLoaded(rooms) => {
                self.state.rooms = rooms;
                self.rooms
                    .graph
                    .set_start(self.state.rooms.first().map(|r| r.id));
            }
            Msg::RoomDetail { room, entities } => {
                self.state.selected_room = Some(room);
                self.state.selected_room_entities = entities;
            }
            Msg::RoomCreated(room) => {
                self.state.upsert_room(room.clone());
                let is_start = self.state.is_start_room(room.id);
                self.rooms.graph.add_room(&room, is_start);
                self.flashes
                    .info(format!("Kamer '{}' aangemaakt.", room.title), now);
            }
            Msg::RoomSaved(room) => {
                self.rooms.graph.set_label(room.id, &room.title);
                self.state.upsert_room(room);
                self.state.has_unsaved_changes = false;
                self.flashes.info("Kamer opgeslagen.", now);
            }
            Msg::RoomDeleted(id) => {
                self.state.remove_room(id);
                self.rooms.graph.remove_room(id);
                self.rooms
                    .graph
                    .set_start(self.state.rooms.first().map(|r| r.id));
            }
            Msg::RoomOrderSaved => {
                self.flashes.info("Volgorde opgeslagen.", now);
            }
            Msg::RoomPositionSaved { room_id, x, y } => {
                if let Some(room) = self.state.rooms.iter_mut().find(|r| r.id == room_id) {
                    room.pos_x = Some(x);
                    room.pos_y = Some(y);
                }
            }

            Msg::ConnectionCreated(conn) => {
                if let Some(selected) = &mut self.state.selected_room {
                    if selected.id == conn.from_room_id {
                        selected
                            .connections
                            .get_or_insert_with(Vec::new)
                            .push(conn.clone());
                    }
                }
                self.rooms.graph.add_connection(conn);
            }
            Msg::ConnectionUpdated(conn) => {
                if let Some(selected) = &mut self.state.selected_room {
                    if let Some(slot) = selected
                        .connections
                        .iter_mut()
                        .flatten()
                        .find(|c| c.id == conn.id)
                    {
                        *slot = conn.clone();
                    }
                }
                self.rooms.graph.update_connection(conn);
            }
            Msg::ConnectionDeleted(id) => {
                if let Some(selected) = &mut self.state.selected_room {
                    if let Some(connections) = &mut selected.connections {
                        connections.retain(|c| c.id != id);
                    }
                }
                self.rooms.graph.remove_connection(id);
            }

            Msg::EntitySaved(entity) => {
                self.state.upsert_entity(entity.clone());
                // Keep the room detail's entity list in step with the move.
                let selected_room = self.state.selected_room.as_ref().map(|r| r.id);
                let in_selected = entity.room_id.is_some() && entity.room_id == selected_room;
                let listed = self
                    .state
                    .selected_room_entities
                    .iter()
                    .position(|e| e.id == entity.id);
                match (in_selected, listed) {
                    (true, Some(idx)) => self.state.selected_room_entities[idx] = entity,
                    (true, None) => self.state.selected_room_entities.push(entity),
                    (false, Some(idx)) => {
                        self.state.selected_room_entities.remove(idx);
                    }
                    (false, None) => {}
                }
                self.state.has_unsaved_changes = false;
                self.flashes.info("Entiteit opgeslagen.", now);
            }
            Msg::EntityDeleted(id) => {
                self.state.entities.retain(|e| e.id != id);
                self.state.selected_room_entities.retain(|e| e.id != id);
                if self.state.selected_entity_id == Some(id) {
                    self.state.selected_entity_id = None;
                }
            }

            Msg::ScriptSaved(script) => {
                match self.state.scripts.iter_mut().find(|s| s.id == script.id) {
                    Some(slot) => *slot = script.clone(),
                    None => self.state.scripts.push(script.clone()),
                }
                self.state.selected_script_id = Some(script.id);
                self.state.has_unsaved_changes = false;
                self.flashes.info("Script opgeslagen.", now);
            }
            Msg::ScriptDeleted(id) => {
                self.state.scripts.retain(|s| s.id != id);
                if self.state.selected_script_id == Some(id) {
                    self.state.selected_script_id = None;
                }
            }

            Msg::ConversationSaved(convo) => {
                match self
                    .state
                    .conversations
                    .iter_mut()
                    .find(|c| c.id == convo.id)
                {
                    Some(slot) => *slot = convo.clone(),
                    None => self.state.conversations.push(convo.clone()),
                }
                self.state.selected_conversation_id = Some(convo.id);
                self.state.has_unsaved_changes = false;
                self.flashes.info("Gesprek opgeslagen.", now);
            }
            Msg::ConversationDeleted(id) => {
                self.state.conversations.retain(|c| c.id != id);
                if self.state.selected_conversation_id == Some(id) {
                    self.state.selected_conversation_id = None;
                }
            }

            Msg::Play { echo, response } => {
                self.play.apply(echo, &response);
            }

            Msg::FilesLoaded { dir, entries } => {
                self.files.dir = dir;
                self.files.entries = Remote::Ready(entries);
            }
            Msg::HighScoresLoaded(scores) => {
                self.scores.scores = Remote::Ready(scores);
            }

            Msg::AdminLoaded {
                stats,
                users,
                settings,
            } => {
                self.admin.sync_settings(&settings);
                self.admin.data = Remote::Ready((stats, users, settings));
            }
            Msg::UserSaved(user) => {
                if let Remote::Ready((stats, users, _)) = &mut self.admin.data {
                    match users.iter_mut().find(|u| u.id == user.id) {
                        Some(slot) => *slot = user,
                        None => {
                            users.push(user);
                            stats.user_count += 1;
                        }
                    }
                }
                self.flashes.info("Gebruiker opgeslagen.", now);
            }
            Msg::UserDeleted(id) => {
                if let Remote::Ready((stats, users, _)) = &mut self.admin.data {
                    users.retain(|u| u.id != id);
                    stats.user_count = stats.user_count.saturating_sub(1);
                }
            }
            Msg::AdminSettingsSaved(settings) => {
                if let Remote::Ready((_, _, slot)) = &mut self.admin.data {
                    *slot = settings;
                }
                self.flashes.info("Instellingen opgeslagen.", now);
            }

            Msg::PrefsLoaded(prefs) => {
                self.state.user_role = prefs.role;
                self.theme = ThemePreference::from_str(&prefs.theme);
            }
            Msg::PrefsSaved(prefs) => {
                self.state.user_role = prefs.role;
                self.theme = ThemePreference::from_str(&prefs.theme);
                self.flashes.info("Voorkeuren opgeslagen.", now);
            }

            Msg::Failed { action, error } => self.fail(action, error, now),
        }
    }

    /// A failed job never touches the caches; panels with a loading spinner
    /// get flipped to their failure state so they stop spinning.
    fn fail(&mut self, action: String, error: api::ApiError, now: f64) {
        let text = format!("{action} mislukt: {}", error.flash_text());
        match action.as_str() {
            "kamervolgorde opslaan" => {
                // The optimistic reorder is stale now; refetch the truth.
                if let Some(game_id) = self.state.selected_game_id {
                    self.jobs.spawn("kamers laden", move |api| {
                        api.rooms(game_id).map(Msg::RoomsLoaded)
                    });
                }
            }
            "bestanden laden" | "bestand uploaden" | "bestand hernoemen"
            | "bestand verwijderen" | "map aanmaken" => {
                self.files.entries = Remote::Failed(text.clone());
            }
            "scores laden" => {
                self.scores.scores = Remote::Failed(text.clone());
            }
            "beheerdata laden" => {
                self.admin.data = Remote::Failed(text.clone());
            }
            _ => {}
        }
        self.flashes.error(text, now);
    }

    fn top_bar(&mut self, ui: &mut egui::Ui, requests: &mut Requests) {
        ui.horizontal(|ui| {
            ui.strong("Avontuur Studio");
            ui.separator();

            let game_open = self.state.selected_game_id.is_some();
            for tab in [
                Tab::Games,
                Tab::Rooms,
                Tab::Entities,
                Tab::Scripts,
                Tab::Conversations,
                Tab::Play,
                Tab::Files,
                Tab::Scores,
                Tab::Admin,
            ] {
                if !tab.visible_for(self.state.user_role) {
                    continue;
                }
                let enabled = game_open || !tab.needs_game();
                let selected = self.tab == tab;
                if ui
                    .add_enabled(enabled, egui::SelectableLabel::new(selected, tab.label()))
                    .clicked()
                {
                    self.tab = tab;
                }
            }

            ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                if ui.button("⚙").on_hover_text("Voorkeuren").clicked() {
                    requests.open_prefs = true;
                }
                if self.jobs.busy() {
                    ui.spinner();
                    if let Some(action) = self.jobs.in_flight().first() {
                        ui.weak(action);
                    }
                } else if self.state.has_unsaved_changes {
                    ui.colored_label(ui.visuals().warn_fg_color, "● Niet opgeslagen");
                } else if game_open {
                    ui.weak("Opgeslagen");
                }
                if let Some(game) = self.state.selected_game() {
                    ui.separator();
                    ui.label(&game.name);
                }
            });
        });
    }
}

impl eframe::App for StudioApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = ctx.input(|i| i.time);
        let mut requests = Requests::default();

        let theme_before = self.theme;
        for msg in self.jobs.drain() {
            self.apply(msg, now);
        }
        if self.theme != theme_before {
            ctx.set_theme(self.theme.resolve());
        }

        egui::TopBottomPanel::top("studio-top").show(ctx, |ui| {
            self.top_bar(ui, &mut requests);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            let mut panel_ctx = PanelCtx {
                state: &mut self.state,
                jobs: &self.jobs,
                flashes: &mut self.flashes,
                requests: &mut requests,
                now,
            };
            match self.tab {
                Tab::Games => self.games.ui(ui, &mut panel_ctx),
                Tab::Rooms => self.rooms.ui(ui, &mut panel_ctx),
                Tab::Entities => self.entities.ui(ui, &mut panel_ctx),
                Tab::Scripts => self.scripts.ui(ui, &mut panel_ctx),
                Tab::Conversations => self.conversations.ui(ui, &mut panel_ctx),
                Tab::Play => self.play.ui(ui, &mut panel_ctx),
                Tab::Files => self.files.ui(ui, &mut panel_ctx),
                Tab::Scores => self.scores.ui(ui, &mut panel_ctx),
                Tab::Admin => self.admin.ui(ui, &mut panel_ctx),
            }
        });

        {
            let mut panel_ctx = PanelCtx {
                state: &mut self.state,
                jobs: &self.jobs,
                flashes: &mut self.flashes,
                requests: &mut requests,
                now,
            };
            if let Some(theme) = self.prefs.ui(ctx, &mut panel_ctx) {
                self.set_theme(ctx, theme);
            }
        }

        self.flashes.show(ctx);

        if let Some(game_id) = requests.select_game {
            self.select_game(game_id);
        }
        if let Some(tab) = requests.switch_tab {
            self.tab = tab;
        }
        if requests.open_prefs {
            self.prefs.open(self.theme);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Preferences, Room, UserRole};

    fn app() -> StudioApp {
        StudioApp {
            state: EditorState::default(),
            jobs: Jobs::new(
                Arc::new(api::Client::new(api::DEFAULT_SERVER)),
                egui::Context::default(),
            ),
            flashes: Flashes::default(),
            tab: Tab::Games,
            theme: ThemePreference::System,
            games: Default::default(),
            rooms: Default::default(),
            entities: Default::default(),
            scripts: Default::default(),
            conversations: Default::default(),
            play: Default::default(),
            files: Default::default(),
            scores: Default::default(),
            admin: Default::default(),
            prefs: Default::default(),
        }
    }

    fn hal() -> Room {
        Room {
            id: 1,
            title: "Hal".into(),
            ..Default::default()
        }
    }

    #[test]
    fn a_failed_save_keeps_the_dirty_flag_and_the_cache() {
        let mut app = app();
        app.state.rooms = vec![hal()];
        app.state.has_unsaved_changes = true;

        app.apply(
            Msg::Failed {
                action: "kamer opslaan".into(),
                error: api::ApiError::Backend {
                    context: "PUT /api/rooms/1".into(),
                    status: 500,
                    message: "database is weg".into(),
                },
            },
            0.0,
        );

        assert!(app.state.has_unsaved_changes);
        assert_eq!(app.state.rooms[0].title, "Hal");
        assert_eq!(app.flashes.texts().len(), 1);
    }

    #[test]
    fn the_prefs_payload_carries_the_session_role() {
        let mut app = app();
        assert_eq!(app.state.user_role, UserRole::Guest);

        app.apply(
            Msg::PrefsLoaded(Preferences {
                theme: "dark".into(),
                role: UserRole::Admin,
            }),
            0.0,
        );

        assert_eq!(app.state.user_role, UserRole::Admin);
        assert_eq!(app.theme, ThemePreference::Dark);
    }

    #[test]
    fn a_confirmed_save_clears_the_dirty_flag_and_patches_the_cache() {
        let mut app = app();
        app.state.rooms = vec![hal()];
        app.state.has_unsaved_changes = true;

        let renamed = Room {
            title: "Grote hal".into(),
            ..hal()
        };
        app.apply(Msg::RoomSaved(renamed), 0.0);

        assert!(!app.state.has_unsaved_changes);
        assert_eq!(app.state.rooms[0].title, "Grote hal");
    }
}
