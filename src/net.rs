//! Background execution of backend calls.
//!
//! Every user action that talks to the server becomes one job: a closure run
//! on its own thread against the blocking [`api::Client`], whose outcome comes
//! back to the UI thread as a [`Msg`] over an mpsc channel. The frame loop
//! drains the channel and applies each message to the editor state, so all
//! cache mutation stays single-threaded.

use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;

use eframe::egui;
use log::error;
use parking_lot::Mutex;

use crate::api::{self, ApiError};
use crate::model::{
    AdminSettings, AdminStats, Connection, Conversation, Entity, FileEntry, Game, HighScore,
    PlayResponse, Preferences, Room, Script, User,
};

/// Confirmed backend results, applied to the editor state on the UI thread.
pub enum Msg {
    GamesLoaded(Vec<Game>),
    GameSaved(Game),
    GameDeleted(i64),
    GameExported { name: String, path: PathBuf },
    GameImported(Game),

    /// Everything scoped to a game, fetched in one go on selection.
    GameLoaded {
        game_id: i64,
        rooms: Vec<Room>,
        connections: Vec<Connection>,
        entities: Vec<Entity>,
        scripts: Vec<Script>,
        conversations: Vec<Conversation>,
    },

    RoomsLoaded(Vec<Room>),
    RoomDetail { room: Room, entities: Vec<Entity> },
    RoomCreated(Room),
    RoomSaved(Room),
    RoomDeleted(i64),
    RoomOrderSaved,
    RoomPositionSaved { room_id: i64, x: f64, y: f64 },

    ConnectionCreated(Connection),
    ConnectionUpdated(Connection),
    ConnectionDeleted(i64),

    EntitySaved(Entity),
    EntityDeleted(i64),

    ScriptSaved(Script),
    ScriptDeleted(i64),

    ConversationSaved(Conversation),
    ConversationDeleted(i64),

    Play { echo: Option<String>, response: PlayResponse },

    FilesLoaded { dir: String, entries: Vec<FileEntry> },
    HighScoresLoaded(Vec<HighScore>),

    AdminLoaded {
        stats: AdminStats,
        users: Vec<User>,
        settings: AdminSettings,
    },
    UserSaved(User),
    UserDeleted(i64),
    AdminSettingsSaved(AdminSettings),

    PrefsLoaded(Preferences),
    PrefsSaved(Preferences),

    Failed { action: String, error: ApiError },
}

/// A value fetched from the server, with its fetch lifecycle attached.
#[derive(Default)]
pub enum Remote<T> {
    #[default]
    Idle,
    Loading,
    Ready(T),
    Failed(String),
}

impl<T> Remote<T> {
    pub fn ready(&self) -> Option<&T> {
        match self {
            Remote::Ready(inner) => Some(inner),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Remote::Loading)
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, Remote::Idle)
    }
}

/// Spawns jobs and collects their results.
pub struct Jobs {
    api: Arc<api::Client>,
    tx: Sender<Msg>,
    rx: Receiver<Msg>,
    in_flight: Arc<Mutex<Vec<String>>>,
    ctx: egui::Context,
}

impl Jobs {
    pub fn new(api: Arc<api::Client>, ctx: egui::Context) -> Self {
        let (tx, rx) = channel();
        Self {
            api,
            tx,
            rx,
            in_flight: Arc::new(Mutex::new(Vec::new())),
            ctx,
        }
    }

    pub fn api(&self) -> &api::Client {
        &self.api
    }

    /// Run `job` on its own thread; its result (or failure) arrives via
    /// [`drain`]. `action` is the human-readable name shown while pending and
    /// used in failure flashes.
    pub fn spawn(
        &self,
        action: impl Into<String>,
        job: impl FnOnce(&api::Client) -> Result<Msg, ApiError> + Send + 'static,
    ) {
        let action = action.into();
        let api = self.api.clone();
        let tx = self.tx.clone();
        let in_flight = self.in_flight.clone();
        let ctx = self.ctx.clone();
        in_flight.lock().push(action.clone());

        std::thread::spawn(move || {
            let msg = match job(&api) {
                Ok(msg) => msg,
                Err(error) => {
                    error!("{action} failed: {error}");
                    Msg::Failed { action: action.clone(), error }
                }
            };
            {
                let mut pending = in_flight.lock();
                if let Some(idx) = pending.iter().position(|a| *a == action) {
                    pending.remove(idx);
                }
            }
            // The receiver only disappears on shutdown.
            let _ = tx.send(msg);
            ctx.request_repaint();
        });
    }

    /// All results that arrived since the last frame.
    pub fn drain(&self) -> Vec<Msg> {
        self.rx.try_iter().collect()
    }

    pub fn busy(&self) -> bool {
        !self.in_flight.lock().is_empty()
    }

    pub fn in_flight(&self) -> Vec<String> {
        self.in_flight.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_jobs_surface_as_messages() {
        let jobs = Jobs::new(
            Arc::new(api::Client::new("http://localhost:1")),
            egui::Context::default(),
        );
        jobs.spawn("testactie", |_| {
            Err(ApiError::MissingBody {
                context: "GET /api/games".into(),
            })
        });
        let msg = loop {
            let mut drained = jobs.drain();
            if let Some(msg) = drained.pop() {
                break msg;
            }
            std::thread::yield_now();
        };
        match msg {
            Msg::Failed { action, .. } => assert_eq!(action, "testactie"),
            _ => panic!("expected failure message"),
        }
        assert!(!jobs.busy());
    }

    #[test]
    fn successful_jobs_deliver_their_payload() {
        let jobs = Jobs::new(
            Arc::new(api::Client::new("http://localhost:1")),
            egui::Context::default(),
        );
        jobs.spawn("spellen laden", |_| Ok(Msg::GamesLoaded(Vec::new())));
        let msg = loop {
            if let Some(msg) = jobs.drain().pop() {
                break msg;
            }
            std::thread::yield_now();
        };
        assert!(matches!(msg, Msg::GamesLoaded(games) if games.is_empty()));
    }
}
