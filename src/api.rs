//! Blocking REST client for the authoring backend.
//!
//! Every call funnels through [`Client::exchange`], which implements the
//! shared response contract: HTTP 204 means "no content", any non-2xx status
//! carries a JSON `{error}` body (or nothing, in which case we synthesize an
//! `HTTP <status>` message). Callers never retry; a failed call is terminal
//! for that user action.

use std::path::Path;
use std::time::Duration;

use log::debug;
use reqwest::blocking::multipart;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use crate::model::{
    AdminSettings, AdminStats, Connection, Conversation, Entity, FileEntry, Game, HighScore,
    PlayResponse, Preferences, Room, Script, User,
};

pub const DEFAULT_SERVER: &str = "http://127.0.0.1:5000";

#[derive(Debug, Error)]
pub enum ApiError {
    /// The server answered with a non-2xx status.
    #[error("{context}: {message}")]
    Backend {
        context: String,
        status: u16,
        message: String,
    },
    /// The request never completed, or the body failed to decode.
    #[error("{context}: {source}")]
    Transport {
        context: String,
        #[source]
        source: reqwest::Error,
    },
    /// A 2xx response arrived without the body the caller needs.
    #[error("{context}: response had no body")]
    MissingBody { context: String },
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl ApiError {
    /// Short text for the flash overlay.
    pub fn flash_text(&self) -> String {
        match self {
            ApiError::Backend { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

type ApiResult<T> = Result<T, ApiError>;

/// Partial game payload; absent fields are left untouched by the server.
#[derive(Clone, Debug, Default, Serialize)]
pub struct GameDraft {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_image_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub win_image_path: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct UserDraft {
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    pub role: String,
}

pub struct Client {
    base: String,
    http: reqwest::blocking::Client,
}

impl Client {
    pub fn new(base: impl Into<String>) -> Self {
        // A client without the cookie store has no session; fail at startup.
        let http = reqwest::blocking::Client::builder()
            .cookie_store(true)
            .timeout(Duration::from_secs(30))
            .build()
            .expect("failed to build HTTP client");
        Self {
            base: base.into().trim_end_matches('/').to_owned(),
            http,
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// Absolute URL for a server-side file path such as `uploads/kaart.png`.
    pub fn file_url(&self, path: &str) -> String {
        format!("{}/{}", self.base, path.trim_start_matches('/'))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    /// One round-trip with the shared response contract applied.
    fn exchange<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> ApiResult<Option<T>> {
        let context = format!("{method} {path}");
        debug!("{context}");
        let mut request = self.http.request(method, self.url(path));
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request.send().map_err(|source| ApiError::Transport {
            context: context.clone(),
            source,
        })?;
        let status = response.status();
        if status == reqwest::StatusCode::NO_CONTENT {
            return Ok(None);
        }
        if !status.is_success() {
            let message = response
                .json::<serde_json::Value>()
                .ok()
                .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_owned))
                .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
            return Err(ApiError::Backend {
                context,
                status: status.as_u16(),
                message,
            });
        }
        response
            .json::<T>()
            .map(Some)
            .map_err(|source| ApiError::Transport { context, source })
    }

    /// Like [`exchange`], for endpoints whose success body we need.
    fn fetch<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> ApiResult<T> {
        let context = format!("{method} {path}");
        self.exchange(method, path, body)?
            .ok_or(ApiError::MissingBody { context })
    }

    /// Fire-and-forget mutation; 204 and JSON bodies are both fine.
    fn mutate(&self, method: Method, path: &str, body: Option<serde_json::Value>) -> ApiResult<()> {
        self.exchange::<serde_json::Value>(method, path, body)
            .map(|_| ())
    }

    // --- games -----------------------------------------------------------

    pub fn games(&self) -> ApiResult<Vec<Game>> {
        self.fetch(Method::GET, "/api/games", None)
    }

    pub fn create_game(&self, draft: &GameDraft) -> ApiResult<Game> {
        self.fetch(Method::POST, "/api/games", Some(json!(draft)))
    }

    pub fn update_game(&self, id: i64, draft: &GameDraft) -> ApiResult<Game> {
        self.fetch(Method::PUT, &format!("/api/games/{id}"), Some(json!(draft)))
    }

    pub fn delete_game(&self, id: i64) -> ApiResult<()> {
        self.mutate(Method::DELETE, &format!("/api/games/{id}"), None)
    }

    /// Raw JSON archive of the whole game, for saving to disk.
    pub fn export_game(&self, id: i64) -> ApiResult<Vec<u8>> {
        let path = format!("/api/games/{id}/export");
        let context = format!("GET {path}");
        let response = self
            .http
            .get(self.url(&path))
            .send()
            .map_err(|source| ApiError::Transport {
                context: context.clone(),
                source,
            })?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Backend {
                context,
                status: status.as_u16(),
                message: format!("HTTP {}", status.as_u16()),
            });
        }
        response
            .bytes()
            .map(|b| b.to_vec())
            .map_err(|source| ApiError::Transport { context, source })
    }

    pub fn import_game(&self, archive: &Path) -> ApiResult<Game> {
        let context = "POST /api/games/import".to_owned();
        let form = multipart::Form::new()
            .file("file", archive)
            .map_err(|source| ApiError::Io {
                context: context.clone(),
                source,
            })?;
        let response = self
            .http
            .post(self.url("/api/games/import"))
            .multipart(form)
            .send()
            .map_err(|source| ApiError::Transport {
                context: context.clone(),
                source,
            })?;
        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<serde_json::Value>()
                .ok()
                .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_owned))
                .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
            return Err(ApiError::Backend {
                context,
                status: status.as_u16(),
                message,
            });
        }
        response
            .json()
            .map_err(|source| ApiError::Transport { context, source })
    }

    // --- rooms -----------------------------------------------------------

    pub fn rooms(&self, game_id: i64) -> ApiResult<Vec<Room>> {
        self.fetch(Method::GET, &format!("/api/games/{game_id}/rooms"), None)
    }

    pub fn room(&self, id: i64) -> ApiResult<Room> {
        self.fetch(Method::GET, &format!("/api/rooms/{id}"), None)
    }

    pub fn create_room(&self, game_id: i64, fields: serde_json::Value) -> ApiResult<Room> {
        self.fetch(
            Method::POST,
            &format!("/api/games/{game_id}/rooms"),
            Some(fields),
        )
    }

    pub fn update_room(&self, id: i64, fields: serde_json::Value) -> ApiResult<Room> {
        self.fetch(Method::PUT, &format!("/api/rooms/{id}"), Some(fields))
    }

    pub fn delete_room(&self, id: i64) -> ApiResult<()> {
        self.mutate(Method::DELETE, &format!("/api/rooms/{id}"), None)
    }

    pub fn set_room_order(&self, game_id: i64, room_ids: &[i64]) -> ApiResult<()> {
        self.mutate(
            Method::PUT,
            &format!("/api/games/{game_id}/rooms/order"),
            Some(json!({ "room_ids": room_ids })),
        )
    }

    // --- connections -----------------------------------------------------

    pub fn connections(&self, game_id: i64) -> ApiResult<Vec<Connection>> {
        self.fetch(
            Method::GET,
            &format!("/api/games/{game_id}/connections"),
            None,
        )
    }

    pub fn create_connection(
        &self,
        from_room_id: i64,
        to_room_id: i64,
        direction: &str,
    ) -> ApiResult<Connection> {
        self.fetch(
            Method::POST,
            &format!("/api/rooms/{from_room_id}/connections"),
            Some(json!({ "to_room_id": to_room_id, "direction": direction })),
        )
    }

    pub fn update_connection(&self, id: i64, direction: &str) -> ApiResult<Connection> {
        self.fetch(
            Method::PUT,
            &format!("/api/connections/{id}"),
            Some(json!({ "direction": direction })),
        )
    }

    pub fn delete_connection(&self, id: i64) -> ApiResult<()> {
        self.mutate(Method::DELETE, &format!("/api/connections/{id}"), None)
    }

    // --- entities --------------------------------------------------------

    pub fn entities(&self, game_id: i64) -> ApiResult<Vec<Entity>> {
        self.fetch(Method::GET, &format!("/api/games/{game_id}/entities"), None)
    }

    pub fn room_entities(&self, room_id: i64) -> ApiResult<Vec<Entity>> {
        self.fetch(Method::GET, &format!("/api/rooms/{room_id}/entities"), None)
    }

    pub fn entity(&self, id: i64) -> ApiResult<Entity> {
        self.fetch(Method::GET, &format!("/api/entities/{id}"), None)
    }

    pub fn create_entity(&self, game_id: i64, fields: serde_json::Value) -> ApiResult<Entity> {
        self.fetch(
            Method::POST,
            &format!("/api/games/{game_id}/entities"),
            Some(fields),
        )
    }

    pub fn update_entity(&self, id: i64, fields: serde_json::Value) -> ApiResult<Entity> {
        self.fetch(Method::PUT, &format!("/api/entities/{id}"), Some(fields))
    }

    pub fn delete_entity(&self, id: i64) -> ApiResult<()> {
        self.mutate(Method::DELETE, &format!("/api/entities/{id}"), None)
    }

    // --- scripts ---------------------------------------------------------

    pub fn scripts(&self, game_id: i64) -> ApiResult<Vec<Script>> {
        self.fetch(Method::GET, &format!("/api/games/{game_id}/scripts"), None)
    }

    pub fn create_script(&self, game_id: i64, trigger: &str, body: &str) -> ApiResult<Script> {
        self.fetch(
            Method::POST,
            &format!("/api/games/{game_id}/scripts"),
            Some(json!({ "trigger": trigger, "script": body })),
        )
    }

    pub fn update_script(&self, id: i64, trigger: &str, body: &str) -> ApiResult<Script> {
        self.fetch(
            Method::PUT,
            &format!("/api/scripts/{id}"),
            Some(json!({ "trigger": trigger, "script": body })),
        )
    }

    pub fn delete_script(&self, id: i64) -> ApiResult<()> {
        self.mutate(Method::DELETE, &format!("/api/scripts/{id}"), None)
    }

    // --- conversations ---------------------------------------------------

    pub fn conversations(&self, game_id: i64) -> ApiResult<Vec<Conversation>> {
        self.fetch(
            Method::GET,
            &format!("/api/games/{game_id}/conversations"),
            None,
        )
    }

    pub fn create_conversation(
        &self,
        game_id: i64,
        name: &str,
        structure: serde_json::Value,
    ) -> ApiResult<Conversation> {
        self.fetch(
            Method::POST,
            &format!("/api/games/{game_id}/conversations"),
            Some(json!({ "name": name, "structure": structure })),
        )
    }

    pub fn update_conversation(
        &self,
        id: i64,
        name: &str,
        structure: serde_json::Value,
    ) -> ApiResult<Conversation> {
        self.fetch(
            Method::PUT,
            &format!("/api/conversations/{id}"),
            Some(json!({ "name": name, "structure": structure })),
        )
    }

    pub fn delete_conversation(&self, id: i64) -> ApiResult<()> {
        self.mutate(Method::DELETE, &format!("/api/conversations/{id}"), None)
    }

    // --- play mode -------------------------------------------------------

    pub fn play_command(&self, game_id: i64, command: &str) -> ApiResult<PlayResponse> {
        self.fetch(
            Method::POST,
            &format!("/api/games/{game_id}/play/command"),
            Some(json!({ "command": command })),
        )
    }

    pub fn play_save(&self, game_id: i64) -> ApiResult<PlayResponse> {
        self.fetch(
            Method::POST,
            &format!("/api/games/{game_id}/play/save"),
            None,
        )
    }

    pub fn play_load(&self, game_id: i64) -> ApiResult<PlayResponse> {
        self.fetch(Method::GET, &format!("/api/games/{game_id}/play/load"), None)
    }

    pub fn play_reset(&self, game_id: i64) -> ApiResult<PlayResponse> {
        self.fetch(
            Method::POST,
            &format!("/api/games/{game_id}/play/reset"),
            None,
        )
    }

    // --- files -----------------------------------------------------------

    pub fn files(&self, dir: &str) -> ApiResult<Vec<FileEntry>> {
        let encoded = encode_path(dir);
        self.fetch(Method::GET, &format!("/api/files?path={encoded}"), None)
    }

    pub fn upload_file(&self, dir: &str, file: &Path) -> ApiResult<()> {
        let context = "POST /api/files/upload".to_owned();
        let form = multipart::Form::new()
            .text("path", dir.to_owned())
            .file("file", file)
            .map_err(|source| ApiError::Io {
                context: context.clone(),
                source,
            })?;
        let response = self
            .http
            .post(self.url("/api/files/upload"))
            .multipart(form)
            .send()
            .map_err(|source| ApiError::Transport {
                context: context.clone(),
                source,
            })?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let message = response
                .json::<serde_json::Value>()
                .ok()
                .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_owned))
                .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
            Err(ApiError::Backend {
                context,
                status: status.as_u16(),
                message,
            })
        }
    }

    pub fn rename_file(&self, old_path: &str, new_name: &str) -> ApiResult<()> {
        self.mutate(
            Method::PUT,
            "/api/files/rename",
            Some(json!({ "old_path": old_path, "new_name": new_name })),
        )
    }

    pub fn create_folder(&self, dir: &str, name: &str) -> ApiResult<()> {
        self.mutate(
            Method::POST,
            "/api/files/folder",
            Some(json!({ "path": dir, "folder_name": name })),
        )
    }

    pub fn delete_file(&self, path: &str) -> ApiResult<()> {
        let encoded = encode_path(path);
        self.mutate(Method::DELETE, &format!("/api/files/{encoded}"), None)
    }

    // --- high scores, admin, preferences ---------------------------------

    pub fn highscores(&self) -> ApiResult<Vec<HighScore>> {
        self.fetch(Method::GET, "/api/highscores", None)
    }

    pub fn admin_stats(&self) -> ApiResult<AdminStats> {
        self.fetch(Method::GET, "/api/admin/stats", None)
    }

    pub fn admin_users(&self) -> ApiResult<Vec<User>> {
        self.fetch(Method::GET, "/api/admin/users", None)
    }

    pub fn admin_create_user(&self, draft: &UserDraft) -> ApiResult<User> {
        self.fetch(Method::POST, "/api/admin/users", Some(json!(draft)))
    }

    pub fn admin_update_user(&self, id: i64, draft: &UserDraft) -> ApiResult<User> {
        self.fetch(
            Method::PUT,
            &format!("/api/admin/users/{id}"),
            Some(json!(draft)),
        )
    }

    pub fn admin_delete_user(&self, id: i64) -> ApiResult<()> {
        self.mutate(Method::DELETE, &format!("/api/admin/users/{id}"), None)
    }

    pub fn admin_settings(&self) -> ApiResult<AdminSettings> {
        self.fetch(Method::GET, "/api/admin/settings", None)
    }

    pub fn admin_update_settings(&self, settings: &AdminSettings) -> ApiResult<()> {
        self.mutate(Method::PUT, "/api/admin/settings", Some(json!(settings)))
    }

    pub fn preferences(&self) -> ApiResult<Preferences> {
        self.fetch(Method::GET, "/api/prefs/me", None)
    }

    pub fn update_preferences(&self, prefs: &Preferences) -> ApiResult<()> {
        self.mutate(Method::PUT, "/api/prefs/me", Some(json!(prefs)))
    }
}

/// Percent-encode a path, keeping directory separators intact.
fn encode_path(raw: &str) -> String {
    raw.split('/')
        .map(|part| urlencoding::encode(part).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("afbeeldingen/kamers", "afbeeldingen/kamers")]
    #[case("mijn map", "mijn%20map")]
    #[case("kaart&plan?.png", "kaart%26plan%3F.png")]
    fn path_components_are_encoded_but_separators_survive(
        #[case] raw: &str,
        #[case] expected: &str,
    ) {
        assert_eq!(encode_path(raw), expected);
    }

    #[test]
    fn file_urls_join_base_and_path_once() {
        let client = Client::new("http://localhost:5000/");
        assert_eq!(
            client.file_url("/uploads/kaart.png"),
            "http://localhost:5000/uploads/kaart.png"
        );
        assert_eq!(
            client.file_url("uploads/kaart.png"),
            "http://localhost:5000/uploads/kaart.png"
        );
    }

    #[test]
    fn backend_errors_flash_their_message() {
        let err = ApiError::Backend {
            context: "PUT /api/rooms/3".into(),
            status: 409,
            message: "Direction already in use".into(),
        };
        assert_eq!(err.flash_text(), "Direction already in use");
        assert_eq!(err.to_string(), "PUT /api/rooms/3: Direction already in use");
    }

    #[test]
    fn missing_body_is_its_own_error() {
        let err = ApiError::MissingBody {
            context: "GET /api/games".into(),
        };
        assert!(err.to_string().contains("no body"));
    }

    #[test]
    fn drafts_skip_absent_fields() {
        let draft = GameDraft {
            name: "Kasteel".into(),
            ..Default::default()
        };
        let value = serde_json::to_value(&draft).unwrap();
        assert_eq!(value, serde_json::json!({ "name": "Kasteel" }));
    }
}
