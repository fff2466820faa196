//! The Spelen tab: transcript, command input with history, the conversation
//! option list, and the win/loss overlays.

use eframe::egui::{self, Align, Key, Layout};

use crate::model::PlayResponse;
use crate::net::Msg;
use crate::widgets::Button;

use super::PanelCtx;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Speaker {
    Player,
    Game,
}

struct TranscriptEntry {
    speaker: Speaker,
    text: String,
}

#[derive(Default)]
pub struct PlayPanel {
    started: bool,
    transcript: Vec<TranscriptEntry>,
    input: String,
    history: Vec<String>,
    /// Index into `history` while browsing with Up/Down; `None` at the fresh
    /// input line.
    history_index: Option<usize>,
    score: Option<i64>,
    /// Last scene illustration the backend sent; stays up until replaced.
    scene_image: Option<String>,
    conversation: Option<PlayResponse>,
    ended: Option<PlayResponse>,
    scroll_to_bottom: bool,
}

impl PlayPanel {
    /// Reset local session state, e.g. when another game is selected.
    pub fn reset(&mut self) {
        *self = PlayPanel::default();
    }

    /// Fold a play response into the transcript and overlay state.
    pub fn apply(&mut self, echo: Option<String>, response: &PlayResponse) {
        self.started = true;
        if let Some(echo) = echo {
            self.transcript.push(TranscriptEntry {
                speaker: Speaker::Player,
                text: echo,
            });
        }
        if !response.message.is_empty() {
            self.transcript.push(TranscriptEntry {
                speaker: Speaker::Game,
                text: response.message.clone(),
            });
        }
        if let Some(points) = response.points_awarded {
            if points != 0 {
                self.transcript.push(TranscriptEntry {
                    speaker: Speaker::Game,
                    text: format!("(+{points} punten)"),
                });
            }
        }
        if response.current_score.is_some() {
            self.score = response.current_score;
        }
        if let Some(path) = &response.image_path {
            self.scene_image = Some(path.clone());
        }
        self.conversation = response.in_conversation.then(|| response.clone());
        if response.game_won || response.game_loss {
            self.conversation = None;
            self.ended = Some(response.clone());
        }
        self.scroll_to_bottom = true;
    }

    pub fn ui(&mut self, ui: &mut egui::Ui, ctx: &mut PanelCtx) {
        let Some(game_id) = ctx.state.selected_game_id else {
            ui.weak("Selecteer eerst een spel.");
            return;
        };

        if !self.started {
            self.start_overlay(ui, ctx, game_id);
            return;
        }
        if self.ended.is_some() {
            self.end_overlay(ui, ctx, game_id);
            return;
        }

        ui.horizontal(|ui| {
            ui.heading("Spelen");
            if let Some(score) = self.score {
                ui.label(format!("Score: {score}"));
            }
            ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                if ui.add(Button::new("Reset").small()).clicked() {
                    self.reset_game(ctx, game_id);
                }
                if ui.add(Button::new("Laad").small()).clicked() {
                    ctx.jobs.spawn("spel laden", move |api| {
                        api.play_load(game_id).map(|response| Msg::Play {
                            echo: None,
                            response,
                        })
                    });
                }
                if ui.add(Button::new("Bewaar").small()).clicked() {
                    ctx.jobs.spawn("spel bewaren", move |api| {
                        api.play_save(game_id).map(|response| Msg::Play {
                            echo: None,
                            response,
                        })
                    });
                }
            });
        });
        ui.separator();

        if let Some(path) = self.scene_image.clone() {
            show_image(ui, ctx, &path, 160.0);
            ui.separator();
        }

        egui::TopBottomPanel::bottom("play-input")
            .show_inside(ui, |ui| self.input_row(ui, ctx, game_id));

        let mut scroll = egui::ScrollArea::vertical().auto_shrink(false);
        if self.scroll_to_bottom {
            scroll = scroll.stick_to_bottom(true);
            self.scroll_to_bottom = false;
        }
        scroll.show(ui, |ui| {
            for entry in &self.transcript {
                match entry.speaker {
                    Speaker::Player => {
                        ui.strong(format!("> {}", entry.text));
                    }
                    Speaker::Game => {
                        ui.label(&entry.text);
                    }
                }
                ui.add_space(4.0);
            }

            if let Some(convo) = self.conversation.clone() {
                if let Some(path) = &convo.entity_image_path {
                    show_image(ui, ctx, path, 120.0);
                }
                if let Some(npc) = &convo.npc_name {
                    ui.strong(npc);
                }
                for (i, option) in convo.options.iter().enumerate() {
                    if ui
                        .add(Button::new(format!("{}. {}", i + 1, option.text)).small())
                        .clicked()
                    {
                        self.send(ctx, game_id, (i + 1).to_string());
                    }
                }
            }
        });
    }

    fn input_row(&mut self, ui: &mut egui::Ui, ctx: &mut PanelCtx, game_id: i64) {
        ui.add_space(4.0);
        ui.horizontal(|ui| {
            let response = ui.add(
                egui::TextEdit::singleline(&mut self.input)
                    .hint_text("Typ een commando...")
                    .desired_width(ui.available_width() - 80.0),
            );

            if response.has_focus() {
                // Up/Down walk the command history like a terminal.
                if ui.input(|i| i.key_pressed(Key::ArrowUp)) {
                    self.history_back();
                }
                if ui.input(|i| i.key_pressed(Key::ArrowDown)) {
                    self.history_forward();
                }
            }

            let submitted =
                response.lost_focus() && ui.input(|i| i.key_pressed(Key::Enter));
            if submitted || ui.add(Button::new("Stuur").small()).clicked() {
                let command = self.input.trim().to_owned();
                if !command.is_empty() {
                    self.history.push(command.clone());
                    self.history_index = None;
                    self.input.clear();
                    self.send(ctx, game_id, command);
                    response.request_focus();
                }
            }
        });
        ui.add_space(4.0);
    }

    fn history_back(&mut self) {
        if self.history.is_empty() {
            return;
        }
        let next = match self.history_index {
            None => self.history.len() - 1,
            Some(0) => 0,
            Some(i) => i - 1,
        };
        self.history_index = Some(next);
        self.input = self.history[next].clone();
    }

    fn history_forward(&mut self) {
        match self.history_index {
            Some(i) if i + 1 < self.history.len() => {
                self.history_index = Some(i + 1);
                self.input = self.history[i + 1].clone();
            }
            Some(_) => {
                self.history_index = None;
                self.input.clear();
            }
            None => {}
        }
    }

    fn send(&mut self, ctx: &mut PanelCtx, game_id: i64, command: String) {
        ctx.jobs.spawn("commando versturen", move |api| {
            let echo = Some(command.clone());
            api.play_command(game_id, &command)
                .map(|response| Msg::Play { echo, response })
        });
    }

    fn reset_game(&mut self, ctx: &mut PanelCtx, game_id: i64) {
        self.transcript.clear();
        self.conversation = None;
        self.ended = None;
        self.score = None;
        self.scene_image = None;
        ctx.jobs.spawn("spel resetten", move |api| {
            api.play_reset(game_id).map(|response| Msg::Play {
                echo: None,
                response,
            })
        });
    }

    fn start_overlay(&mut self, ui: &mut egui::Ui, ctx: &mut PanelCtx, game_id: i64) {
        let game = ctx.state.selected_game().cloned();
        ui.vertical_centered(|ui| {
            ui.add_space(48.0);
            if let Some(game) = &game {
                ui.heading(&game.name);
                if let Some(path) = &game.start_image_path {
                    show_image(ui, ctx, path, 240.0);
                }
                if let Some(description) = &game.description {
                    ui.label(description);
                }
                ui.add_space(16.0);
                if ui.add(Button::new("Start avontuur")).clicked() {
                    self.reset_game(ctx, game_id);
                }
                if game.has_saved_game && ui.add(Button::new("Laad opgeslagen spel")).clicked() {
                    self.started = true;
                    ctx.jobs.spawn("spel laden", move |api| {
                        api.play_load(game_id).map(|response| Msg::Play {
                            echo: None,
                            response,
                        })
                    });
                }
            }
        });
    }

    fn end_overlay(&mut self, ui: &mut egui::Ui, ctx: &mut PanelCtx, game_id: i64) {
        let Some(ended) = self.ended.clone() else {
            return;
        };
        ui.vertical_centered(|ui| {
            ui.add_space(48.0);
            if ended.game_won {
                ui.heading("Gewonnen!");
                if let Some(path) = &ended.win_image_path {
                    show_image(ui, ctx, path, 240.0);
                }
            } else {
                ui.heading("Verloren");
                if let Some(path) = &ended.loss_image_path {
                    show_image(ui, ctx, path, 240.0);
                }
                if let Some(reason) = &ended.loss_reason {
                    ui.label(reason);
                }
            }
            if !ended.message.is_empty() {
                ui.label(&ended.message);
            }
            if let Some(score) = self.score {
                ui.label(format!("Eindscore: {score}"));
            }
            ui.add_space(16.0);
            if ui.add(Button::new("Speel opnieuw")).clicked() {
                self.reset_game(ctx, game_id);
            }
        });
    }
}

/// Illustrations are served by the backend as plain files; egui's http image
/// loader fetches and caches them by URL.
fn show_image(ui: &mut egui::Ui, ctx: &PanelCtx, path: &str, max_height: f32) {
    let url = ctx.jobs.api().file_url(path);
    ui.add(egui::Image::new(url).max_height(max_height).corner_radius(4.0));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(message: &str) -> PlayResponse {
        PlayResponse {
            message: message.into(),
            ..PlayResponse::default()
        }
    }

    #[test]
    fn apply_echoes_player_command_before_reply() {
        let mut panel = PlayPanel::default();
        panel.apply(Some("kijk rond".into()), &response("Je staat in een bos."));
        let texts: Vec<&str> = panel.transcript.iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, vec!["kijk rond", "Je staat in een bos."]);
        assert_eq!(panel.transcript[0].speaker, Speaker::Player);
    }

    #[test]
    fn apply_tracks_score_and_conversation() {
        let mut panel = PlayPanel::default();
        let mut reply = response("Hallo daar.");
        reply.current_score = Some(10);
        reply.in_conversation = true;
        panel.apply(None, &reply);
        assert_eq!(panel.score, Some(10));
        assert!(panel.conversation.is_some());

        // Leaving the conversation clears the option list.
        panel.apply(None, &response("Tot ziens."));
        assert!(panel.conversation.is_none());
    }

    #[test]
    fn apply_keeps_the_latest_scene_image() {
        let mut panel = PlayPanel::default();
        let mut reply = response("Je betreedt de kelder.");
        reply.image_path = Some("uploads/kelder.png".into());
        panel.apply(None, &reply);
        assert_eq!(panel.scene_image.as_deref(), Some("uploads/kelder.png"));

        // A reply without an illustration keeps the current one on screen.
        panel.apply(None, &response("Je ziet niets bijzonders."));
        assert_eq!(panel.scene_image.as_deref(), Some("uploads/kelder.png"));
    }

    #[test]
    fn won_game_switches_to_end_overlay() {
        let mut panel = PlayPanel::default();
        let mut reply = response("Je hebt de schat gevonden!");
        reply.game_won = true;
        panel.apply(None, &reply);
        assert!(panel.ended.is_some());
        assert!(panel.conversation.is_none());
    }

    #[test]
    fn history_walks_back_and_forward() {
        let mut panel = PlayPanel::default();
        panel.history = vec!["kijk".into(), "noord".into()];
        panel.history_back();
        assert_eq!(panel.input, "noord");
        panel.history_back();
        assert_eq!(panel.input, "kijk");
        panel.history_forward();
        assert_eq!(panel.input, "noord");
        panel.history_forward();
        assert_eq!(panel.input, "");
        assert_eq!(panel.history_index, None);
    }
}
