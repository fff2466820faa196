//! The Spellen tab: game library grid plus the settings modal.

use eframe::egui;
use log::warn;

use crate::api::GameDraft;
use crate::model::Game;
use crate::net::Msg;
use crate::ui::{confirm_modal, ConfirmOutcome};
use crate::widgets::Button;

use super::{PanelCtx, Tab};

/// Settings modal state; `id` is `None` in create mode.
struct GameForm {
    id: Option<i64>,
    name: String,
    description: String,
    start_image_path: String,
    win_image_path: String,
}

impl GameForm {
    fn create() -> Self {
        Self {
            id: None,
            name: String::new(),
            description: String::new(),
            start_image_path: String::new(),
            win_image_path: String::new(),
        }
    }

    fn edit(game: &Game) -> Self {
        Self {
            id: Some(game.id),
            name: game.name.clone(),
            description: game.description.clone().unwrap_or_default(),
            start_image_path: game.start_image_path.clone().unwrap_or_default(),
            win_image_path: game.win_image_path.clone().unwrap_or_default(),
        }
    }

    fn draft(&self) -> GameDraft {
        let opt = |s: &String| {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_owned())
        };
        GameDraft {
            name: self.name.trim().to_owned(),
            description: opt(&self.description),
            start_image_path: opt(&self.start_image_path),
            win_image_path: opt(&self.win_image_path),
        }
    }
}

#[derive(Default)]
pub struct GamesPanel {
    form: Option<GameForm>,
    pending_delete: Option<Game>,
}

impl GamesPanel {
    pub fn ui(&mut self, ui: &mut egui::Ui, ctx: &mut PanelCtx) {
        ui.horizontal(|ui| {
            ui.heading("Spellen");
            if ui.add(Button::new("Nieuw spel")).clicked() {
                self.form = Some(GameForm::create());
            }
            if ui.add(Button::new("Importeer")).clicked() {
                self.import(ctx);
            }
        });
        ui.separator();

        let games = ctx.state.games.clone();
        if games.is_empty() {
            ui.weak("Nog geen spellen. Maak er een met 'Nieuw spel'.");
        }

        egui::ScrollArea::vertical().auto_shrink(false).show(ui, |ui| {
            egui::Grid::new("games-grid")
                .num_columns(2)
                .spacing([16.0, 16.0])
                .show(ui, |ui| {
                    for (i, game) in games.iter().enumerate() {
                        self.game_card(ui, ctx, game);
                        if i % 2 == 1 {
                            ui.end_row();
                        }
                    }
                });
        });

        self.settings_modal(ui.ctx(), ctx);
        self.delete_modal(ui.ctx(), ctx);
    }

    fn game_card(&mut self, ui: &mut egui::Ui, ctx: &mut PanelCtx, game: &Game) {
        egui::Frame::group(ui.style()).show(ui, |ui| {
            ui.set_min_width(260.0);
            ui.vertical(|ui| {
                ui.horizontal(|ui| {
                    ui.strong(&game.name);
                    if game.has_saved_game {
                        ui.weak("(opgeslagen spel)");
                    }
                });
                if let Some(description) = &game.description {
                    ui.label(description);
                }
                ui.horizontal(|ui| {
                    if ui.add(Button::new("Speel").small()).clicked() {
                        ctx.requests.select_game = Some(game.id);
                        ctx.requests.switch_tab = Some(Tab::Play);
                    }
                    if ui.add(Button::new("Bewerk").small()).clicked() {
                        ctx.requests.select_game = Some(game.id);
                        ctx.requests.switch_tab = Some(Tab::Rooms);
                    }
                    if ui.add(Button::new("Instellingen").small()).clicked() {
                        self.form = Some(GameForm::edit(game));
                    }
                    if ui.add(Button::new("Exporteer").small()).clicked() {
                        self.export(ctx, game);
                    }
                    if ui.add(Button::new("Verwijder").small()).clicked() {
                        self.pending_delete = Some(game.clone());
                    }
                });
            });
        });
    }

    fn settings_modal(&mut self, egui_ctx: &egui::Context, ctx: &mut PanelCtx) {
        let Some(form) = &mut self.form else { return };
        let mut close = false;
        let mut save = false;
        let creating = form.id.is_none();

        let response = egui::Modal::new(egui::Id::new("game-settings")).show(egui_ctx, |ui| {
            ui.set_max_width(420.0);
            ui.heading(if creating {
                "Nieuw spel"
            } else {
                "Spelinstellingen"
            });
            egui::Grid::new("game-settings-grid")
                .num_columns(2)
                .show(ui, |ui| {
                    ui.label("Naam");
                    ui.text_edit_singleline(&mut form.name);
                    ui.end_row();
                    ui.label("Beschrijving");
                    ui.text_edit_multiline(&mut form.description);
                    ui.end_row();
                    ui.label("Startafbeelding");
                    ui.text_edit_singleline(&mut form.start_image_path);
                    ui.end_row();
                    ui.label("Winafbeelding");
                    ui.text_edit_singleline(&mut form.win_image_path);
                    ui.end_row();
                });
            ui.horizontal(|ui| {
                if ui.add(Button::new("Opslaan")).clicked() {
                    save = true;
                }
                if ui.add(Button::new("Annuleren")).clicked() {
                    close = true;
                }
            });
        });

        if save {
            if form.name.trim().is_empty() {
                ctx.flashes.warn("Naam is verplicht.", ctx.now);
            } else {
                let draft = form.draft();
                match form.id {
                    None => ctx.jobs.spawn("spel aanmaken", move |api| {
                        api.create_game(&draft).map(Msg::GameSaved)
                    }),
                    Some(id) => ctx.jobs.spawn("spel opslaan", move |api| {
                        api.update_game(id, &draft).map(Msg::GameSaved)
                    }),
                }
                close = true;
            }
        }
        if close || response.should_close() {
            self.form = None;
        }
    }

    fn delete_modal(&mut self, egui_ctx: &egui::Context, ctx: &mut PanelCtx) {
        let Some(game) = &self.pending_delete else {
            return;
        };
        let body = format!(
            "Weet je zeker dat je '{}' wilt verwijderen? Dit verwijdert ook alle kamers, entiteiten en scripts.",
            game.name
        );
        match confirm_modal(egui_ctx, "delete-game", "Spel verwijderen", &body, "Verwijder") {
            ConfirmOutcome::Confirmed => {
                let id = game.id;
                ctx.jobs.spawn("spel verwijderen", move |api| {
                    api.delete_game(id).map(|_| Msg::GameDeleted(id))
                });
                self.pending_delete = None;
            }
            ConfirmOutcome::Cancelled => self.pending_delete = None,
            ConfirmOutcome::Open => {}
        }
    }

    fn export(&self, ctx: &mut PanelCtx, game: &Game) {
        let Some(path) = rfd::FileDialog::new()
            .set_file_name(format!("{}.json", game.name))
            .save_file()
        else {
            return;
        };
        let id = game.id;
        let name = game.name.clone();
        ctx.jobs.spawn("spel exporteren", move |api| {
            let archive = api.export_game(id)?;
            std::fs::write(&path, archive).map_err(|source| crate::api::ApiError::Io {
                context: format!("schrijven naar {}", path.display()),
                source,
            })?;
            Ok(Msg::GameExported { name, path })
        });
    }

    fn import(&self, ctx: &mut PanelCtx) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("JSON", &["json"])
            .pick_file()
        else {
            warn!("import cancelled: no file chosen");
            return;
        };
        ctx.jobs.spawn("spel importeren", move |api| {
            api.import_game(&path).map(Msg::GameImported)
        });
    }
}
