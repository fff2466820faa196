//! The Scripts tab: trigger list plus a plain-text script editor with
//! insertion helpers for room and entity names.

use eframe::egui;

use crate::net::Msg;
use crate::ui::{confirm_modal, ConfirmOutcome};
use crate::widgets::Button;

use super::PanelCtx;

#[derive(Default)]
struct ScriptForm {
    loaded_for: Option<i64>,
    trigger: String,
    body: String,
}

#[derive(Default)]
pub struct ScriptsPanel {
    form: ScriptForm,
    pending_delete: Option<(i64, String)>,
}

impl ScriptsPanel {
    pub fn ui(&mut self, ui: &mut egui::Ui, ctx: &mut PanelCtx) {
        if ctx.state.selected_game_id.is_none() {
            ui.weak("Selecteer eerst een spel.");
            return;
        }

        ui.horizontal(|ui| {
            ui.heading("Scripts");
            if ui.add(Button::new("Nieuw script").small()).clicked() {
                self.create(ctx);
            }
        });
        ui.separator();

        egui::SidePanel::left("script-list")
            .resizable(true)
            .default_width(240.0)
            .show_inside(ui, |ui| {
                egui::ScrollArea::vertical().auto_shrink(false).show(ui, |ui| {
                    let scripts: Vec<(i64, String)> = ctx
                        .state
                        .scripts
                        .iter()
                        .map(|s| (s.id, s.trigger.clone()))
                        .collect();
                    for (id, trigger) in scripts {
                        let selected = ctx.state.selected_script_id == Some(id);
                        if ui.selectable_label(selected, &trigger).clicked() {
                            ctx.state.selected_script_id = Some(id);
                        }
                    }
                });
            });

        self.editor(ui, ctx);
        self.delete_modal(ui.ctx(), ctx);
    }

    fn create(&mut self, ctx: &mut PanelCtx) {
        let Some(game_id) = ctx.state.selected_game_id else {
            return;
        };
        ctx.jobs.spawn("script aanmaken", move |api| {
            api.create_script(game_id, "nieuw commando", "")
                .map(Msg::ScriptSaved)
        });
    }

    fn editor(&mut self, ui: &mut egui::Ui, ctx: &mut PanelCtx) {
        let Some(script) = ctx
            .state
            .selected_script_id
            .and_then(|id| ctx.state.script(id))
            .cloned()
        else {
            ui.weak("Kies een script uit de lijst.");
            return;
        };
        if self.form.loaded_for != Some(script.id) {
            self.form.loaded_for = Some(script.id);
            self.form.trigger = script.trigger.clone();
            self.form.body = script.script.clone();
        }

        let mut changed = false;
        ui.horizontal(|ui| {
            ui.label("Trigger");
            changed |= ui.text_edit_singleline(&mut self.form.trigger).changed();
        });

        // Insertion helpers save typing exact names into conditions.
        ui.horizontal(|ui| {
            egui::ComboBox::from_id_salt("insert-room")
                .selected_text("Voeg kamer in")
                .show_ui(ui, |ui| {
                    for room in &ctx.state.rooms {
                        if ui.button(&room.title).clicked() {
                            self.form.body.push_str(&room.title);
                            changed = true;
                        }
                    }
                });
            egui::ComboBox::from_id_salt("insert-entity")
                .selected_text("Voeg entiteit in")
                .show_ui(ui, |ui| {
                    for entity in &ctx.state.entities {
                        if ui.button(&entity.name).clicked() {
                            self.form.body.push_str(&entity.name);
                            changed = true;
                        }
                    }
                });
        });

        egui::ScrollArea::vertical().auto_shrink(false).show(ui, |ui| {
            changed |= ui
                .add(
                    egui::TextEdit::multiline(&mut self.form.body)
                        .code_editor()
                        .desired_width(f32::INFINITY)
                        .desired_rows(18),
                )
                .changed();
        });
        if changed {
            ctx.state.has_unsaved_changes = true;
        }

        ui.horizontal(|ui| {
            if ui.add(Button::new("Opslaan")).clicked() {
                if self.form.trigger.trim().is_empty() {
                    ctx.flashes.warn("Trigger is verplicht.", ctx.now);
                } else {
                    let id = script.id;
                    let trigger = self.form.trigger.trim().to_owned();
                    let body = self.form.body.clone();
                    ctx.jobs.spawn("script opslaan", move |api| {
                        api.update_script(id, &trigger, &body).map(Msg::ScriptSaved)
                    });
                }
            }
            if ui.add(Button::new("Verwijder")).clicked() {
                self.pending_delete = Some((script.id, script.trigger.clone()));
            }
        });
    }

    fn delete_modal(&mut self, egui_ctx: &egui::Context, ctx: &mut PanelCtx) {
        let Some((id, trigger)) = &self.pending_delete else {
            return;
        };
        let body = format!("Script '{trigger}' verwijderen?");
        match confirm_modal(egui_ctx, "delete-script", "Script verwijderen", &body, "Verwijder") {
            ConfirmOutcome::Confirmed => {
                let id = *id;
                ctx.jobs.spawn("script verwijderen", move |api| {
                    api.delete_script(id).map(|_| Msg::ScriptDeleted(id))
                });
                self.pending_delete = None;
            }
            ConfirmOutcome::Cancelled => self.pending_delete = None,
            ConfirmOutcome::Open => {}
        }
    }
}
