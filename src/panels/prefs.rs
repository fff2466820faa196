//! Preference modal: theme choice, persisted per user on the server.

use eframe::egui;

use crate::model::Preferences;
use crate::net::Msg;
use crate::themes::ThemePreference;
use crate::widgets::Button;

use super::PanelCtx;

#[derive(Default)]
pub struct PrefsPanel {
    open: bool,
    choice: ThemePreference,
}

impl PrefsPanel {
    pub fn open(&mut self, current: ThemePreference) {
        self.open = true;
        self.choice = current;
    }

    /// Returns the newly chosen preference when the user saves.
    pub fn ui(&mut self, egui_ctx: &egui::Context, ctx: &mut PanelCtx) -> Option<ThemePreference> {
        if !self.open {
            return None;
        }
        let mut close = false;
        let mut saved = None;

        let response = egui::Modal::new(egui::Id::new("preferences")).show(egui_ctx, |ui| {
            ui.set_max_width(320.0);
            ui.heading("Voorkeuren");
            ui.label("Thema");
            for (pref, label) in [
                (ThemePreference::Light, "Licht"),
                (ThemePreference::Dark, "Donker"),
                (ThemePreference::System, "Systeem"),
            ] {
                ui.radio_value(&mut self.choice, pref, label);
            }
            ui.add_space(8.0);
            ui.horizontal(|ui| {
                if ui.add(Button::new("Opslaan")).clicked() {
                    let prefs = Preferences {
                        theme: self.choice.as_str().to_owned(),
                        role: ctx.state.user_role,
                    };
                    ctx.jobs.spawn("voorkeuren opslaan", move |api| {
                        api.update_preferences(&prefs)?;
                        Ok(Msg::PrefsSaved(prefs))
                    });
                    saved = Some(self.choice);
                    close = true;
                }
                if ui.add(Button::new("Annuleren")).clicked() {
                    close = true;
                }
            });
        });

        if close || response.should_close() {
            self.open = false;
        }
        saved
    }
}
