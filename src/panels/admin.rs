//! The Beheer tab: usage stats, user management, and server-wide settings.
//! Only shown to admins; the guard here is a second line behind the tab bar.

use eframe::egui;
use egui_extras::{Column, TableBuilder};

use crate::api::UserDraft;
use crate::model::{AdminSettings, AdminStats, User, UserRole};
use crate::net::{Msg, Remote};
use crate::ui::{confirm_modal, ConfirmOutcome};
use crate::widgets::Button;

use super::PanelCtx;

struct UserForm {
    id: Option<i64>,
    username: String,
    password: String,
    role: UserRole,
}

#[derive(Default)]
pub struct AdminPanel {
    pub data: Remote<(AdminStats, Vec<User>, AdminSettings)>,
    form: Option<UserForm>,
    pending_delete: Option<User>,
    theme_choice: String,
}

impl AdminPanel {
    /// Called when the admin payload lands so the settings form has a buffer.
    pub fn sync_settings(&mut self, settings: &AdminSettings) {
        self.theme_choice = settings.default_theme.clone();
    }

    pub fn ui(&mut self, ui: &mut egui::Ui, ctx: &mut PanelCtx) {
        if ctx.state.user_role != UserRole::Admin {
            ui.weak("Alleen beheerders hebben toegang tot deze pagina.");
            return;
        }
        if self.data.is_idle() {
            self.load(ctx);
        }

        ui.horizontal(|ui| {
            ui.heading("Beheer");
            if ui.add(Button::new("Vernieuw").small()).clicked() {
                self.load(ctx);
            }
        });
        ui.separator();

        match &self.data {
            Remote::Idle | Remote::Loading => {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.weak("Beheerdata laden...");
                });
                return;
            }
            Remote::Failed(error) => {
                ui.colored_label(ui.visuals().error_fg_color, error);
                return;
            }
            Remote::Ready((stats, users, _)) => {
                let stats = stats.clone();
                let users = users.clone();
                ui.horizontal(|ui| {
                    ui.label(format!("Gebruikers: {}", stats.user_count));
                    ui.separator();
                    ui.label(format!("Spellen: {}", stats.game_count));
                });
                ui.add_space(8.0);
                self.users_table(ui, ctx, &users);
            }
        }

        ui.add_space(12.0);
        ui.strong("Instellingen");
        ui.horizontal(|ui| {
            ui.label("Standaardthema");
            egui::ComboBox::from_id_salt("admin-default-theme")
                .selected_text(&self.theme_choice)
                .show_ui(ui, |ui| {
                    for theme in ["light", "dark", "system"] {
                        ui.selectable_value(&mut self.theme_choice, theme.to_owned(), theme);
                    }
                });
            if ui.add(Button::new("Opslaan").small()).clicked() {
                let settings = AdminSettings {
                    default_theme: self.theme_choice.clone(),
                };
                ctx.jobs.spawn("instellingen opslaan", move |api| {
                    api.admin_update_settings(&settings)?;
                    Ok(Msg::AdminSettingsSaved(settings))
                });
            }
        });

        self.user_modal(ui.ctx(), ctx);
        self.delete_modal(ui.ctx(), ctx);
    }

    fn load(&mut self, ctx: &mut PanelCtx) {
        self.data = Remote::Loading;
        ctx.jobs.spawn("beheerdata laden", |api| {
            let stats = api.admin_stats()?;
            let users = api.admin_users()?;
            let settings = api.admin_settings()?;
            Ok(Msg::AdminLoaded {
                stats,
                users,
                settings,
            })
        });
    }

    fn users_table(&mut self, ui: &mut egui::Ui, ctx: &mut PanelCtx, users: &[User]) {
        ui.horizontal(|ui| {
            ui.strong("Gebruikers");
            if ui.add(Button::new("Nieuwe gebruiker").small()).clicked() {
                self.form = Some(UserForm {
                    id: None,
                    username: String::new(),
                    password: String::new(),
                    role: UserRole::Builder,
                });
            }
        });

        let row_height = ui.text_style_height(&egui::TextStyle::Body) + 8.0;
        TableBuilder::new(ui)
            .striped(true)
            .column(Column::remainder().at_least(160.0))
            .column(Column::auto().at_least(80.0))
            .column(Column::auto().at_least(140.0))
            .header(row_height, |mut header| {
                header.col(|ui| {
                    ui.strong("Naam");
                });
                header.col(|ui| {
                    ui.strong("Rol");
                });
                header.col(|ui| {
                    ui.strong("Acties");
                });
            })
            .body(|mut body| {
                for user in users {
                    body.row(row_height, |mut row| {
                        row.col(|ui| {
                            ui.label(&user.username);
                        });
                        row.col(|ui| {
                            ui.label(user.role.label());
                        });
                        row.col(|ui| {
                            ui.horizontal(|ui| {
                                if ui.add(Button::new("Bewerk").small()).clicked() {
                                    self.form = Some(UserForm {
                                        id: Some(user.id),
                                        username: user.username.clone(),
                                        password: String::new(),
                                        role: user.role,
                                    });
                                }
                                if ui.add(Button::new("✕").small()).clicked() {
                                    self.pending_delete = Some(user.clone());
                                }
                            });
                        });
                    });
                }
            });
    }

    fn user_modal(&mut self, egui_ctx: &egui::Context, ctx: &mut PanelCtx) {
        let Some(form) = &mut self.form else { return };
        let creating = form.id.is_none();
        let mut close = false;
        let mut save = false;
        let response = egui::Modal::new(egui::Id::new("admin-user")).show(egui_ctx, |ui| {
            ui.set_max_width(360.0);
            ui.heading(if creating {
                "Nieuwe gebruiker"
            } else {
                "Gebruiker bewerken"
            });
            egui::Grid::new("admin-user-grid").num_columns(2).show(ui, |ui| {
                ui.label("Naam");
                ui.text_edit_singleline(&mut form.username);
                ui.end_row();
                ui.label("Wachtwoord");
                ui.add(egui::TextEdit::singleline(&mut form.password).password(true));
                ui.end_row();
                ui.label("Rol");
                egui::ComboBox::from_id_salt("admin-user-role")
                    .selected_text(form.role.label())
                    .show_ui(ui, |ui| {
                        for role in [UserRole::Guest, UserRole::Builder, UserRole::Admin] {
                            ui.selectable_value(&mut form.role, role, role.label());
                        }
                    });
                ui.end_row();
            });
            if !creating {
                ui.weak("Laat het wachtwoord leeg om het niet te wijzigen.");
            }
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
            if form.username.trim().is_empty() {
                ctx.flashes.warn("Naam is verplicht.", ctx.now);
            } else if creating && form.password.is_empty() {
                ctx.flashes.warn("Wachtwoord is verplicht.", ctx.now);
            } else {
                let draft = UserDraft {
                    username: form.username.trim().to_owned(),
                    password: (!form.password.is_empty()).then(|| form.password.clone()),
                    role: form.role.label().to_owned(),
                };
                match form.id {
                    None => ctx.jobs.spawn("gebruiker aanmaken", move |api| {
                        api.admin_create_user(&draft).map(Msg::UserSaved)
                    }),
                    Some(id) => ctx.jobs.spawn("gebruiker opslaan", move |api| {
                        api.admin_update_user(id, &draft).map(Msg::UserSaved)
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
        let Some(user) = &self.pending_delete else {
            return;
        };
        let body = format!("Gebruiker '{}' verwijderen?", user.username);
        match confirm_modal(egui_ctx, "delete-user", "Gebruiker verwijderen", &body, "Verwijder") {
            ConfirmOutcome::Confirmed => {
                let id = user.id;
                ctx.jobs.spawn("gebruiker verwijderen", move |api| {
                    api.admin_delete_user(id).map(|_| Msg::UserDeleted(id))
                });
                self.pending_delete = None;
            }
            ConfirmOutcome::Cancelled => self.pending_delete = None,
            ConfirmOutcome::Open => {}
        }
    }
}
