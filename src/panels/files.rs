//! The Bestanden tab: sortable listing of the server's upload directory with
//! upload, rename, delete, and folder creation. Every mutation re-lists the
//! current directory in the same job so the table never goes stale.

use eframe::egui;
use egui_extras::{Column, TableBuilder};

use crate::model::{format_size, FileEntry};
use crate::net::{Msg, Remote};
use crate::ui::{confirm_modal, ConfirmOutcome};
use crate::widgets::Button;

use super::PanelCtx;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum SortKey {
    #[default]
    Name,
    Size,
    Modified,
}

struct RenameForm {
    path: String,
    new_name: String,
}

pub struct FilesPanel {
    pub entries: Remote<Vec<FileEntry>>,
    pub dir: String,
    sort_key: SortKey,
    sort_desc: bool,
    rename: Option<RenameForm>,
    new_folder: Option<String>,
    pending_delete: Option<FileEntry>,
}

impl Default for FilesPanel {
    fn default() -> Self {
        Self {
            entries: Remote::Idle,
            dir: String::new(),
            sort_key: SortKey::Name,
            sort_desc: false,
            rename: None,
            new_folder: None,
            pending_delete: None,
        }
    }
}

impl FilesPanel {
    pub fn ui(&mut self, ui: &mut egui::Ui, ctx: &mut PanelCtx) {
        if matches!(self.entries, Remote::Idle) {
            self.load(ctx, self.dir.clone());
        }

        ui.horizontal(|ui| {
            ui.heading("Bestanden");
            if ui.add(Button::new("Upload").small()).clicked() {
                self.upload(ctx);
            }
            if ui.add(Button::new("Nieuwe map").small()).clicked() {
                self.new_folder = Some(String::new());
            }
            if ui.add(Button::new("Vernieuw").small()).clicked() {
                self.load(ctx, self.dir.clone());
            }
        });

        // Breadcrumbs: every ancestor is clickable. The jump is deferred to
        // after the loop so `load` can reassign `self.dir`.
        let mut jump = None;
        ui.horizontal(|ui| {
            if ui.link("uploads").clicked() {
                jump = Some(String::new());
            }
            for (part, target) in breadcrumbs(&self.dir) {
                ui.label("/");
                if ui.link(part).clicked() {
                    jump = Some(target);
                }
            }
        });
        if let Some(dir) = jump {
            self.load(ctx, dir);
        }
        ui.separator();

        match &self.entries {
            Remote::Idle | Remote::Loading => {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.weak("Bestanden laden...");
                });
            }
            Remote::Failed(error) => {
                ui.colored_label(ui.visuals().error_fg_color, error);
            }
            Remote::Ready(entries) => {
                let sorted = self.sorted(entries.clone());
                self.table(ui, ctx, &sorted);
            }
        }

        self.rename_modal(ui.ctx(), ctx);
        self.folder_modal(ui.ctx(), ctx);
        self.delete_modal(ui.ctx(), ctx);
    }

    fn load(&mut self, ctx: &mut PanelCtx, dir: String) {
        self.entries = Remote::Loading;
        self.dir = dir.clone();
        ctx.jobs.spawn("bestanden laden", move |api| {
            let entries = api.files(&dir)?;
            Ok(Msg::FilesLoaded { dir, entries })
        });
    }

    /// Directories first, then the active sort key.
    fn sorted(&self, mut entries: Vec<FileEntry>) -> Vec<FileEntry> {
        entries.sort_by(|a, b| {
            b.is_dir.cmp(&a.is_dir).then_with(|| {
                let ordering = match self.sort_key {
                    SortKey::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
                    SortKey::Size => a.size.cmp(&b.size),
                    SortKey::Modified => a.modified.cmp(&b.modified),
                };
                if self.sort_desc {
                    ordering.reverse()
                } else {
                    ordering
                }
            })
        });
        entries
    }

    fn sort_header(&mut self, ui: &mut egui::Ui, label: &str, key: SortKey) {
        let marker = if self.sort_key == key {
            if self.sort_desc {
                " ↓"
            } else {
                " ↑"
            }
        } else {
            ""
        };
        let text = egui::RichText::new(format!("{label}{marker}")).strong();
        if ui
            .add(egui::Label::new(text).sense(egui::Sense::click()))
            .clicked()
        {
            if self.sort_key == key {
                self.sort_desc = !self.sort_desc;
            } else {
                self.sort_key = key;
                self.sort_desc = false;
            }
        }
    }

    fn table(&mut self, ui: &mut egui::Ui, ctx: &mut PanelCtx, entries: &[FileEntry]) {
        let row_height = ui.text_style_height(&egui::TextStyle::Body) + 8.0;
        TableBuilder::new(ui)
            .striped(true)
            .column(Column::remainder().at_least(180.0))
            .column(Column::auto().at_least(80.0))
            .column(Column::auto().at_least(140.0))
            .column(Column::auto().at_least(120.0))
            .header(row_height, |mut header| {
                header.col(|ui| self.sort_header(ui, "Naam", SortKey::Name));
                header.col(|ui| self.sort_header(ui, "Grootte", SortKey::Size));
                header.col(|ui| self.sort_header(ui, "Gewijzigd", SortKey::Modified));
                header.col(|ui| {
                    ui.strong("Acties");
                });
            })
            .body(|mut body| {
                for entry in entries {
                    body.row(row_height, |mut row| {
                        row.col(|ui| {
                            let label = if entry.is_dir {
                                format!("📁 {}", entry.name)
                            } else {
                                entry.name.clone()
                            };
                            if entry.is_dir {
                                if ui.link(label).clicked() {
                                    self.load(ctx, entry.path.clone());
                                }
                            } else {
                                ui.label(label);
                            }
                        });
                        row.col(|ui| {
                            match entry.size {
                                Some(size) if !entry.is_dir => {
                                    ui.label(format_size(size));
                                }
                                _ => {
                                    ui.weak("-");
                                }
                            };
                        });
                        row.col(|ui| {
                            ui.label(entry.modified.as_deref().unwrap_or("-"));
                        });
                        row.col(|ui| {
                            ui.horizontal(|ui| {
                                if ui.add(Button::new("Hernoem").small()).clicked() {
                                    self.rename = Some(RenameForm {
                                        path: entry.path.clone(),
                                        new_name: entry.name.clone(),
                                    });
                                }
                                if ui.add(Button::new("✕").small()).clicked() {
                                    self.pending_delete = Some(entry.clone());
                                }
                            });
                        });
                    });
                }
            });
    }

    fn upload(&mut self, ctx: &mut PanelCtx) {
        let Some(path) = rfd::FileDialog::new().pick_file() else {
            return;
        };
        let dir = self.dir.clone();
        self.entries = Remote::Loading;
        ctx.jobs.spawn("bestand uploaden", move |api| {
            api.upload_file(&dir, &path)?;
            let entries = api.files(&dir)?;
            Ok(Msg::FilesLoaded { dir, entries })
        });
    }

    fn rename_modal(&mut self, egui_ctx: &egui::Context, ctx: &mut PanelCtx) {
        let Some(form) = &mut self.rename else { return };
        let mut close = false;
        let mut save = false;
        let response = egui::Modal::new(egui::Id::new("rename-file")).show(egui_ctx, |ui| {
            ui.set_max_width(360.0);
            ui.heading("Hernoemen");
            ui.text_edit_singleline(&mut form.new_name);
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
            if form.new_name.trim().is_empty() {
                ctx.flashes.warn("Naam is verplicht.", ctx.now);
            } else {
                let old_path = form.path.clone();
                let new_name = form.new_name.trim().to_owned();
                let dir = self.dir.clone();
                self.entries = Remote::Loading;
                ctx.jobs.spawn("bestand hernoemen", move |api| {
                    api.rename_file(&old_path, &new_name)?;
                    let entries = api.files(&dir)?;
                    Ok(Msg::FilesLoaded { dir, entries })
                });
                close = true;
            }
        }
        if close || response.should_close() {
            self.rename = None;
        }
    }

    fn folder_modal(&mut self, egui_ctx: &egui::Context, ctx: &mut PanelCtx) {
        let Some(name) = &mut self.new_folder else { return };
        let mut close = false;
        let mut save = false;
        let response = egui::Modal::new(egui::Id::new("new-folder")).show(egui_ctx, |ui| {
            ui.set_max_width(360.0);
            ui.heading("Nieuwe map");
            ui.text_edit_singleline(name);
            ui.horizontal(|ui| {
                if ui.add(Button::new("Maak aan")).clicked() {
                    save = true;
                }
                if ui.add(Button::new("Annuleren")).clicked() {
                    close = true;
                }
            });
        });
        if save {
            if name.trim().is_empty() {
                ctx.flashes.warn("Naam is verplicht.", ctx.now);
            } else {
                let folder = name.trim().to_owned();
                let dir = self.dir.clone();
                self.entries = Remote::Loading;
                ctx.jobs.spawn("map aanmaken", move |api| {
                    api.create_folder(&dir, &folder)?;
                    let entries = api.files(&dir)?;
                    Ok(Msg::FilesLoaded { dir, entries })
                });
                close = true;
            }
        }
        if close || response.should_close() {
            self.new_folder = None;
        }
    }

    fn delete_modal(&mut self, egui_ctx: &egui::Context, ctx: &mut PanelCtx) {
        let Some(entry) = &self.pending_delete else {
            return;
        };
        let body = if entry.is_dir {
            format!("Map '{}' en alle inhoud verwijderen?", entry.name)
        } else {
            format!("Bestand '{}' verwijderen?", entry.name)
        };
        match confirm_modal(egui_ctx, "delete-file", "Verwijderen", &body, "Verwijder") {
            ConfirmOutcome::Confirmed => {
                let path = entry.path.clone();
                let dir = self.dir.clone();
                self.entries = Remote::Loading;
                ctx.jobs.spawn("bestand verwijderen", move |api| {
                    api.delete_file(&path)?;
                    let entries = api.files(&dir)?;
                    Ok(Msg::FilesLoaded { dir, entries })
                });
                self.pending_delete = None;
            }
            ConfirmOutcome::Cancelled => self.pending_delete = None,
            ConfirmOutcome::Open => {}
        }
    }
}

/// (segment label, directory to load) pairs for every ancestor of `dir`.
fn breadcrumbs(dir: &str) -> Vec<(String, String)> {
    let mut prefix = String::new();
    dir.split('/')
        .filter(|p| !p.is_empty())
        .map(|part| {
            if !prefix.is_empty() {
                prefix.push('/');
            }
            prefix.push_str(part);
            (part.to_owned(), prefix.clone())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, is_dir: bool, size: Option<u64>) -> FileEntry {
        FileEntry {
            name: name.into(),
            path: name.into(),
            is_dir,
            size,
            modified: None,
        }
    }

    #[test]
    fn directories_sort_before_files() {
        let panel = FilesPanel::default();
        let sorted = panel.sorted(vec![
            entry("b.png", false, Some(10)),
            entry("achtergronden", true, None),
            entry("a.png", false, Some(20)),
        ]);
        let names: Vec<&str> = sorted.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["achtergronden", "a.png", "b.png"]);
    }

    #[test]
    fn breadcrumbs_accumulate_ancestor_paths() {
        assert_eq!(
            breadcrumbs("achtergronden/kastelen"),
            vec![
                ("achtergronden".to_owned(), "achtergronden".to_owned()),
                ("kastelen".to_owned(), "achtergronden/kastelen".to_owned()),
            ]
        );
        assert!(breadcrumbs("").is_empty());
    }

    #[test]
    fn size_sort_descends_when_toggled() {
        let mut panel = FilesPanel::default();
        panel.sort_key = SortKey::Size;
        panel.sort_desc = true;
        let sorted = panel.sorted(vec![
            entry("a.png", false, Some(10)),
            entry("b.png", false, Some(20)),
        ]);
        assert_eq!(sorted[0].name, "b.png");
    }
}
