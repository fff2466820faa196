//! The Entiteiten tab: filterable list plus the detail form.

use eframe::egui;
use serde_json::json;

use crate::model::{Entity, EntityKind};
use crate::net::Msg;
use crate::ui::{confirm_modal, ConfirmOutcome};
use crate::widgets::{matches_filter, Button, SearchField};

use super::PanelCtx;

/// Where an entity currently lives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Location {
    Nowhere,
    Room(i64),
    Inside(i64),
}

impl Location {
    fn of(entity: &Entity) -> Self {
        match (entity.room_id, entity.container_entity_id) {
            (Some(room), _) => Location::Room(room),
            (None, Some(container)) => Location::Inside(container),
            (None, None) => Location::Nowhere,
        }
    }
}

#[derive(Default)]
struct EntityForm {
    loaded_for: Option<i64>,
    name: String,
    kind: Option<EntityKind>,
    description: String,
    location: Option<Location>,
    is_takable: bool,
    pickup_message: String,
    conversation_id: Option<i64>,
    image_path: String,
}

impl EntityForm {
    fn sync(&mut self, entity: &Entity) {
        self.loaded_for = Some(entity.id);
        self.name = entity.name.clone();
        self.kind = Some(entity.kind);
        self.description = entity.description.clone().unwrap_or_default();
        self.location = Some(Location::of(entity));
        self.is_takable = entity.is_takable;
        self.pickup_message = entity.pickup_message.clone().unwrap_or_default();
        self.conversation_id = entity.conversation_id;
        self.image_path = entity.image_path.clone().unwrap_or_default();
    }

    fn fields(&self) -> serde_json::Value {
        let (room_id, container_id) = match self.location {
            Some(Location::Room(id)) => (Some(id), None),
            Some(Location::Inside(id)) => (None, Some(id)),
            _ => (None, None),
        };
        let opt = |s: &str| {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                serde_json::Value::Null
            } else {
                json!(trimmed)
            }
        };
        json!({
            "name": self.name.trim(),
            "type": self.kind.unwrap_or(EntityKind::Item).label(),
            "description": self.description,
            "room_id": room_id,
            "container_entity_id": container_id,
            "is_takable": self.is_takable,
            "pickup_message": opt(&self.pickup_message),
            "conversation_id": self.conversation_id,
            "image_path": opt(&self.image_path),
        })
    }
}

#[derive(Default)]
pub struct EntitiesPanel {
    filter: String,
    form: EntityForm,
    pending_delete: Option<(i64, String)>,
}

impl EntitiesPanel {
    pub fn ui(&mut self, ui: &mut egui::Ui, ctx: &mut PanelCtx) {
        if ctx.state.selected_game_id.is_none() {
            ui.weak("Selecteer eerst een spel.");
            return;
        }

        ui.horizontal(|ui| {
            ui.heading("Entiteiten");
            if ui.add(Button::new("Nieuwe entiteit").small()).clicked() {
                self.create(ctx);
            }
        });
        ui.separator();

        egui::SidePanel::left("entity-list")
            .resizable(true)
            .default_width(260.0)
            .show_inside(ui, |ui| {
                ui.add(SearchField::new(&mut self.filter));
                ui.add_space(4.0);
                egui::ScrollArea::vertical().auto_shrink(false).show(ui, |ui| {
                    let entities: Vec<(i64, String, EntityKind)> = ctx
                        .state
                        .entities
                        .iter()
                        .filter(|e| {
                            matches_filter(
                                &self.filter,
                                [e.name.as_str(), e.description.as_deref().unwrap_or("")],
                            )
                        })
                        .map(|e| (e.id, e.name.clone(), e.kind))
                        .collect();
                    for (id, name, kind) in entities {
                        let selected = ctx.state.selected_entity_id == Some(id);
                        let label = format!("{name} ({})", kind.label());
                        if ui.selectable_label(selected, label).clicked() {
                            ctx.state.selected_entity_id = Some(id);
                        }
                    }
                });
            });

        self.detail(ui, ctx);
        self.delete_modal(ui.ctx(), ctx);
    }

    fn create(&mut self, ctx: &mut PanelCtx) {
        let Some(game_id) = ctx.state.selected_game_id else {
            return;
        };
        let fields = json!({ "name": "Nieuw voorwerp", "type": "item", "description": "" });
        ctx.jobs.spawn("entiteit aanmaken", move |api| {
            api.create_entity(game_id, fields).map(Msg::EntitySaved)
        });
    }

    fn detail(&mut self, ui: &mut egui::Ui, ctx: &mut PanelCtx) {
        let Some(entity) = ctx.state.selected_entity().cloned() else {
            ui.weak("Kies een entiteit uit de lijst.");
            return;
        };
        if self.form.loaded_for != Some(entity.id) {
            self.form.sync(&entity);
        }

        egui::ScrollArea::vertical().auto_shrink(false).show(ui, |ui| {
            let mut changed = false;

            egui::Grid::new("entity-form").num_columns(2).show(ui, |ui| {
                ui.label("Naam");
                changed |= ui.text_edit_singleline(&mut self.form.name).changed();
                ui.end_row();

                ui.label("Type");
                let kind = self.form.kind.unwrap_or(EntityKind::Item);
                egui::ComboBox::from_id_salt("entity-kind")
                    .selected_text(kind.label())
                    .show_ui(ui, |ui| {
                        changed |= ui
                            .selectable_value(&mut self.form.kind, Some(EntityKind::Item), "item")
                            .clicked();
                        changed |= ui
                            .selectable_value(&mut self.form.kind, Some(EntityKind::Npc), "npc")
                            .clicked();
                    });
                ui.end_row();

                ui.label("Beschrijving");
                changed |= ui
                    .add(egui::TextEdit::multiline(&mut self.form.description).desired_rows(4))
                    .changed();
                ui.end_row();

                ui.label("Locatie");
                changed |= self.location_combo(ui, ctx, entity.id);
                ui.end_row();

                ui.label("Opneembaar");
                changed |= ui.checkbox(&mut self.form.is_takable, "").changed();
                ui.end_row();

                if self.form.is_takable {
                    ui.label("Oppakbericht");
                    changed |= ui
                        .text_edit_singleline(&mut self.form.pickup_message)
                        .changed();
                    ui.end_row();
                }

                if self.form.kind == Some(EntityKind::Npc) {
                    ui.label("Gesprek");
                    changed |= self.conversation_combo(ui, ctx);
                    ui.end_row();
                }

                ui.label("Afbeelding");
                changed |= ui.text_edit_singleline(&mut self.form.image_path).changed();
                ui.end_row();
            });

            if changed {
                ctx.state.has_unsaved_changes = true;
            }

            ui.add_space(8.0);
            ui.horizontal(|ui| {
                if ui.add(Button::new("Opslaan")).clicked() {
                    if self.form.name.trim().is_empty() {
                        ctx.flashes.warn("Naam is verplicht.", ctx.now);
                    } else {
                        let id = entity.id;
                        let fields = self.form.fields();
                        ctx.jobs.spawn("entiteit opslaan", move |api| {
                            api.update_entity(id, fields).map(Msg::EntitySaved)
                        });
                    }
                }
                if ui.add(Button::new("Verwijder")).clicked() {
                    self.pending_delete = Some((entity.id, entity.name.clone()));
                }
            });
        });
    }

    /// Room / container / nowhere picker. Containers exclude the entity
    /// itself so it cannot end up inside itself.
    fn location_combo(&mut self, ui: &mut egui::Ui, ctx: &PanelCtx, entity_id: i64) -> bool {
        let selected_text = match self.form.location {
            Some(Location::Room(id)) => format!("Kamer: {}", ctx.state.room_title(id)),
            Some(Location::Inside(id)) => format!(
                "In: {}",
                ctx.state
                    .entity(id)
                    .map(|e| e.name.clone())
                    .unwrap_or_else(|| format!("#{id}"))
            ),
            _ => "Nergens".to_owned(),
        };
        let mut changed = false;
        egui::ComboBox::from_id_salt("entity-location")
            .selected_text(selected_text)
            .show_ui(ui, |ui| {
                changed |= ui
                    .selectable_value(&mut self.form.location, Some(Location::Nowhere), "Nergens")
                    .clicked();
                for room in &ctx.state.rooms {
                    changed |= ui
                        .selectable_value(
                            &mut self.form.location,
                            Some(Location::Room(room.id)),
                            format!("Kamer: {}", room.title),
                        )
                        .clicked();
                }
                for other in ctx.state.entities.iter().filter(|e| e.id != entity_id) {
                    changed |= ui
                        .selectable_value(
                            &mut self.form.location,
                            Some(Location::Inside(other.id)),
                            format!("In: {}", other.name),
                        )
                        .clicked();
                }
            });
        changed
    }

    fn conversation_combo(&mut self, ui: &mut egui::Ui, ctx: &PanelCtx) -> bool {
        let selected_text = self
            .form
            .conversation_id
            .and_then(|id| ctx.state.conversation(id).map(|c| c.name.clone()))
            .unwrap_or_else(|| "Geen".to_owned());
        let mut changed = false;
        egui::ComboBox::from_id_salt("entity-conversation")
            .selected_text(selected_text)
            .show_ui(ui, |ui| {
                changed |= ui
                    .selectable_value(&mut self.form.conversation_id, None, "Geen")
                    .clicked();
                for convo in &ctx.state.conversations {
                    changed |= ui
                        .selectable_value(
                            &mut self.form.conversation_id,
                            Some(convo.id),
                            &convo.name,
                        )
                        .clicked();
                }
            });
        changed
    }

    fn delete_modal(&mut self, egui_ctx: &egui::Context, ctx: &mut PanelCtx) {
        let Some((id, name)) = &self.pending_delete else {
            return;
        };
        let body = format!("Entiteit '{name}' verwijderen?");
        match confirm_modal(egui_ctx, "delete-entity", "Entiteit verwijderen", &body, "Verwijder") {
            ConfirmOutcome::Confirmed => {
                let id = *id;
                ctx.jobs.spawn("entiteit verwijderen", move |api| {
                    api.delete_entity(id).map(|_| Msg::EntityDeleted(id))
                });
                self.pending_delete = None;
            }
            ConfirmOutcome::Cancelled => self.pending_delete = None,
            ConfirmOutcome::Open => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(room: Option<i64>, container: Option<i64>) -> Entity {
        Entity {
            id: 1,
            game_id: 1,
            name: "Lantaarn".into(),
            kind: EntityKind::Item,
            description: None,
            room_id: room,
            container_entity_id: container,
            is_takable: true,
            pickup_message: None,
            conversation_id: None,
            image_path: None,
        }
    }

    #[test]
    fn location_prefers_room_over_container() {
        assert_eq!(Location::of(&entity(Some(3), Some(9))), Location::Room(3));
        assert_eq!(Location::of(&entity(None, Some(9))), Location::Inside(9));
        assert_eq!(Location::of(&entity(None, None)), Location::Nowhere);
    }

    #[test]
    fn form_fields_null_out_cleared_location() {
        let mut form = EntityForm::default();
        form.sync(&entity(Some(3), None));
        form.location = Some(Location::Nowhere);
        let fields = form.fields();
        assert!(fields["room_id"].is_null());
        assert!(fields["container_entity_id"].is_null());
        assert_eq!(fields["type"], "item");
    }
}
