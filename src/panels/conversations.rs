//! The Gesprekken tab: conversation list, raw JSON structure editor, and the
//! read-only graph rendering of the node structure.

use eframe::egui::{self, pos2, vec2, Align2, Pos2, Rect, Sense, Stroke, StrokeKind, TextStyle};
use serde_json::Value;

use crate::graph::convo::{definition_offset, ConvoGraph, ConvoNodeKind};
use crate::graph::sim::{NODE_HEIGHT, NODE_WIDTH};
use crate::graph::view::Camera;
use crate::net::Msg;
use crate::themes::GraphPalette;
use crate::ui::{confirm_modal, ConfirmOutcome};
use crate::widgets::Button;

use super::PanelCtx;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum ConvoView {
    #[default]
    Json,
    Graph,
}

#[derive(Default)]
struct ConvoForm {
    loaded_for: Option<i64>,
    name: String,
    source: String,
    /// Set when a graph click asks the editor to move its caret.
    jump_to: Option<usize>,
}

#[derive(Default)]
pub struct ConversationsPanel {
    view: ConvoView,
    form: ConvoForm,
    graph: ConvoGraph,
    graph_built_for: Option<i64>,
    camera: Camera,
    pending_delete: Option<(i64, String)>,
}

impl ConversationsPanel {
    pub fn ui(&mut self, ui: &mut egui::Ui, ctx: &mut PanelCtx) {
        if ctx.state.selected_game_id.is_none() {
            ui.weak("Selecteer eerst een spel.");
            return;
        }

        ui.horizontal(|ui| {
            ui.heading("Gesprekken");
            if ui.add(Button::new("Nieuw gesprek").small()).clicked() {
                self.create(ctx);
            }
        });
        ui.separator();

        egui::SidePanel::left("conversation-list")
            .resizable(true)
            .default_width(240.0)
            .show_inside(ui, |ui| {
                egui::ScrollArea::vertical().auto_shrink(false).show(ui, |ui| {
                    let conversations: Vec<(i64, String)> = ctx
                        .state
                        .conversations
                        .iter()
                        .map(|c| (c.id, c.name.clone()))
                        .collect();
                    for (id, name) in conversations {
                        let selected = ctx.state.selected_conversation_id == Some(id);
                        if ui.selectable_label(selected, &name).clicked() {
                            ctx.state.selected_conversation_id = Some(id);
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
        // Minimal valid structure: one start node with no options.
        let structure = serde_json::json!({
            "start_node": "start",
            "nodes": {
                "start": { "type": "options", "npc_text": "Hallo!", "options": [] }
            }
        });
        ctx.jobs.spawn("gesprek aanmaken", move |api| {
            api.create_conversation(game_id, "Nieuw gesprek", structure)
                .map(Msg::ConversationSaved)
        });
    }

    fn editor(&mut self, ui: &mut egui::Ui, ctx: &mut PanelCtx) {
        let Some(convo) = ctx.state.selected_conversation().cloned() else {
            ui.weak("Kies een gesprek uit de lijst.");
            return;
        };
        if self.form.loaded_for != Some(convo.id) {
            self.form.loaded_for = Some(convo.id);
            self.form.name = convo.name.clone();
            self.form.source = serde_json::to_string_pretty(&convo.structure)
                .unwrap_or_else(|_| "{}".to_owned());
            self.form.jump_to = None;
            self.graph_built_for = None;
        }

        let mut changed = false;
        ui.horizontal(|ui| {
            ui.label("Naam");
            changed |= ui.text_edit_singleline(&mut self.form.name).changed();
            if ui.add(Button::new("Opslaan").small()).clicked() {
                self.save(ctx, convo.id);
            }
            if ui.add(Button::new("Verwijder").small()).clicked() {
                self.pending_delete = Some((convo.id, convo.name.clone()));
            }
            ui.separator();
            ui.add(Button::new("JSON").small().selected(self.view == ConvoView::Json))
                .clicked()
                .then(|| self.view = ConvoView::Json);
            ui.add(Button::new("Graaf").small().selected(self.view == ConvoView::Graph))
                .clicked()
                .then(|| {
                    self.view = ConvoView::Graph;
                    self.graph_built_for = None;
                });
        });
        if changed {
            ctx.state.has_unsaved_changes = true;
        }

        match self.view {
            ConvoView::Json => self.json_editor(ui, ctx),
            ConvoView::Graph => self.graph_view(ui, ctx),
        }
    }

    fn json_editor(&mut self, ui: &mut egui::Ui, ctx: &mut PanelCtx) {
        egui::ScrollArea::vertical().auto_shrink(false).show(ui, |ui| {
            let editor = egui::TextEdit::multiline(&mut self.form.source)
                .code_editor()
                .desired_width(f32::INFINITY)
                .desired_rows(24)
                .id(egui::Id::new("convo-json"));
            let output = editor.show(ui);
            if output.response.changed() {
                ctx.state.has_unsaved_changes = true;
            }

            // A graph click scheduled a caret jump into the definition.
            if let Some(offset) = self.form.jump_to.take() {
                let ccursor = egui::text::CCursor::new(
                    self.form.source[..offset.min(self.form.source.len())]
                        .chars()
                        .count(),
                );
                let mut state = output.state;
                state
                    .cursor
                    .set_char_range(Some(egui::text::CCursorRange::one(ccursor)));
                state.store(ui.ctx(), output.response.id);
                output.response.request_focus();
            }
        });
    }

    /// PUT only goes out when the buffer parses as JSON.
    fn save(&mut self, ctx: &mut PanelCtx, id: i64) {
        if self.form.name.trim().is_empty() {
            ctx.flashes.warn("Naam is verplicht.", ctx.now);
            return;
        }
        let structure: Value = match serde_json::from_str(&self.form.source) {
            Ok(value) => value,
            Err(err) => {
                ctx.flashes
                    .error(format!("Ongeldige JSON: {err}"), ctx.now);
                return;
            }
        };
        let name = self.form.name.trim().to_owned();
        ctx.jobs.spawn("gesprek opslaan", move |api| {
            api.update_conversation(id, &name, structure)
                .map(Msg::ConversationSaved)
        });
    }

    fn graph_view(&mut self, ui: &mut egui::Ui, ctx: &mut PanelCtx) {
        let Some(convo_id) = self.form.loaded_for else {
            return;
        };
        if self.graph_built_for != Some(convo_id) {
            // Build from the edit buffer so unsaved structure shows too.
            match serde_json::from_str::<Value>(&self.form.source) {
                Ok(structure) => {
                    self.graph = ConvoGraph::build(&structure);
                    self.graph_built_for = Some(convo_id);
                    self.camera = Camera::default();
                }
                Err(err) => {
                    ui.colored_label(
                        ui.visuals().error_fg_color,
                        format!("Ongeldige JSON: {err}"),
                    );
                    return;
                }
            }
        }

        let palette = GraphPalette::from(ui.style().as_ref());
        let egui_ctx = ui.ctx().clone();
        let (response, painter) =
            ui.allocate_painter(ui.available_size(), Sense::click_and_drag());
        let viewport = response.rect;

        if self.graph.sim.active() {
            self.graph.tick();
        }
        let animating = self.camera.step(ctx.now);
        if self.graph.sim.active() || animating {
            egui_ctx.request_repaint();
        }

        if response.hovered() {
            let (scroll, pointer) = ui.input(|i| (i.raw_scroll_delta.y, i.pointer.hover_pos()));
            if scroll != 0.0 {
                if let Some(pointer) = pointer {
                    self.camera.zoom_at(pointer, (scroll * 0.002).exp(), viewport);
                }
            }
        }
        if response.dragged_by(egui::PointerButton::Primary) {
            self.camera.pan_by(response.drag_delta());
        }
        if response.double_clicked() {
            self.camera.animate_reset(ctx.now);
        }

        // Click highlights the node and jumps the JSON caret to it.
        if response.clicked() {
            if let Some(pointer) = response.interact_pointer_pos() {
                let hit = self.node_at(pointer, viewport);
                self.graph.highlighted = hit;
                if let Some(idx) = hit {
                    let node_id = self.graph.nodes[idx].id.clone();
                    if let Some(offset) = definition_offset(&self.form.source, &node_id) {
                        self.form.jump_to = Some(offset);
                        self.view = ConvoView::Json;
                    }
                }
            }
        }

        self.paint(&painter, viewport, &palette);
    }

    fn node_at(&self, screen: Pos2, viewport: Rect) -> Option<usize> {
        (0..self.graph.nodes.len()).rev().find(|&idx| {
            let p = self.graph.particles[idx];
            let center = self.camera.to_screen(pos2(p.x, p.y), viewport);
            Rect::from_center_size(
                center,
                vec2(NODE_WIDTH * self.camera.zoom, NODE_HEIGHT * self.camera.zoom),
            )
            .contains(screen)
        })
    }

    fn paint(&self, painter: &egui::Painter, viewport: Rect, palette: &GraphPalette) {
        painter.rect_filled(viewport, 0.0, painter.ctx().style().visuals.extreme_bg_color);
        let style = painter.ctx().style();

        for link in &self.graph.links {
            let a = self.screen_pos(link.source, viewport);
            let b = self.screen_pos(link.target, viewport);
            painter.line_segment([a, b], Stroke::new(1.5, palette.edge));
            let mid = pos2((a.x + b.x) / 2.0, (a.y + b.y) / 2.0);
            painter.text(
                mid,
                Align2::CENTER_CENTER,
                &link.label,
                TextStyle::Small.resolve(&style),
                palette.edge_label,
            );
        }

        for (idx, node) in self.graph.nodes.iter().enumerate() {
            let center = self.screen_pos(idx, viewport);
            let rect = Rect::from_center_size(
                center,
                vec2(NODE_WIDTH * self.camera.zoom, NODE_HEIGHT * self.camera.zoom),
            );
            let fill = match &node.kind {
                ConvoNodeKind::Options => palette.options_fill,
                ConvoNodeKind::Question => palette.question_fill,
                ConvoNodeKind::Other(_) => palette.other_fill,
            };
            let stroke_color = if self.graph.highlighted == Some(idx) {
                palette.highlight
            } else if node.is_start {
                palette.start_stroke
            } else {
                palette.node_stroke
            };
            painter.rect_filled(rect, 4.0, fill);
            painter.rect_stroke(rect, 4.0, Stroke::new(1.5, stroke_color), StrokeKind::Inside);
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                &node.text,
                TextStyle::Small.resolve(&style),
                palette.node_text,
            );
            if node.is_start {
                painter.text(
                    rect.center_top() - vec2(0.0, 4.0),
                    Align2::CENTER_BOTTOM,
                    "(Start)",
                    TextStyle::Small.resolve(&style),
                    palette.start_stroke,
                );
            }
        }
    }

    fn screen_pos(&self, idx: usize, viewport: Rect) -> Pos2 {
        let p = self.graph.particles[idx];
        self.camera.to_screen(pos2(p.x, p.y), viewport)
    }

    fn delete_modal(&mut self, egui_ctx: &egui::Context, ctx: &mut PanelCtx) {
        let Some((id, name)) = &self.pending_delete else {
            return;
        };
        let body = format!("Gesprek '{name}' verwijderen?");
        match confirm_modal(
            egui_ctx,
            "delete-conversation",
            "Gesprek verwijderen",
            &body,
            "Verwijder",
        ) {
            ConfirmOutcome::Confirmed => {
                let id = *id;
                ctx.jobs.spawn("gesprek verwijderen", move |api| {
                    api.delete_conversation(id)
                        .map(|_| Msg::ConversationDeleted(id))
                });
                self.pending_delete = None;
            }
            ConfirmOutcome::Cancelled => self.pending_delete = None,
            ConfirmOutcome::Open => {}
        }
    }
}
