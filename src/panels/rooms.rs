//! The Rooms tab: reorderable list view, force-directed map view, and the
//! shared room detail panel. The two views edit the same cache; an edit in
//! one patches the other in place instead of reloading.

use eframe::egui::{self, pos2, vec2, Align2, Pos2, Rect, Sense, Stroke, StrokeKind, TextStyle};
use log::warn;
use serde_json::json;

use crate::graph::rooms::{position_update, RoomGraph, DIRECTIONS};
use crate::graph::sim::{NODE_HEIGHT, NODE_WIDTH};
use crate::graph::view::Camera;
use crate::model::{Connection, Room};
use crate::net::Msg;
use crate::themes::GraphPalette;
use crate::ui::{confirm_modal, ConfirmOutcome};
use crate::widgets::Button;

use super::PanelCtx;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum RoomView {
    #[default]
    List,
    Graph,
}

/// What the cursor was over when the context menu opened.
#[derive(Clone, Debug, Default, PartialEq)]
enum MenuTarget {
    #[default]
    None,
    Background(Pos2),
    Node(i64),
    /// First connection of the group under the cursor.
    Edge(Connection),
}

struct NodeDrag {
    room_id: i64,
    moved: bool,
}

/// Buffers for the detail form, synced when the selected room changes.
#[derive(Default)]
struct DetailForm {
    loaded_for: Option<i64>,
    title: String,
    description: String,
    image_path: String,
    add_target: Option<i64>,
    add_direction: String,
}

/// Modal for creating an entity straight from a graph node.
struct QuickEntityForm {
    room_id: i64,
    name: String,
    kind: crate::model::EntityKind,
    description: String,
}

#[derive(Default)]
pub struct RoomsPanel {
    view: RoomView,
    pub graph: RoomGraph,
    camera: Camera,
    drag: Option<NodeDrag>,
    linking: Option<i64>,
    menu_target: MenuTarget,
    /// While set, the sort action keeps the simulation hot until this time.
    sorting_until: Option<f64>,
    pending_delete: Option<(i64, String)>,
    detail: DetailForm,
    entity_form: Option<QuickEntityForm>,
}

impl RoomsPanel {
    /// Rebuild the graph from the current cache (view init / game switch).
    pub fn rebuild_graph(&mut self, rooms: &[Room], connections: &[Connection]) {
        let start = rooms.first().map(|r| r.id);
        self.graph = RoomGraph::rebuild(rooms, connections, start);
        self.camera = Camera::default();
        self.drag = None;
        self.linking = None;
        self.sorting_until = None;
        self.detail = DetailForm::default();
    }

    pub fn ui(&mut self, ui: &mut egui::Ui, ctx: &mut PanelCtx) {
        if ctx.state.selected_game_id.is_none() {
            ui.weak("Selecteer eerst een spel.");
            return;
        }

        ui.horizontal(|ui| {
            ui.heading("Kamers");
            ui.add(Button::new("Lijst").small().selected(self.view == RoomView::List))
                .clicked()
                .then(|| self.view = RoomView::List);
            ui.add(Button::new("Kaart").small().selected(self.view == RoomView::Graph))
                .clicked()
                .then(|| self.view = RoomView::Graph);
            if ui.add(Button::new("Nieuwe kamer").small()).clicked() {
                self.create_room(ctx, None);
            }
        });
        ui.separator();

        egui::SidePanel::right("room-detail")
            .resizable(true)
            .default_width(320.0)
            .show_inside(ui, |ui| self.detail_panel(ui, ctx));

        match self.view {
            RoomView::List => self.list_view(ui, ctx),
            RoomView::Graph => self.graph_view(ui, ctx),
        }

        self.delete_modal(ui.ctx(), ctx);
        self.entity_modal(ui.ctx(), ctx);
    }

    // --- list view -------------------------------------------------------

    fn list_view(&mut self, ui: &mut egui::Ui, ctx: &mut PanelCtx) {
        let rooms = ctx.state.rooms.clone();
        let mut moved: Option<(usize, usize)> = None;

        egui::ScrollArea::vertical().auto_shrink(false).show(ui, |ui| {
            for (idx, room) in rooms.iter().enumerate() {
                let item_id = egui::Id::new(("room-row", room.id));
                let selected = ctx.state.selected_room.as_ref().map(|r| r.id) == Some(room.id);
                let response = ui
                    .dnd_drag_source(item_id, idx, |ui| {
                        ui.horizontal(|ui| {
                            ui.label("≡");
                            let mut label = room.title.clone();
                            if idx == 0 {
                                label.push_str(" (Start)");
                            }
                            if ui.selectable_label(selected, label).clicked() {
                                self.select_room(ctx, room.id);
                            }
                        });
                    })
                    .response;

                if let Some(from) = response.dnd_release_payload::<usize>() {
                    if *from != idx {
                        moved = Some((*from, idx));
                    }
                }
            }
        });

        if let Some((from, to)) = moved {
            let mut reordered = rooms.clone();
            let room = reordered.remove(from);
            reordered.insert(to.min(reordered.len()), room);
            let ids: Vec<i64> = reordered.iter().map(|r| r.id).collect();
            let game_id = ctx.state.selected_game_id.unwrap_or_default();
            ctx.state.rooms = reordered;
            self.graph.set_start(ids.first().copied());
            ctx.jobs.spawn("kamervolgorde opslaan", move |api| {
                api.set_room_order(game_id, &ids).map(|_| Msg::RoomOrderSaved)
            });
        }
    }

    // --- graph view ------------------------------------------------------

    fn graph_view(&mut self, ui: &mut egui::Ui, ctx: &mut PanelCtx) {
        let palette = GraphPalette::from(ui.style().as_ref());
        let egui_ctx = ui.ctx().clone();
        let (response, painter) =
            ui.allocate_painter(ui.available_size(), Sense::click_and_drag());
        let viewport = response.rect;

        self.advance(ctx, viewport, &egui_ctx);

        // Wheel zoom around the cursor, like the d3 canvas.
        if response.hovered() {
            let (scroll, pointer) = ui.input(|i| (i.raw_scroll_delta.y, i.pointer.hover_pos()));
            if scroll != 0.0 {
                if let Some(pointer) = pointer {
                    self.camera.zoom_at(pointer, (scroll * 0.002).exp(), viewport);
                }
            }
        }

        let pointer = response.hover_pos().or_else(|| response.interact_pointer_pos());
        let hovered_node = pointer.and_then(|p| self.node_at(p, viewport));
        let hovered_edge = if hovered_node.is_none() {
            pointer.and_then(|p| self.edge_at(p, viewport))
        } else {
            None
        };

        self.handle_drag(ctx, &response, viewport, hovered_node);
        self.handle_clicks(ctx, &response, viewport, hovered_node, hovered_edge.clone());
        self.context_menu(ctx, &response, viewport, hovered_node, hovered_edge);
        self.handle_entity_drop(ctx, &response, hovered_node);

        if self.linking.is_some() && ui.input(|i| i.key_pressed(egui::Key::Escape)) {
            self.linking = None;
        }

        self.paint(&painter, viewport, &palette, pointer, ctx);
    }

    /// Per-frame simulation and camera stepping.
    fn advance(&mut self, ctx: &mut PanelCtx, viewport: Rect, egui_ctx: &egui::Context) {
        if let Some(until) = self.sorting_until {
            if ctx.now >= until {
                self.finish_sort(ctx, viewport);
            }
        }
        if self.graph.sim.active() {
            self.graph.tick();
        }
        let animating = self.camera.step(ctx.now);
        if self.graph.sim.active() || animating || self.sorting_until.is_some() {
            // Keep frames coming while things move.
            egui_ctx.request_repaint();
        }
    }

    fn node_at(&self, screen: Pos2, viewport: Rect) -> Option<i64> {
        for (idx, node) in self.graph.nodes.iter().enumerate().rev() {
            let p = self.graph.particles[idx];
            let rect = self.node_rect(p.x, p.y, viewport);
            if rect.contains(screen) {
                return Some(node.id);
            }
        }
        None
    }

    fn edge_at(&self, screen: Pos2, viewport: Rect) -> Option<Connection> {
        for group in &self.graph.groups {
            let (Some(s), Some(t)) = (
                self.graph.node_index(group.source),
                self.graph.node_index(group.target),
            ) else {
                continue;
            };
            let a = self.to_screen(s, viewport);
            let b = self.to_screen(t, viewport);
            let mid = pos2((a.x + b.x) / 2.0, (a.y + b.y) / 2.0);
            let label_rect = Rect::from_center_size(mid, vec2(120.0, 18.0));
            if label_rect.contains(screen) || segment_distance(screen, a, b) < 6.0 {
                return group.connections.first().cloned();
            }
        }
        None
    }

    fn to_screen(&self, idx: usize, viewport: Rect) -> Pos2 {
        let p = self.graph.particles[idx];
        self.camera.to_screen(pos2(p.x, p.y), viewport)
    }

    fn node_rect(&self, x: f32, y: f32, viewport: Rect) -> Rect {
        let center = self.camera.to_screen(pos2(x, y), viewport);
        Rect::from_center_size(
            center,
            vec2(NODE_WIDTH * self.camera.zoom, NODE_HEIGHT * self.camera.zoom),
        )
    }

    fn handle_drag(
        &mut self,
        ctx: &mut PanelCtx,
        response: &egui::Response,
        viewport: Rect,
        hovered_node: Option<i64>,
    ) {
        if response.drag_started_by(egui::PointerButton::Primary) {
            if let Some(room_id) = hovered_node {
                if self.linking.is_none() {
                    self.drag = Some(NodeDrag {
                        room_id,
                        moved: false,
                    });
                    self.graph.sim.set_alpha_target(0.3);
                }
            }
        }

        if response.dragged_by(egui::PointerButton::Primary) {
            match &mut self.drag {
                Some(drag) => {
                    if let (Some(idx), Some(pointer)) = (
                        self.graph.node_index(drag.room_id),
                        response.interact_pointer_pos(),
                    ) {
                        let world = self.camera.to_world(pointer, viewport);
                        let p = &mut self.graph.particles[idx];
                        p.fx = Some(world.x);
                        p.fy = Some(world.y);
                        drag.moved |= response.drag_delta() != egui::Vec2::ZERO;
                    }
                }
                // Background drag pans the camera.
                None => self.camera.pan_by(response.drag_delta()),
            }
        }

        if response.drag_stopped_by(egui::PointerButton::Primary) {
            if let Some(drag) = self.drag.take() {
                self.graph.sim.set_alpha_target(0.0);
                if drag.moved {
                    self.persist_position(ctx, drag.room_id);
                }
            }
        }
    }

    /// Write a dragged room's pin to the server, but only when the rounded
    /// position actually changed.
    fn persist_position(&mut self, ctx: &mut PanelCtx, room_id: i64) {
        let Some(idx) = self.graph.node_index(room_id) else {
            return;
        };
        let p = self.graph.particles[idx];
        let (orig_x, orig_y) = ctx
            .state
            .room(room_id)
            .map(|r| (r.pos_x, r.pos_y))
            .unwrap_or((None, None));
        if let Some((x, y)) = position_update(orig_x, orig_y, p.x, p.y) {
            ctx.jobs.spawn("positie opslaan", move |api| {
                api.update_room(room_id, json!({ "pos_x": x, "pos_y": y }))
                    .map(|_| Msg::RoomPositionSaved {
                        room_id,
                        x: x as f64,
                        y: y as f64,
                    })
            });
        }
    }

    fn handle_clicks(
        &mut self,
        ctx: &mut PanelCtx,
        response: &egui::Response,
        _viewport: Rect,
        hovered_node: Option<i64>,
        hovered_edge: Option<Connection>,
    ) {
        if !response.clicked() {
            return;
        }
        // A click while linking either completes or cancels the gesture.
        if let Some(source) = self.linking.take() {
            match hovered_node {
                Some(target) if target != source => self.finish_link(ctx, source, target),
                _ => {}
            }
            return;
        }
        if let Some(room_id) = hovered_node {
            if self.drag.is_none() {
                self.select_room(ctx, room_id);
            }
            return;
        }
        if let Some(conn) = hovered_edge {
            self.cycle_edge(ctx, conn);
        }
    }

    /// Left-click on an edge: advance its first connection to the next free
    /// direction in the fixed order.
    fn cycle_edge(&mut self, ctx: &mut PanelCtx, conn: Connection) {
        match self.graph.cycle_direction(&conn) {
            Some(next) => {
                let id = conn.id;
                ctx.jobs.spawn("richting wijzigen", move |api| {
                    api.update_connection(id, &next).map(Msg::ConnectionUpdated)
                });
            }
            None => ctx
                .flashes
                .warn("Geen andere beschikbare richtingen gevonden.", ctx.now),
        }
    }

    fn finish_link(&mut self, ctx: &mut PanelCtx, source: i64, target: i64) {
        let pick = self.graph.default_direction(source, target);
        if pick.exhausted {
            ctx.flashes.warn(
                "Alle richtingen vanuit deze kamer zijn in gebruik; 'noord' wordt dubbel gebruikt.",
                ctx.now,
            );
        }
        let direction = pick.direction;
        ctx.jobs.spawn("verbinding maken", move |api| {
            api.create_connection(source, target, &direction)
                .map(Msg::ConnectionCreated)
        });
    }

    fn context_menu(
        &mut self,
        ctx: &mut PanelCtx,
        response: &egui::Response,
        viewport: Rect,
        hovered_node: Option<i64>,
        hovered_edge: Option<Connection>,
    ) {
        if response.secondary_clicked() {
            // Right-click cancels a pending link gesture.
            if self.linking.take().is_some() {
                return;
            }
            self.menu_target = match (hovered_node, hovered_edge, response.interact_pointer_pos()) {
                (Some(id), _, _) => MenuTarget::Node(id),
                (None, Some(conn), _) => MenuTarget::Edge(conn),
                (None, None, Some(pointer)) => {
                    MenuTarget::Background(self.camera.to_world(pointer, viewport))
                }
                _ => MenuTarget::None,
            };
        }

        let target = self.menu_target.clone();
        response.context_menu(|ui| match &target {
            MenuTarget::Node(room_id) => {
                let room_id = *room_id;
                if ui.button("Maak verbinding").clicked() {
                    self.linking = Some(room_id);
                    ui.close();
                }
                if ui.button("Nieuwe entiteit").clicked() {
                    self.entity_form = Some(QuickEntityForm {
                        room_id,
                        name: String::new(),
                        kind: crate::model::EntityKind::Item,
                        description: String::new(),
                    });
                    ui.close();
                }
                if ui.button("Verwijder kamer").clicked() {
                    let title = ctx.state.room_title(room_id);
                    self.pending_delete = Some((room_id, title));
                    ui.close();
                }
            }
            MenuTarget::Edge(conn) => {
                ui.label(format!(
                    "{} → {}",
                    ctx.state.room_title(conn.from_room_id),
                    ctx.state.room_title(conn.to_room_id)
                ));
                ui.separator();
                for direction in DIRECTIONS {
                    if ui.button(capitalize(direction)).clicked() {
                        self.pick_direction(ctx, conn, direction);
                        ui.close();
                    }
                }
                ui.separator();
                if ui
                    .button(format!(
                        "Verwijder verbinding ({})",
                        conn.direction.to_uppercase()
                    ))
                    .clicked()
                {
                    let id = conn.id;
                    ctx.jobs.spawn("verbinding verwijderen", move |api| {
                        api.delete_connection(id).map(|_| Msg::ConnectionDeleted(id))
                    });
                    ui.close();
                }
            }
            MenuTarget::Background(world) => {
                if ui.button("Nieuwe kamer").clicked() {
                    self.create_room(ctx, Some(*world));
                    ui.close();
                }
                if ui.button("Reset view").clicked() {
                    self.camera.animate_reset(ctx.now);
                    ui.close();
                }
                if ui.button("Sorteer").clicked() {
                    self.start_sort(ctx);
                    ui.close();
                }
            }
            MenuTarget::None => {
                ui.close();
            }
        });
    }

    /// Explicitly chosen direction from the edge menu; taken directions are
    /// rejected with a flash instead of a server round-trip.
    fn pick_direction(&mut self, ctx: &mut PanelCtx, conn: &Connection, direction: &str) {
        if !self.graph.direction_available(conn, direction) {
            ctx.flashes.warn(
                format!(
                    "Richting '{}' is al in gebruik vanuit deze kamer.",
                    direction.to_uppercase()
                ),
                ctx.now,
            );
            return;
        }
        if direction.eq_ignore_ascii_case(&conn.direction) {
            return;
        }
        let id = conn.id;
        let direction = direction.to_owned();
        ctx.jobs.spawn("richting wijzigen", move |api| {
            api.update_connection(id, &direction).map(Msg::ConnectionUpdated)
        });
    }

    fn handle_entity_drop(
        &mut self,
        ctx: &mut PanelCtx,
        response: &egui::Response,
        hovered_node: Option<i64>,
    ) {
        let Some(entity_id) = response.dnd_release_payload::<i64>() else {
            return;
        };
        let Some(room_id) = hovered_node else {
            return;
        };
        let entity_id = *entity_id;
        ctx.jobs.spawn("entiteit verplaatsen", move |api| {
            api.update_entity(
                entity_id,
                json!({ "room_id": room_id, "container_entity_id": null }),
            )
            .map(Msg::EntitySaved)
        });
    }

    fn start_sort(&mut self, ctx: &mut PanelCtx) {
        self.graph.unpin_all();
        self.graph.sim.restart();
        self.sorting_until = Some(ctx.now + 1.5);
    }

    /// End of the sort run: freeze the layout, persist what moved, frame it.
    fn finish_sort(&mut self, ctx: &mut PanelCtx, viewport: Rect) {
        self.sorting_until = None;
        self.graph.pin_all();
        let room_ids: Vec<i64> = self.graph.nodes.iter().map(|n| n.id).collect();
        for room_id in room_ids {
            self.persist_position(ctx, room_id);
        }
        if let Some(bounds) = self.graph.bounds() {
            self.camera.animate_fit(bounds, viewport, ctx.now);
        }
    }

    fn paint(
        &self,
        painter: &egui::Painter,
        viewport: Rect,
        palette: &GraphPalette,
        pointer: Option<Pos2>,
        ctx: &PanelCtx,
    ) {
        painter.rect_filled(viewport, 0.0, painter.ctx().style().visuals.extreme_bg_color);

        for group in &self.graph.groups {
            let (Some(s), Some(t)) = (
                self.graph.node_index(group.source),
                self.graph.node_index(group.target),
            ) else {
                continue;
            };
            let a = self.to_screen(s, viewport);
            let b = self.to_screen(t, viewport);
            painter.line_segment([a, b], Stroke::new(1.5, palette.edge));
            let mid = pos2((a.x + b.x) / 2.0, (a.y + b.y) / 2.0);
            painter.text(
                mid,
                Align2::CENTER_CENTER,
                group.label(),
                TextStyle::Small.resolve(&painter.ctx().style()),
                palette.edge_label,
            );
        }

        // Rubber band while linking.
        if let (Some(source), Some(pointer)) = (self.linking, pointer) {
            if let Some(idx) = self.graph.node_index(source) {
                let from = self.to_screen(idx, viewport);
                painter.line_segment([from, pointer], Stroke::new(1.5, palette.rubber_band));
            }
        }

        let selected = ctx.state.selected_room.as_ref().map(|r| r.id);
        for (idx, node) in self.graph.nodes.iter().enumerate() {
            let p = self.graph.particles[idx];
            let rect = self.node_rect(p.x, p.y, viewport);
            let stroke_color = if node.is_start {
                palette.start_stroke
            } else if selected == Some(node.id) {
                palette.highlight
            } else {
                palette.node_stroke
            };
            painter.rect_filled(rect, 4.0, palette.node_fill);
            painter.rect_stroke(rect, 4.0, Stroke::new(1.5, stroke_color), StrokeKind::Inside);
            if node.is_start {
                painter.text(
                    rect.center_top() - vec2(0.0, 4.0),
                    Align2::CENTER_BOTTOM,
                    "(Start)",
                    TextStyle::Small.resolve(&painter.ctx().style()),
                    palette.start_stroke,
                );
            }
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                &node.label,
                TextStyle::Small.resolve(&painter.ctx().style()),
                palette.node_text,
            );
        }
    }

    // --- shared actions --------------------------------------------------

    fn select_room(&mut self, ctx: &mut PanelCtx, room_id: i64) {
        ctx.jobs.spawn("kamerdetails laden", move |api| {
            let room = api.room(room_id)?;
            let entities = api.room_entities(room_id)?;
            Ok(Msg::RoomDetail { room, entities })
        });
    }

    fn create_room(&mut self, ctx: &mut PanelCtx, at: Option<Pos2>) {
        let Some(game_id) = ctx.state.selected_game_id else {
            warn!("create room without a selected game");
            return;
        };
        let title = ctx.state.next_room_title();
        let mut fields = json!({ "title": title, "description": "" });
        if let Some(at) = at {
            fields["pos_x"] = json!(at.x.round() as i64);
            fields["pos_y"] = json!(at.y.round() as i64);
        }
        ctx.jobs.spawn("kamer aanmaken", move |api| {
            api.create_room(game_id, fields).map(Msg::RoomCreated)
        });
    }

    fn delete_modal(&mut self, egui_ctx: &egui::Context, ctx: &mut PanelCtx) {
        let Some((room_id, title)) = &self.pending_delete else {
            return;
        };
        let body = format!(
            "Kamer '{title}' en alle verbindingen ervan verwijderen?"
        );
        match confirm_modal(egui_ctx, "delete-room", "Kamer verwijderen", &body, "Verwijder") {
            ConfirmOutcome::Confirmed => {
                let id = *room_id;
                ctx.jobs.spawn("kamer verwijderen", move |api| {
                    api.delete_room(id).map(|_| Msg::RoomDeleted(id))
                });
                self.pending_delete = None;
            }
            ConfirmOutcome::Cancelled => self.pending_delete = None,
            ConfirmOutcome::Open => {}
        }
    }

    fn entity_modal(&mut self, egui_ctx: &egui::Context, ctx: &mut PanelCtx) {
        let Some(form) = &mut self.entity_form else {
            return;
        };
        let mut close = false;
        let mut save = false;
        let response = egui::Modal::new(egui::Id::new("graph-entity")).show(egui_ctx, |ui| {
            ui.set_max_width(360.0);
            ui.heading(format!(
                "Nieuwe entiteit in {}",
                ctx.state.room_title(form.room_id)
            ));
            egui::Grid::new("graph-entity-grid").num_columns(2).show(ui, |ui| {
                ui.label("Naam");
                ui.text_edit_singleline(&mut form.name);
                ui.end_row();
                ui.label("Type");
                egui::ComboBox::from_id_salt("graph-entity-kind")
                    .selected_text(form.kind.label())
                    .show_ui(ui, |ui| {
                        ui.selectable_value(&mut form.kind, crate::model::EntityKind::Item, "item");
                        ui.selectable_value(&mut form.kind, crate::model::EntityKind::Npc, "npc");
                    });
                ui.end_row();
                ui.label("Beschrijving");
                ui.text_edit_multiline(&mut form.description);
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
            } else if let Some(game_id) = ctx.state.selected_game_id {
                let fields = json!({
                    "name": form.name.trim(),
                    "type": form.kind.label(),
                    "description": form.description,
                    "room_id": form.room_id,
                });
                ctx.jobs.spawn("entiteit aanmaken", move |api| {
                    api.create_entity(game_id, fields).map(Msg::EntitySaved)
                });
                close = true;
            }
        }
        if close || response.should_close() {
            self.entity_form = None;
        }
    }

    // --- detail panel ----------------------------------------------------

    fn detail_panel(&mut self, ui: &mut egui::Ui, ctx: &mut PanelCtx) {
        let Some(room) = ctx.state.selected_room.clone() else {
            ui.weak("Klik op een kamer voor details.");
            return;
        };

        if self.detail.loaded_for != Some(room.id) {
            self.detail.loaded_for = Some(room.id);
            self.detail.title = room.title.clone();
            self.detail.description = room.description.clone().unwrap_or_default();
            self.detail.image_path = room.image_path.clone().unwrap_or_default();
            self.detail.add_target = None;
            self.detail.add_direction = DIRECTIONS[0].to_owned();
        }

        egui::ScrollArea::vertical().auto_shrink(false).show(ui, |ui| {
            ui.heading(&room.title);

            let mut changed = false;
            ui.label("Titel");
            changed |= ui.text_edit_singleline(&mut self.detail.title).changed();
            ui.label("Beschrijving");
            changed |= ui
                .add(egui::TextEdit::multiline(&mut self.detail.description).desired_rows(5))
                .changed();
            ui.label("Afbeelding");
            changed |= ui.text_edit_singleline(&mut self.detail.image_path).changed();
            if changed {
                ctx.state.has_unsaved_changes = true;
            }

            if ui.add(Button::new("Opslaan")).clicked() {
                let id = room.id;
                let fields = json!({
                    "title": self.detail.title.trim(),
                    "description": self.detail.description,
                    "image_path": if self.detail.image_path.trim().is_empty() {
                        serde_json::Value::Null
                    } else {
                        json!(self.detail.image_path.trim())
                    },
                });
                ctx.jobs.spawn("kamer opslaan", move |api| {
                    api.update_room(id, fields).map(Msg::RoomSaved)
                });
            }

            ui.separator();
            ui.strong("Verbindingen");
            for conn in room.connections.iter().flatten() {
                ui.horizontal(|ui| {
                    ui.label(format!(
                        "{} → {}",
                        conn.direction.to_uppercase(),
                        ctx.state.room_title(conn.to_room_id)
                    ));
                    if ui.add(Button::new("✕").small()).clicked() {
                        let id = conn.id;
                        ctx.jobs.spawn("verbinding verwijderen", move |api| {
                            api.delete_connection(id).map(|_| Msg::ConnectionDeleted(id))
                        });
                    }
                });
            }

            ui.horizontal(|ui| {
                let targets: Vec<(i64, String)> = ctx
                    .state
                    .rooms
                    .iter()
                    .filter(|r| r.id != room.id)
                    .map(|r| (r.id, r.title.clone()))
                    .collect();
                let selected_text = self
                    .detail
                    .add_target
                    .map(|id| ctx.state.room_title(id))
                    .unwrap_or_else(|| "Kies kamer".to_owned());
                egui::ComboBox::from_id_salt("add-conn-target")
                    .selected_text(selected_text)
                    .show_ui(ui, |ui| {
                        for (id, title) in &targets {
                            ui.selectable_value(&mut self.detail.add_target, Some(*id), title);
                        }
                    });
                egui::ComboBox::from_id_salt("add-conn-direction")
                    .selected_text(capitalize(&self.detail.add_direction))
                    .show_ui(ui, |ui| {
                        for direction in DIRECTIONS {
                            ui.selectable_value(
                                &mut self.detail.add_direction,
                                direction.to_owned(),
                                capitalize(direction),
                            );
                        }
                    });
                if ui.add(Button::new("Voeg toe").small()).clicked() {
                    match self.detail.add_target {
                        Some(target) => {
                            let direction = self.detail.add_direction.clone();
                            let from = room.id;
                            ctx.jobs.spawn("verbinding maken", move |api| {
                                api.create_connection(from, target, &direction)
                                    .map(Msg::ConnectionCreated)
                            });
                        }
                        None => ctx.flashes.warn("Kies eerst een doelkamer.", ctx.now),
                    }
                }
            });

            ui.separator();
            ui.strong("Entiteiten hier");
            if ctx.state.selected_room_entities.is_empty() {
                ui.weak("Geen entiteiten in deze kamer.");
            }
            for entity in &ctx.state.selected_room_entities {
                let drag_id = egui::Id::new(("room-entity", entity.id));
                ui.dnd_drag_source(drag_id, entity.id, |ui| {
                    ui.label(format!("{} ({})", entity.name, entity.kind.label()));
                });
            }
            ui.weak("Sleep een entiteit naar een kamer op de kaart om te verplaatsen.");
        });
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Distance from a point to a line segment, for edge hit-testing.
fn segment_distance(p: Pos2, a: Pos2, b: Pos2) -> f32 {
    let ab = b - a;
    let len2 = ab.length_sq();
    if len2 == 0.0 {
        return (p - a).length();
    }
    let t = ((p - a).dot(ab) / len2).clamp(0.0, 1.0);
    (p - (a + ab * t)).length()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segment_distance_handles_endpoints_and_interior() {
        let a = pos2(0.0, 0.0);
        let b = pos2(10.0, 0.0);
        assert_eq!(segment_distance(pos2(5.0, 3.0), a, b), 3.0);
        assert_eq!(segment_distance(pos2(-4.0, 0.0), a, b), 4.0);
        assert_eq!(segment_distance(pos2(13.0, 4.0), a, b), 5.0);
    }

    #[test]
    fn capitalize_upcases_the_first_letter_only() {
        assert_eq!(capitalize("noord"), "Noord");
        assert_eq!(capitalize(""), "");
    }
}
