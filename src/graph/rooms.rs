//! Graph-shaped view of a game's rooms and connections.
//!
//! The backend models directed, possibly multiple, connections between two
//! rooms; the diagram draws one edge per unordered room pair and aggregates
//! the directed connections into that edge's label. All mutation here happens
//! after the corresponding backend call confirmed, so this state never runs
//! ahead of the server.

use std::collections::HashSet;

use crate::model::{Connection, Room};

use super::sim::{ForceSim, Particle, SimLink};

/// Fixed direction order for defaults and click-cycling.
pub const DIRECTIONS: [&str; 8] = [
    "noord", "oost", "zuid", "west", "omhoog", "omlaag", "in", "uit",
];

pub fn opposite(direction: &str) -> Option<&'static str> {
    match direction.to_lowercase().as_str() {
        "noord" => Some("zuid"),
        "zuid" => Some("noord"),
        "oost" => Some("west"),
        "west" => Some("oost"),
        "omhoog" => Some("omlaag"),
        "omlaag" => Some("omhoog"),
        "in" => Some("uit"),
        "uit" => Some("in"),
        _ => None,
    }
}

/// Unordered room pair; the same two rooms always map to the same key.
pub type PairKey = (i64, i64);

pub fn pair_key(a: i64, b: i64) -> PairKey {
    (a.min(b), a.max(b))
}

pub struct RoomNode {
    pub id: i64,
    pub label: String,
    pub is_start: bool,
}

/// One visual edge, owning every directed connection between its pair.
pub struct EdgeGroup {
    pub key: PairKey,
    /// Orientation the label's "(rev)" marker is relative to.
    pub source: i64,
    pub target: i64,
    pub connections: Vec<Connection>,
}

impl EdgeGroup {
    /// Combined label, e.g. `NOORD / ZUID (rev)`. Duplicate entries collapse.
    pub fn label(&self) -> String {
        let mut seen = HashSet::new();
        let mut parts = Vec::new();
        for conn in &self.connections {
            if conn.direction.trim().is_empty() {
                continue;
            }
            let reversed = !(conn.from_room_id == self.source && conn.to_room_id == self.target);
            let text = if reversed {
                format!("{} (rev)", conn.direction.to_uppercase())
            } else {
                conn.direction.to_uppercase()
            };
            if seen.insert(text.clone()) {
                parts.push(text);
            }
        }
        parts.join(" / ")
    }
}

/// Outcome of the smart direction default.
pub struct DirectionPick {
    pub direction: String,
    /// Every direction from the source was taken; the pick duplicates one.
    pub exhausted: bool,
}

#[derive(Default)]
pub struct RoomGraph {
    pub nodes: Vec<RoomNode>,
    /// Simulation state, indexed in step with `nodes`.
    pub particles: Vec<Particle>,
    pub groups: Vec<EdgeGroup>,
    pub sim: ForceSim,
}

impl RoomGraph {
    /// Full rebuild, used on view init and game switch.
    pub fn rebuild(rooms: &[Room], connections: &[Connection], start_room: Option<i64>) -> Self {
        let mut graph = RoomGraph {
            nodes: Vec::new(),
            particles: Vec::new(),
            groups: Vec::new(),
            sim: ForceSim::default(),
        };
        for room in rooms {
            graph.insert_room(room, start_room == Some(room.id));
        }
        for conn in connections {
            graph.add_connection(conn.clone());
        }
        graph.sim.restart();
        graph
    }

    pub fn node_index(&self, id: i64) -> Option<usize> {
        self.nodes.iter().position(|n| n.id == id)
    }

    fn insert_room(&mut self, room: &Room, is_start: bool) {
        let particle = match (room.pos_x, room.pos_y) {
            (Some(x), Some(y)) => Particle::pinned(x as f32, y as f32),
            // Seeded near the centre; the simulation spreads them out.
            _ => Particle::at(
                (self.nodes.len() as f32 * 37.0) % 120.0 - 60.0,
                (self.nodes.len() as f32 * 53.0) % 120.0 - 60.0,
            ),
        };
        self.nodes.push(RoomNode {
            id: room.id,
            label: room.title.clone(),
            is_start,
        });
        self.particles.push(particle);
    }

    pub fn add_room(&mut self, room: &Room, is_start: bool) {
        if self.node_index(room.id).is_some() {
            return;
        }
        self.insert_room(room, is_start);
        self.sim.set_alpha_target(0.3);
        self.sim.restart();
    }

    /// Add a confirmed connection, merging into the pair's group if one
    /// exists. Duplicate connection ids are ignored.
    pub fn add_connection(&mut self, conn: Connection) {
        let key = pair_key(conn.from_room_id, conn.to_room_id);
        if let Some(group) = self.groups.iter_mut().find(|g| g.key == key) {
            if group.connections.iter().all(|c| c.id != conn.id) {
                group.connections.push(conn);
            }
        } else {
            self.groups.push(EdgeGroup {
                key,
                source: conn.from_room_id,
                target: conn.to_room_id,
                connections: vec![conn],
            });
        }
    }

    /// Swap in an updated connection (direction change).
    pub fn update_connection(&mut self, conn: Connection) {
        for group in &mut self.groups {
            if let Some(slot) = group.connections.iter_mut().find(|c| c.id == conn.id) {
                *slot = conn;
                return;
            }
        }
    }

    /// Drop one connection; a group that loses its last connection disappears.
    pub fn remove_connection(&mut self, id: i64) {
        for group in &mut self.groups {
            group.connections.retain(|c| c.id != id);
        }
        self.groups.retain(|g| !g.connections.is_empty());
    }

    /// Remove a room node plus every edge-group touching it.
    pub fn remove_room(&mut self, id: i64) {
        if let Some(idx) = self.node_index(id) {
            self.nodes.remove(idx);
            self.particles.remove(idx);
        }
        self.groups.retain(|g| g.key.0 != id && g.key.1 != id);
        self.sim.restart();
    }

    /// Sync a node label after a panel or list edit; no rebuild.
    pub fn set_label(&mut self, id: i64, label: &str) {
        if let Some(idx) = self.node_index(id) {
            self.nodes[idx].label = label.to_owned();
        }
    }

    pub fn set_start(&mut self, start_room: Option<i64>) {
        for node in &mut self.nodes {
            node.is_start = start_room == Some(node.id);
        }
    }

    pub fn sim_links(&self) -> Vec<SimLink> {
        self.groups
            .iter()
            .filter_map(|g| {
                Some(SimLink {
                    source: self.node_index(g.source)?,
                    target: self.node_index(g.target)?,
                })
            })
            .collect()
    }

    pub fn tick(&mut self) {
        let links = self.sim_links();
        self.sim.tick(&mut self.particles, &links);
    }

    /// Directions already used by connections leaving `from`.
    pub fn used_directions(&self, from: i64) -> HashSet<String> {
        self.groups
            .iter()
            .flat_map(|g| &g.connections)
            .filter(|c| c.from_room_id == from)
            .map(|c| c.direction.to_lowercase())
            .collect()
    }

    /// Smart default for a new `source -> target` connection: prefer the
    /// opposite of an existing reverse connection when that opposite is still
    /// free from the source, otherwise the first unused direction in the
    /// fixed order. When all eight are taken the pick falls back to `noord`,
    /// knowingly duplicating; `exhausted` lets the caller warn about it.
    pub fn default_direction(&self, source: i64, target: i64) -> DirectionPick {
        let used = self.used_directions(source);
        let reverse = self
            .groups
            .iter()
            .flat_map(|g| &g.connections)
            .find(|c| c.from_room_id == target && c.to_room_id == source);
        if let Some(reverse) = reverse {
            if let Some(opp) = opposite(&reverse.direction) {
                if !used.contains(opp) {
                    return DirectionPick {
                        direction: opp.to_owned(),
                        exhausted: false,
                    };
                }
            }
        }
        for dir in DIRECTIONS {
            if !used.contains(dir) {
                return DirectionPick {
                    direction: dir.to_owned(),
                    exhausted: false,
                };
            }
        }
        DirectionPick {
            direction: "noord".to_owned(),
            exhausted: true,
        }
    }

    /// Next unused direction after the connection's current one, wrapping
    /// through the fixed order. `None` when nothing is free.
    pub fn cycle_direction(&self, conn: &Connection) -> Option<String> {
        let used = self.used_directions(conn.from_room_id);
        let current = DIRECTIONS
            .iter()
            .position(|d| *d == conn.direction.to_lowercase())
            .unwrap_or(0);
        for step in 1..DIRECTIONS.len() {
            let candidate = DIRECTIONS[(current + step) % DIRECTIONS.len()];
            if !used.contains(candidate) {
                return Some(candidate.to_owned());
            }
        }
        None
    }

    /// Whether an explicitly picked direction is acceptable: free from the
    /// source, or a no-op re-pick of the current one.
    pub fn direction_available(&self, conn: &Connection, wanted: &str) -> bool {
        let wanted = wanted.to_lowercase();
        wanted == conn.direction.to_lowercase()
            || !self.used_directions(conn.from_room_id).contains(&wanted)
    }

    pub fn unpin_all(&mut self) {
        for p in &mut self.particles {
            p.unpin();
        }
    }

    pub fn pin_all(&mut self) {
        for p in &mut self.particles {
            p.pin();
        }
    }

    /// World-space bounds over node centres; `None` when empty.
    pub fn bounds(&self) -> Option<(f32, f32, f32, f32)> {
        let first = self.particles.first()?;
        let mut min = (first.x, first.y);
        let mut max = (first.x, first.y);
        for p in &self.particles {
            min.0 = min.0.min(p.x);
            min.1 = min.1.min(p.y);
            max.0 = max.0.max(p.x);
            max.1 = max.1.max(p.y);
        }
        Some((min.0, min.1, max.0, max.1))
    }
}

/// Decide whether a drag's end position warrants a backend write: only when
/// the rounded integer position differs from what the server already has.
pub fn position_update(
    orig_x: Option<f64>,
    orig_y: Option<f64>,
    x: f32,
    y: f32,
) -> Option<(i64, i64)> {
    let rx = x.round() as i64;
    let ry = y.round() as i64;
    let same = orig_x.map(|v| v.round() as i64) == Some(rx)
        && orig_y.map(|v| v.round() as i64) == Some(ry);
    if same {
        None
    } else {
        Some((rx, ry))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn room(id: i64, title: &str) -> Room {
        Room {
            id,
            title: title.into(),
            ..Default::default()
        }
    }

    fn conn(id: i64, from: i64, to: i64, direction: &str) -> Connection {
        Connection {
            id,
            from_room_id: from,
            to_room_id: to,
            direction: direction.into(),
        }
    }

    fn graph_with(rooms: &[Room], connections: &[Connection]) -> RoomGraph {
        RoomGraph::rebuild(rooms, connections, rooms.first().map(|r| r.id))
    }

    #[rstest]
    #[case(1, 2)]
    #[case(2, 1)]
    fn pair_key_ignores_order(#[case] a: i64, #[case] b: i64) {
        assert_eq!(pair_key(a, b), (1, 2));
    }

    #[test]
    fn connections_between_a_pair_share_one_group() {
        let rooms = [room(1, "Hal"), room(2, "Kelder")];
        let mut graph = graph_with(&rooms, &[conn(10, 1, 2, "noord")]);
        graph.add_connection(conn(11, 2, 1, "zuid"));
        assert_eq!(graph.groups.len(), 1);
        assert_eq!(graph.groups[0].connections.len(), 2);
        // A re-delivered connection does not duplicate.
        graph.add_connection(conn(11, 2, 1, "zuid"));
        assert_eq!(graph.groups[0].connections.len(), 2);
    }

    #[test]
    fn group_label_marks_reversed_connections() {
        let rooms = [room(1, "Hal"), room(2, "Kelder")];
        let graph = graph_with(&rooms, &[conn(10, 1, 2, "noord"), conn(11, 2, 1, "zuid")]);
        assert_eq!(graph.groups[0].label(), "NOORD / ZUID (rev)");
    }

    #[test]
    fn removing_the_last_connection_removes_the_group() {
        let rooms = [room(1, "Hal"), room(2, "Kelder")];
        let mut graph = graph_with(&rooms, &[conn(10, 1, 2, "noord"), conn(11, 2, 1, "zuid")]);
        graph.remove_connection(10);
        assert_eq!(graph.groups.len(), 1);
        graph.remove_connection(11);
        assert!(graph.groups.is_empty());
    }

    #[test]
    fn removing_a_room_cascades_to_its_groups() {
        let rooms = [room(1, "Hal"), room(2, "Kelder"), room(3, "Zolder")];
        let mut graph = graph_with(&rooms, &[conn(10, 1, 2, "noord"), conn(11, 3, 2, "omlaag")]);
        graph.remove_room(2);
        assert!(graph.groups.is_empty());
        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(graph.particles.len(), 2);
    }

    #[test]
    fn default_direction_prefers_the_opposite_of_a_reverse_connection() {
        let rooms = [room(1, "Hal"), room(2, "Kelder")];
        let graph = graph_with(&rooms, &[conn(10, 2, 1, "omhoog")]);
        let pick = graph.default_direction(1, 2);
        assert_eq!(pick.direction, "omlaag");
        assert!(!pick.exhausted);
    }

    #[test]
    fn default_direction_never_reuses_an_outgoing_direction() {
        let rooms = [room(1, "Hal"), room(2, "Kelder"), room(3, "Zolder")];
        let graph = graph_with(
            &rooms,
            &[conn(10, 1, 2, "noord"), conn(11, 1, 3, "oost")],
        );
        let pick = graph.default_direction(1, 3);
        assert!(!graph.used_directions(1).contains(&pick.direction));
        assert_eq!(pick.direction, "zuid");
    }

    #[test]
    fn default_direction_flags_the_noord_fallback() {
        let rooms: Vec<Room> = (1..=9).map(|i| room(i, "Kamer")).collect();
        let connections: Vec<Connection> = DIRECTIONS
            .iter()
            .enumerate()
            .map(|(i, dir)| conn(20 + i as i64, 1, 2 + i as i64, dir))
            .collect();
        let graph = graph_with(&rooms, &connections);
        let pick = graph.default_direction(1, 2);
        assert_eq!(pick.direction, "noord");
        assert!(pick.exhausted);
    }

    #[test]
    fn cycling_picks_the_next_unused_direction_in_order() {
        let rooms = [room(1, "Hal"), room(2, "Kelder"), room(3, "Zolder")];
        let graph = graph_with(
            &rooms,
            &[conn(10, 1, 2, "noord"), conn(11, 1, 3, "oost")],
        );
        let next = graph.cycle_direction(&conn(10, 1, 2, "noord"));
        assert_eq!(next.as_deref(), Some("zuid"));
    }

    #[test]
    fn cycling_reports_exhaustion() {
        let rooms: Vec<Room> = (1..=9).map(|i| room(i, "Kamer")).collect();
        let connections: Vec<Connection> = DIRECTIONS
            .iter()
            .enumerate()
            .map(|(i, dir)| conn(20 + i as i64, 1, 2 + i as i64, dir))
            .collect();
        let graph = graph_with(&rooms, &connections);
        assert_eq!(graph.cycle_direction(&connections[0]), None);
    }

    #[test]
    fn explicit_picks_reject_taken_directions_but_allow_the_current_one() {
        let rooms = [room(1, "Hal"), room(2, "Kelder"), room(3, "Zolder")];
        let graph = graph_with(
            &rooms,
            &[conn(10, 1, 2, "noord"), conn(11, 1, 3, "oost")],
        );
        let c = conn(10, 1, 2, "noord");
        assert!(!graph.direction_available(&c, "oost"));
        assert!(graph.direction_available(&c, "noord"));
        assert!(graph.direction_available(&c, "west"));
    }

    #[rstest]
    #[case(Some(100.0), Some(50.0), 100.2, 49.9, None)]
    #[case(Some(100.0), Some(50.0), 101.0, 50.0, Some((101, 50)))]
    #[case(None, None, 0.0, 0.0, Some((0, 0)))]
    fn drag_release_only_persists_integer_changes(
        #[case] ox: Option<f64>,
        #[case] oy: Option<f64>,
        #[case] x: f32,
        #[case] y: f32,
        #[case] expected: Option<(i64, i64)>,
    ) {
        assert_eq!(position_update(ox, oy, x, y), expected);
    }

    #[test]
    fn rebuild_pins_rooms_with_server_positions() {
        let mut placed = room(1, "Hal");
        placed.pos_x = Some(120.0);
        placed.pos_y = Some(-40.0);
        let graph = graph_with(&[placed, room(2, "Kelder")], &[]);
        assert_eq!(graph.particles[0].fx, Some(120.0));
        assert_eq!(graph.particles[0].fy, Some(-40.0));
        assert_eq!(graph.particles[1].fx, None);
    }
}
