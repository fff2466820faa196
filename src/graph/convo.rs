//! Read-only graph of a conversation's dialogue tree.
//!
//! The `structure` JSON holds `{start_node, nodes: {id: {...}}}`. Options
//! nodes branch per player choice, question nodes branch on correct/incorrect,
//! and anything else may chain through a plain `next_node`.

use std::collections::HashMap;

use serde_json::Value;

use super::sim::{ForceSim, Particle, SimLink};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConvoNodeKind {
    Options,
    Question,
    Other(String),
}

impl ConvoNodeKind {
    fn from_type(raw: Option<&str>) -> Self {
        match raw {
            None | Some("options") => ConvoNodeKind::Options,
            Some("question") => ConvoNodeKind::Question,
            Some(other) => ConvoNodeKind::Other(other.to_owned()),
        }
    }
}

pub struct ConvoNode {
    pub id: String,
    pub kind: ConvoNodeKind,
    pub text: String,
    pub is_start: bool,
}

pub struct ConvoLink {
    pub source: usize,
    pub target: usize,
    pub label: String,
}

#[derive(Default)]
pub struct ConvoGraph {
    pub nodes: Vec<ConvoNode>,
    pub links: Vec<ConvoLink>,
    pub particles: Vec<Particle>,
    pub sim: ForceSim,
    pub highlighted: Option<usize>,
}

impl ConvoGraph {
    pub fn build(structure: &Value) -> Self {
        let mut graph = ConvoGraph::default();
        let Some(nodes) = structure.get("nodes").and_then(Value::as_object) else {
            return graph;
        };
        let start = structure.get("start_node").and_then(Value::as_str);

        let mut index = HashMap::new();
        for (id, data) in nodes {
            let kind = ConvoNodeKind::from_type(data.get("type").and_then(Value::as_str));
            let npc_text = data
                .get("npc_text")
                .and_then(Value::as_str)
                .map(str::to_owned)
                .unwrap_or_else(|| format!("Node: {id}"));
            let text = match &kind {
                ConvoNodeKind::Question => {
                    let question = data
                        .get("question_text")
                        .and_then(Value::as_str)
                        .unwrap_or(&npc_text);
                    format!("[Q] {question}")
                }
                _ => truncate(&npc_text, 50),
            };
            index.insert(id.clone(), graph.nodes.len());
            graph.particles.push(Particle::at(
                (graph.nodes.len() as f32 * 41.0) % 140.0 - 70.0,
                (graph.nodes.len() as f32 * 59.0) % 140.0 - 70.0,
            ));
            graph.nodes.push(ConvoNode {
                id: id.clone(),
                kind,
                text,
                is_start: start == Some(id.as_str()),
            });
        }

        for (id, data) in nodes {
            let Some(&source) = index.get(id) else {
                continue;
            };
            let kind = &graph.nodes[source].kind;
            match kind {
                ConvoNodeKind::Options => {
                    if let Some(options) = data.get("options").and_then(Value::as_array) {
                        for option in options {
                            let target = option.get("next_node").and_then(Value::as_str);
                            if let Some(&target) = target.and_then(|t| index.get(t)) {
                                let label = option
                                    .get("text")
                                    .and_then(Value::as_str)
                                    .unwrap_or_default();
                                graph.links.push(ConvoLink {
                                    source,
                                    target,
                                    label: truncate(label, 20),
                                });
                            }
                        }
                    }
                }
                ConvoNodeKind::Question => {
                    for (field, label) in [
                        ("next_node_correct", "Correct"),
                        ("next_node_incorrect", "Incorrect"),
                    ] {
                        let target = data.get(field).and_then(Value::as_str);
                        if let Some(&target) = target.and_then(|t| index.get(t)) {
                            graph.links.push(ConvoLink {
                                source,
                                target,
                                label: label.to_owned(),
                            });
                        }
                    }
                }
                ConvoNodeKind::Other(_) => {
                    let target = data.get("next_node").and_then(Value::as_str);
                    if let Some(&target) = target.and_then(|t| index.get(t)) {
                        graph.links.push(ConvoLink {
                            source,
                            target,
                            label: "Next".to_owned(),
                        });
                    }
                }
            }
        }

        graph.sim.restart();
        graph
    }

    pub fn sim_links(&self) -> Vec<SimLink> {
        self.links
            .iter()
            .map(|l| SimLink {
                source: l.source,
                target: l.target,
            })
            .collect()
    }

    pub fn tick(&mut self) {
        let links = self.sim_links();
        self.sim.tick(&mut self.particles, &links);
    }
}

/// Character offset of a node's definition inside the structure's JSON text,
/// used to jump the editor caret when a graph node is clicked.
pub fn definition_offset(source_text: &str, node_id: &str) -> Option<usize> {
    let needle = format!("\"{node_id}\"");
    let mut from = 0;
    while let Some(found) = source_text[from..].find(&needle) {
        let at = from + found;
        let rest = &source_text[at + needle.len()..];
        if rest.trim_start().starts_with(':') {
            return Some(at);
        }
        from = at + needle.len();
    }
    None
}

fn truncate(text: &str, max: usize) -> String {
    let count = text.chars().count();
    if count <= max {
        text.to_owned()
    } else {
        let cut: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{cut}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn structure() -> Value {
        json!({
            "start_node": "begroeting",
            "nodes": {
                "begroeting": {
                    "type": "options",
                    "npc_text": "Welkom in de herberg, reiziger!",
                    "options": [
                        {"text": "Vertel me over het kasteel en de verdwenen sleutel", "next_node": "raadsel"},
                        {"text": "Tot ziens", "next_node": null}
                    ]
                },
                "raadsel": {
                    "type": "question",
                    "question_text": "Wat is het wachtwoord?",
                    "next_node_correct": "einde",
                    "next_node_incorrect": "begroeting"
                },
                "einde": {
                    "type": "farewell",
                    "npc_text": "Veel succes!",
                    "next_node": "begroeting"
                }
            }
        })
    }

    fn find(graph: &ConvoGraph, id: &str) -> usize {
        graph.nodes.iter().position(|n| n.id == id).unwrap()
    }

    #[test]
    fn nodes_carry_type_text_and_start_marker() {
        let graph = ConvoGraph::build(&structure());
        assert_eq!(graph.nodes.len(), 3);
        let start = &graph.nodes[find(&graph, "begroeting")];
        assert!(start.is_start);
        assert_eq!(start.kind, ConvoNodeKind::Options);
        let question = &graph.nodes[find(&graph, "raadsel")];
        assert_eq!(question.text, "[Q] Wat is het wachtwoord?");
    }

    #[test]
    fn option_links_use_truncated_choice_text_and_skip_dead_ends() {
        let graph = ConvoGraph::build(&structure());
        let begroeting = find(&graph, "begroeting");
        let outgoing: Vec<_> = graph.links.iter().filter(|l| l.source == begroeting).collect();
        // The "Tot ziens" option has no target, so only one link exists.
        assert_eq!(outgoing.len(), 1);
        assert_eq!(outgoing[0].label, "Vertel me over he...");
        assert_eq!(outgoing[0].target, find(&graph, "raadsel"));
    }

    #[test]
    fn question_links_are_labelled_correct_and_incorrect() {
        let graph = ConvoGraph::build(&structure());
        let raadsel = find(&graph, "raadsel");
        let labels: Vec<_> = graph
            .links
            .iter()
            .filter(|l| l.source == raadsel)
            .map(|l| l.label.as_str())
            .collect();
        assert_eq!(labels, vec!["Correct", "Incorrect"]);
    }

    #[test]
    fn other_nodes_chain_through_next_node() {
        let graph = ConvoGraph::build(&structure());
        let einde = find(&graph, "einde");
        let link = graph.links.iter().find(|l| l.source == einde).unwrap();
        assert_eq!(link.label, "Next");
        assert_eq!(link.target, find(&graph, "begroeting"));
    }

    #[test]
    fn missing_structure_produces_an_empty_graph() {
        let graph = ConvoGraph::build(&json!({"start_node": "x"}));
        assert!(graph.nodes.is_empty());
        assert!(graph.links.is_empty());
    }

    #[test]
    fn definition_offset_finds_the_node_key_not_a_reference() {
        let text = serde_json::to_string_pretty(&structure()).unwrap();
        let offset = definition_offset(&text, "raadsel").unwrap();
        // The match must be the key of the definition, i.e. followed by ':'.
        assert!(text[offset..].starts_with("\"raadsel\""));
        let reference = text.find("\"next_node\": \"begroeting\"");
        let definition = definition_offset(&text, "begroeting").unwrap();
        assert_ne!(Some(definition), reference);
    }
}
