//! Force-directed graph views: the room map and the conversation tree.

pub mod convo;
pub mod rooms;
pub mod sim;
pub mod view;
