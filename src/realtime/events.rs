use serde::{Deserialize, Serialize};

use crate::entity::{Message, Trade};

/// Push events delivered by the socket server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum RealtimeEvent {
    NewMessage(Message),
    NewTrade(Trade),
}

/// Commands published to the socket server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", content = "id", rename_all = "snake_case")]
pub enum RealtimeCommand {
    JoinChat(String),
    JoinTrade(String),
    LeaveChat(String),
    LeaveTrade(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Room {
    Chat(String),
    Trade(String),
}

impl RealtimeCommand {
    pub fn room(&self) -> Room {
        match self {
            RealtimeCommand::JoinChat(id) | RealtimeCommand::LeaveChat(id) => Room::Chat(id.clone()),
            RealtimeCommand::JoinTrade(id) | RealtimeCommand::LeaveTrade(id) => {
                Room::Trade(id.clone())
            }
        }
    }

    pub fn is_join(&self) -> bool {
        matches!(
            self,
            RealtimeCommand::JoinChat(_) | RealtimeCommand::JoinTrade(_)
        )
    }
}
