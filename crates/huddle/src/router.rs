//! Event routing: inbound frame names to parsed commands.
//!
//! The gateway accepts a fixed set of client events, so routing is a
//! lookup in a table built once at startup. Everything not in the
//! table is logged at debug level and ignored; a known event with a
//! payload that does not parse is dropped the same way. Neither case
//! ends the connection, because clients update on their own schedule
//! and will sometimes speak a slightly different dialect.

use std::collections::HashMap;

use huddle_protocol::{
    event, ClientCommand, EntityRef, EntityScope, Frame, ProtocolError, TypingRequest,
};
use serde_json::Value;

/// Parses one event's payload into a typed command.
type PayloadParser = fn(Value) -> Result<ClientCommand, ProtocolError>;

/// Dispatch table from event name to payload parser.
///
/// Built once and shared read-only by every connection handler.
pub struct EventRouter {
    routes: HashMap<&'static str, PayloadParser>,
}

impl EventRouter {
    /// Builds the table with every event the gateway handles.
    pub fn new() -> Self {
        let mut routes: HashMap<&'static str, PayloadParser> = HashMap::new();
        routes.insert(event::JOIN_PROJECT, parse_join_project);
        routes.insert(event::JOIN_TASK, parse_join_task);
        routes.insert(event::LEAVE_PROJECT, parse_leave_project);
        routes.insert(event::LEAVE_TASK, parse_leave_task);
        routes.insert(event::TYPING, parse_typing);
        Self { routes }
    }

    /// Routes a decoded frame to its parser.
    ///
    /// Returns `None` for events with no route and for payloads that
    /// fail to parse; both are logged and swallowed here so the
    /// caller's loop just moves on to the next frame.
    pub fn dispatch(&self, frame: Frame) -> Option<ClientCommand> {
        let Some(parser) = self.routes.get(frame.event.as_str()) else {
            tracing::debug!(event = %frame.event, "no route for event, ignoring");
            return None;
        };
        match parser(frame.data) {
            Ok(cmd) => Some(cmd),
            Err(e) => {
                tracing::debug!(
                    event = %frame.event,
                    error = %e,
                    "malformed payload, dropping frame"
                );
                None
            }
        }
    }
}

impl Default for EventRouter {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_join_project(data: Value) -> Result<ClientCommand, ProtocolError> {
    let entity: EntityRef = parse(data)?;
    Ok(ClientCommand::Join {
        scope: EntityScope::Project,
        id: entity.id,
    })
}

fn parse_join_task(data: Value) -> Result<ClientCommand, ProtocolError> {
    let entity: EntityRef = parse(data)?;
    Ok(ClientCommand::Join {
        scope: EntityScope::Task,
        id: entity.id,
    })
}

fn parse_leave_project(data: Value) -> Result<ClientCommand, ProtocolError> {
    let entity: EntityRef = parse(data)?;
    Ok(ClientCommand::Leave {
        scope: EntityScope::Project,
        id: entity.id,
    })
}

fn parse_leave_task(data: Value) -> Result<ClientCommand, ProtocolError> {
    let entity: EntityRef = parse(data)?;
    Ok(ClientCommand::Leave {
        scope: EntityScope::Task,
        id: entity.id,
    })
}

fn parse_typing(data: Value) -> Result<ClientCommand, ProtocolError> {
    let req: TypingRequest = parse(data)?;
    Ok(ClientCommand::Typing {
        room: req.room_name,
        field: req.field,
        is_typing: req.is_typing,
    })
}

fn parse<T: serde::de::DeserializeOwned>(data: Value) -> Result<T, ProtocolError> {
    serde_json::from_value(data).map_err(ProtocolError::Decode)
}
