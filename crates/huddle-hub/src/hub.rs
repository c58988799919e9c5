//! The hub actor: one Tokio task owning all connection state.
//!
//! Presence, room membership, and the outbound channel roster live in
//! a single task, reached through an mpsc command channel. One owner
//! means no locks and no ordering surprises: a registration and the
//! presence broadcast it triggers are processed back to back, so every
//! connection observes the same event order.

use std::collections::{HashMap, HashSet};

use huddle_protocol::{event, now_millis, ConnectionId, Frame, RoomName, UserId};
use serde_json::json;
use tokio::sync::{mpsc, oneshot};

use crate::{HubError, PresenceRegistry, RoomRegistry};

/// Commands queue up under load; deliveries themselves are unbounded
/// and never block the actor.
const COMMAND_CHANNEL_SIZE: usize = 64;

/// Channel sender for delivering outbound frames to a connection's
/// write loop.
pub type FrameSender = mpsc::UnboundedSender<Frame>;

/// Commands sent to the hub through its channel.
///
/// Variants with a `oneshot::Sender` are request/reply; the rest are
/// fire-and-forget and rely on the channel's FIFO order for their
/// effects to land before any later query.
pub(crate) enum HubCommand {
    /// Announce an authenticated connection and hand over its
    /// outbound channel.
    Register {
        conn: ConnectionId,
        user: UserId,
        sender: FrameSender,
    },

    /// Remove a connection and tear down everything it held.
    Unregister { conn: ConnectionId },

    /// Add a connection to a room.
    Join {
        conn: ConnectionId,
        room: RoomName,
        reply: oneshot::Sender<Result<(), HubError>>,
    },

    /// Remove a connection from a room.
    Leave {
        conn: ConnectionId,
        room: RoomName,
        reply: oneshot::Sender<Result<(), HubError>>,
    },

    /// Deliver a frame to every member of a room.
    Broadcast {
        room: RoomName,
        frame: Frame,
        exclude: Option<UserId>,
    },

    /// Deliver a frame to every connection a user holds open.
    NotifyUser { user: UserId, frame: Frame },

    /// Request the list of online users.
    OnlineUsers {
        reply: oneshot::Sender<Vec<UserId>>,
    },

    /// Request the distinct users present in a room.
    MembersOf {
        room: RoomName,
        reply: oneshot::Sender<Vec<UserId>>,
    },

    /// Shut the hub down.
    Shutdown,
}

/// What the hub knows about one registered connection.
struct RosterEntry {
    user: UserId,
    sender: FrameSender,
}

/// Handle to the running hub. Cheap to clone; every connection
/// handler and the application side hold one.
#[derive(Clone)]
pub struct HubHandle {
    sender: mpsc::Sender<HubCommand>,
}

impl HubHandle {
    /// Registers an authenticated connection with the hub.
    ///
    /// The hub acks with a `connected` frame on `sender` and, if this
    /// is the user's first connection, announces `user:online` to
    /// everyone else.
    pub async fn register(
        &self,
        conn: ConnectionId,
        user: UserId,
        sender: FrameSender,
    ) -> Result<(), HubError> {
        self.sender
            .send(HubCommand::Register { conn, user, sender })
            .await
            .map_err(|_| HubError::Unavailable)
    }

    /// Removes a connection: leaves all its rooms (notifying each) and
    /// announces `user:offline` if it was the user's last one.
    pub async fn unregister(&self, conn: ConnectionId) -> Result<(), HubError> {
        self.sender
            .send(HubCommand::Unregister { conn })
            .await
            .map_err(|_| HubError::Unavailable)
    }

    /// Adds a connection to a room and waits for the result.
    pub async fn join(&self, conn: ConnectionId, room: RoomName) -> Result<(), HubError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(HubCommand::Join {
                conn,
                room,
                reply: reply_tx,
            })
            .await
            .map_err(|_| HubError::Unavailable)?;
        reply_rx.await.map_err(|_| HubError::Unavailable)?
    }

    /// Removes a connection from a room and waits for the result.
    pub async fn leave(&self, conn: ConnectionId, room: RoomName) -> Result<(), HubError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(HubCommand::Leave {
                conn,
                room,
                reply: reply_tx,
            })
            .await
            .map_err(|_| HubError::Unavailable)?;
        reply_rx.await.map_err(|_| HubError::Unavailable)?
    }

    /// Sends a frame to every member of `room` (fire-and-forget).
    ///
    /// With `exclude` set, every connection belonging to that user is
    /// skipped, not just one of them. Broadcasting to a room nobody is
    /// in succeeds and delivers nothing.
    pub async fn broadcast_to_room(
        &self,
        room: RoomName,
        frame: Frame,
        exclude: Option<UserId>,
    ) -> Result<(), HubError> {
        self.sender
            .send(HubCommand::Broadcast {
                room,
                frame,
                exclude,
            })
            .await
            .map_err(|_| HubError::Unavailable)
    }

    /// Sends a frame to every connection `user` holds open
    /// (fire-and-forget). Offline users receive nothing.
    pub async fn notify_user(&self, user: UserId, frame: Frame) -> Result<(), HubError> {
        self.sender
            .send(HubCommand::NotifyUser { user, frame })
            .await
            .map_err(|_| HubError::Unavailable)
    }

    /// Lists the users with at least one live connection.
    pub async fn online_users(&self) -> Result<Vec<UserId>, HubError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(HubCommand::OnlineUsers { reply: reply_tx })
            .await
            .map_err(|_| HubError::Unavailable)?;
        reply_rx.await.map_err(|_| HubError::Unavailable)
    }

    /// Lists the distinct users currently in `room`.
    pub async fn members_of(&self, room: RoomName) -> Result<Vec<UserId>, HubError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(HubCommand::MembersOf {
                room,
                reply: reply_tx,
            })
            .await
            .map_err(|_| HubError::Unavailable)?;
        reply_rx.await.map_err(|_| HubError::Unavailable)
    }

    /// Tells the hub to shut down.
    pub async fn shutdown(&self) -> Result<(), HubError> {
        self.sender
            .send(HubCommand::Shutdown)
            .await
            .map_err(|_| HubError::Unavailable)
    }
}

/// The internal hub state. Runs inside a Tokio task.
struct HubActor {
    /// Outbound channel and owner of every live connection.
    roster: HashMap<ConnectionId, RosterEntry>,
    presence: PresenceRegistry,
    rooms: RoomRegistry,
    receiver: mpsc::Receiver<HubCommand>,
}

impl HubActor {
    /// Runs the actor loop, processing commands until shutdown.
    async fn run(mut self) {
        tracing::info!("hub started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                HubCommand::Register { conn, user, sender } => {
                    self.handle_register(conn, user, sender);
                }
                HubCommand::Unregister { conn } => {
                    self.handle_unregister(conn);
                }
                HubCommand::Join { conn, room, reply } => {
                    let result = self.handle_join(conn, room);
                    let _ = reply.send(result);
                }
                HubCommand::Leave { conn, room, reply } => {
                    let result = self.handle_leave(conn, room);
                    let _ = reply.send(result);
                }
                HubCommand::Broadcast {
                    room,
                    frame,
                    exclude,
                } => {
                    self.deliver_room(&room, &frame, None, exclude.as_ref());
                }
                HubCommand::NotifyUser { user, frame } => {
                    self.deliver_room(&RoomName::user(&user), &frame, None, None);
                }
                HubCommand::OnlineUsers { reply } => {
                    let _ = reply.send(self.presence.online_users());
                }
                HubCommand::MembersOf { room, reply } => {
                    let _ = reply.send(self.members_of(&room));
                }
                HubCommand::Shutdown => {
                    tracing::info!(
                        connections = self.roster.len(),
                        "hub shutting down"
                    );
                    break;
                }
            }
        }

        tracing::info!("hub stopped");
    }

    fn handle_register(&mut self, conn: ConnectionId, user: UserId, sender: FrameSender) {
        self.roster.insert(
            conn,
            RosterEntry {
                user: user.clone(),
                sender,
            },
        );
        let came_online = self.presence.register(&user, conn);

        // Every connection sits in its user's private room, which
        // makes notify_user an ordinary room delivery.
        self.rooms.join(conn, RoomName::user(&user));

        tracing::info!(
            %conn,
            user = %user,
            connections = self.presence.connection_count(&user),
            "connection registered"
        );

        self.send_to(
            conn,
            Frame::new(
                event::CONNECTED,
                json!({ "userId": user, "timestamp": now_millis() }),
            ),
        );

        if came_online {
            let frame = Frame::new(
                event::USER_ONLINE,
                json!({ "userId": user, "timestamp": now_millis() }),
            );
            self.deliver_all(&frame, Some(&user));
        }
    }

    fn handle_unregister(&mut self, conn: ConnectionId) {
        let Some(entry) = self.roster.remove(&conn) else {
            tracing::debug!(%conn, "unregister for unknown connection, ignoring");
            return;
        };

        // Leave every room first so the membership notifications go
        // out while the user still counts as online.
        for room in self.rooms.remove_connection(conn) {
            if let Some((scope, id)) = room.entity() {
                let frame = Frame::new(
                    scope.left_event(),
                    json!({
                        "userId": entry.user,
                        "entityId": id,
                        "timestamp": now_millis(),
                    }),
                );
                self.deliver_room(&room, &frame, None, None);
            }
        }

        let went_offline = self.presence.unregister(&entry.user, conn);
        tracing::info!(
            %conn,
            user = %entry.user,
            connections = self.presence.connection_count(&entry.user),
            "connection unregistered"
        );

        if went_offline {
            let frame = Frame::new(
                event::USER_OFFLINE,
                json!({ "userId": entry.user, "timestamp": now_millis() }),
            );
            self.deliver_all(&frame, Some(&entry.user));
        }
    }

    fn handle_join(&mut self, conn: ConnectionId, room: RoomName) -> Result<(), HubError> {
        let Some(entry) = self.roster.get(&conn) else {
            return Err(HubError::UnknownConnection(conn));
        };
        let user = entry.user.clone();

        // Re-joining is a no-op: no second notification.
        if !self.rooms.join(conn, room.clone()) {
            return Ok(());
        }
        tracing::debug!(%conn, user = %user, room = %room, "joined room");

        if let Some((scope, id)) = room.entity() {
            let frame = Frame::new(
                scope.joined_event(),
                json!({
                    "userId": user,
                    "entityId": id,
                    "timestamp": now_millis(),
                }),
            );
            // Skip the joining connection itself; the user's other
            // connections do hear about it.
            self.deliver_room(&room, &frame, Some(conn), None);
        }
        Ok(())
    }

    fn handle_leave(&mut self, conn: ConnectionId, room: RoomName) -> Result<(), HubError> {
        let Some(entry) = self.roster.get(&conn) else {
            return Err(HubError::UnknownConnection(conn));
        };
        let user = entry.user.clone();

        if !self.rooms.leave(conn, &room) {
            return Ok(());
        }
        tracing::debug!(%conn, user = %user, room = %room, "left room");

        if let Some((scope, id)) = room.entity() {
            let frame = Frame::new(
                scope.left_event(),
                json!({
                    "userId": user,
                    "entityId": id,
                    "timestamp": now_millis(),
                }),
            );
            // Already out of the room, so this reaches only the
            // remaining members.
            self.deliver_room(&room, &frame, None, None);
        }
        Ok(())
    }

    /// Distinct users in a room. Two connections of the same user
    /// count once.
    fn members_of(&self, room: &RoomName) -> Vec<UserId> {
        let Some(members) = self.rooms.members(room) else {
            return Vec::new();
        };
        let users: HashSet<&UserId> = members
            .iter()
            .filter_map(|conn| self.roster.get(conn))
            .map(|entry| &entry.user)
            .collect();
        users.into_iter().cloned().collect()
    }

    /// Delivers a frame to the members of `room`, minus `skip` (one
    /// connection) and minus every connection of `exclude` (a user).
    fn deliver_room(
        &self,
        room: &RoomName,
        frame: &Frame,
        skip: Option<ConnectionId>,
        exclude: Option<&UserId>,
    ) {
        let Some(members) = self.rooms.members(room) else {
            return;
        };
        for &conn in members {
            if skip == Some(conn) {
                continue;
            }
            let Some(entry) = self.roster.get(&conn) else {
                continue;
            };
            if exclude == Some(&entry.user) {
                continue;
            }
            if entry.sender.send(frame.clone()).is_err() {
                tracing::debug!(%conn, "outbound channel closed, dropping frame");
            }
        }
    }

    /// Delivers a frame to every registered connection, minus every
    /// connection of `exclude`.
    fn deliver_all(&self, frame: &Frame, exclude: Option<&UserId>) {
        for (conn, entry) in &self.roster {
            if exclude == Some(&entry.user) {
                continue;
            }
            if entry.sender.send(frame.clone()).is_err() {
                tracing::debug!(conn = %conn, "outbound channel closed, dropping frame");
            }
        }
    }

    /// Sends a frame to one connection. Silently drops if the
    /// receiver is gone (connection mid-teardown).
    fn send_to(&self, conn: ConnectionId, frame: Frame) {
        if let Some(entry) = self.roster.get(&conn) {
            if entry.sender.send(frame).is_err() {
                tracing::debug!(%conn, "outbound channel closed, dropping frame");
            }
        }
    }
}

/// Spawns the hub task and returns a handle to communicate with it.
pub fn spawn_hub() -> HubHandle {
    let (tx, rx) = mpsc::channel(COMMAND_CHANNEL_SIZE);

    let actor = HubActor {
        roster: HashMap::new(),
        presence: PresenceRegistry::new(),
        rooms: RoomRegistry::new(),
        receiver: rx,
    };

    tokio::spawn(actor.run());

    HubHandle { sender: tx }
}
