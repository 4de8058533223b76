use std::collections::HashMap;
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::metrics::HubMetrics;
use crate::protocol::{Envelope, UserId};
use crate::websocket::OutboundMessage;

use super::broadcaster::Broadcaster;
use super::stats::ConnectionStats;
use super::types::{ConnectionHandle, EnqueueError};

/// Registry of live connections, keyed by user.
///
/// A user's entry exists only while the user owns at least one connection,
/// so presence is a single map lookup. Every operation touches one user's
/// entry under that key's shard lock and never holds it while enqueueing or
/// tearing a connection down.
pub struct ConnectionManager {
    /// user_id -> (connection_id -> handle)
    users: DashMap<UserId, HashMap<Uuid, Arc<ConnectionHandle>>>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self {
            users: DashMap::new(),
        }
    }

    /// Register a new connection for a user
    pub fn register(
        &self,
        user_id: UserId,
        sender: mpsc::Sender<OutboundMessage>,
    ) -> Arc<ConnectionHandle> {
        let handle = Arc::new(ConnectionHandle::new(user_id, sender));

        let came_online = {
            let mut connections = self.users.entry(user_id).or_default();
            connections.insert(handle.id, handle.clone());
            connections.len() == 1
        };

        HubMetrics::record_registered(came_online);

        tracing::debug!(
            connection_id = %handle.id,
            user_id = user_id,
            came_online = came_online,
            "Connection registered"
        );

        handle
    }

    /// Remove a connection. Returns the handle if it was still registered;
    /// later calls for the same connection are no-ops.
    pub fn unregister(&self, user_id: UserId, connection_id: Uuid) -> Option<Arc<ConnectionHandle>> {
        let (removed, went_offline) = match self.users.entry(user_id) {
            Entry::Occupied(mut entry) => {
                let removed = entry.get_mut().remove(&connection_id);
                let went_offline = removed.is_some() && entry.get().is_empty();
                if went_offline {
                    entry.remove();
                }
                (removed, went_offline)
            }
            Entry::Vacant(_) => (None, false),
        };

        let handle = removed?;
        handle.close();
        HubMetrics::record_unregistered(went_offline);

        tracing::debug!(
            connection_id = %connection_id,
            user_id = user_id,
            went_offline = went_offline,
            "Connection unregistered"
        );

        Some(handle)
    }

    /// Close a connection and drop it from the registry
    pub fn disconnect(&self, handle: &ConnectionHandle) {
        handle.close();
        self.unregister(handle.user_id, handle.id);
    }

    /// Whether the user currently owns at least one connection
    pub fn is_user_online(&self, user_id: UserId) -> bool {
        self.users
            .get(&user_id)
            .map(|connections| !connections.is_empty())
            .unwrap_or(false)
    }

    /// Snapshot of a user's connections; the lock is released before returning
    pub fn get_user_connections(&self, user_id: UserId) -> Vec<Arc<ConnectionHandle>> {
        self.users
            .get(&user_id)
            .map(|connections| connections.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn user_connection_count(&self, user_id: UserId) -> usize {
        self.users
            .get(&user_id)
            .map(|connections| connections.len())
            .unwrap_or(0)
    }

    /// All users with at least one live connection
    pub fn online_users(&self) -> Vec<UserId> {
        self.users.iter().map(|entry| *entry.key()).collect()
    }

    /// Enqueue an envelope on every connection of its recipient.
    ///
    /// Returns the number of connections that accepted the frame. Offline
    /// recipients are a silent no-op. A connection whose queue is full is
    /// treated as dead and disconnected.
    pub fn deliver(&self, envelope: &Envelope) -> usize {
        let connections = self.get_user_connections(envelope.recipient_id);
        if connections.is_empty() {
            tracing::trace!(
                user_id = envelope.recipient_id,
                event_type = %envelope.event_type(),
                "Recipient offline, event not delivered"
            );
            return 0;
        }

        let message = match OutboundMessage::preserialized(envelope) {
            Ok(m) => m,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    event_type = %envelope.event_type(),
                    "Failed to serialize envelope"
                );
                return 0;
            }
        };

        let mut delivered = 0;
        for handle in connections {
            match handle.try_send(message.clone()) {
                Ok(()) => delivered += 1,
                Err(EnqueueError::Full) => {
                    tracing::warn!(
                        connection_id = %handle.id,
                        user_id = handle.user_id,
                        event_type = %envelope.event_type(),
                        "Outbound queue full, disconnecting slow connection"
                    );
                    HubMetrics::record_slow_disconnect();
                    self.disconnect(&handle);
                }
                Err(EnqueueError::Closed) => {
                    tracing::debug!(
                        connection_id = %handle.id,
                        user_id = handle.user_id,
                        "Connection closing, dropping event"
                    );
                    self.unregister(handle.user_id, handle.id);
                }
            }
        }

        HubMetrics::record_enqueued(envelope.event_type(), delivered as u64);
        delivered
    }

    /// Disconnect every connection; used on shutdown
    pub fn close_all(&self) -> usize {
        let handles: Vec<Arc<ConnectionHandle>> = self
            .users
            .iter()
            .flat_map(|entry| entry.value().values().cloned().collect::<Vec<_>>())
            .collect();

        for handle in &handles {
            self.disconnect(handle);
        }

        handles.len()
    }

    /// Get statistics
    pub fn stats(&self) -> ConnectionStats {
        let total_connections = self.users.iter().map(|entry| entry.value().len()).sum();

        ConnectionStats {
            total_connections,
            online_users: self.users.len(),
        }
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl Broadcaster for ConnectionManager {
    fn broadcast(&self, envelope: Envelope) {
        self.deliver(&envelope);
    }

    fn is_user_online(&self, user_id: UserId) -> bool {
        ConnectionManager::is_user_online(self, user_id)
    }
}
