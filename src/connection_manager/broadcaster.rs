use crate::protocol::{Envelope, Event, UserId};

/// The capability other subsystems use to reach connected users.
///
/// Handlers depend on this trait rather than on the registry so they can be
/// exercised with a recording fake. All methods are non-blocking.
pub trait Broadcaster: Send + Sync {
    /// Deliver an envelope to every live connection of its recipient.
    /// Offline recipients are a silent no-op.
    fn broadcast(&self, envelope: Envelope);

    /// Build one envelope per recipient and broadcast each. Delivery is
    /// best-effort per recipient; nothing is rolled back.
    fn broadcast_to_users(&self, user_ids: &[UserId], event: Event) {
        for &user_id in user_ids {
            self.broadcast(Envelope::new(user_id, event.clone()));
        }
    }

    fn is_user_online(&self, user_id: UserId) -> bool;
}
