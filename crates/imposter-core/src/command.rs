//! Command metadata shared by every game command.

use uuid::Uuid;

/// A request to change a room, issued by one player.
pub trait Command: Send + Sync + std::fmt::Debug {
    /// Dotted name used in logs, e.g. `game.submit_vote`.
    fn command_type(&self) -> &'static str;

    /// Correlation ID to trace this command through the system.
    fn correlation_id(&self) -> Uuid;

    /// Room the command targets; `None` for commands that create one.
    fn room_id(&self) -> Option<Uuid>;

    /// Uid of the player issuing the command.
    fn actor_id(&self) -> &str;
}
