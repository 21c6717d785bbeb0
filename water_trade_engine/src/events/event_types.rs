use serde::{Deserialize, Serialize};

use crate::db_types::{EventKind, Trade, TradeRole};

/// Published after a trade mutation has committed. Carries the post-transition record.
///
/// Subscribers run on their own tasks; nothing they do (or fail to do) can affect the transition that already
/// happened. The notification dispatcher is the main consumer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeTransitionEvent {
    pub trade: Trade,
    pub kind: EventKind,
    pub actor: TradeRole,
}

impl TradeTransitionEvent {
    pub fn new(trade: Trade, kind: EventKind, actor: TradeRole) -> Self {
        Self { trade, kind, actor }
    }

    /// The party who should hear about this transition.
    pub fn counterparty(&self) -> TradeRole {
        self.actor.counterparty()
    }
}
