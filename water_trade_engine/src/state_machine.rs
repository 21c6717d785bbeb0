//! The negotiation transition table.
//!
//! The rule that generates the whole table: **the side that did NOT put the current terms on the table is the only
//! side entitled to respond**, and it may accept, counter, or decline. Accept and decline end the back-and-forth;
//! a counter hands the table back to the other side and advances the round.
//!
//! | Current status        | Permitted actor | accept | counter | decline |
//! |-----------------------|-----------------|--------|---------|---------|
//! | `OFFERED`             | seller | `ACCEPTED_PENDING_BUYER_SIGNATURE` | `COUNTERED_BY_SELLER` | `DECLINED` |
//! | `COUNTERED_BY_BUYER`  | seller | `ACCEPTED_PENDING_BUYER_SIGNATURE` | `COUNTERED_BY_SELLER` | `DECLINED` |
//! | `COUNTERED_BY_SELLER` | buyer  | —      | `COUNTERED_BY_BUYER` | `DECLINED` |
//! | `ACCEPTED_PENDING_BUYER_SIGNATURE` | — | — | — | — |
//! | `DECLINED`            | —      | —      | —       | —       |
//!
//! Note the asymmetry: a buyer facing a seller counter cannot "accept" through this table. Acceptance of a seller
//! counter happens by the buyer signing, which belongs to the signature subsystem, not the negotiation.
//!
//! Everything here is pure. The functions decide what *would* happen; making it happen atomically is the storage
//! layer's job.
use crate::db_types::{EventKind, TradeRole, TradeStatus};

/// A transition request that the table rejects. Wrong role and wrong state are deliberately collapsed into the one
/// variant: callers surface both as a generic Forbidden, and the message carries enough detail for the parties
/// (who can already see the trade's status) without leaking anything to outsiders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidTransition {
    pub status: TradeStatus,
    pub actor: TradeRole,
    pub kind: EventKind,
}

impl std::fmt::Display for InvalidTransition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} may not {} a trade in status {}", self.actor, self.kind, self.status)
    }
}

impl std::error::Error for InvalidTransition {}

/// The side entitled to act in the given status, or `None` for terminal statuses.
pub const fn responder(status: TradeStatus) -> Option<TradeRole> {
    match status {
        TradeStatus::Offered | TradeStatus::CounteredByBuyer => Some(TradeRole::Seller),
        TradeStatus::CounteredBySeller => Some(TradeRole::Buyer),
        TradeStatus::AcceptedPendingBuyerSignature | TradeStatus::Declined => None,
    }
}

/// True once no further negotiation transition is possible.
pub const fn is_terminal(status: TradeStatus) -> bool {
    matches!(status, TradeStatus::AcceptedPendingBuyerSignature | TradeStatus::Declined)
}

/// Resolve the next status for `(status, actor, kind)`, or reject the request.
///
/// `EventKind::Offer` never appears here: the initiating offer creates the trade rather than transitioning it.
pub fn next_status(status: TradeStatus, actor: TradeRole, kind: EventKind) -> Result<TradeStatus, InvalidTransition> {
    let reject = || InvalidTransition { status, actor, kind };
    if responder(status) != Some(actor) {
        return Err(reject());
    }
    match (actor, kind) {
        (TradeRole::Seller, EventKind::Accept) => Ok(TradeStatus::AcceptedPendingBuyerSignature),
        (TradeRole::Seller, EventKind::Counter) => Ok(TradeStatus::CounteredBySeller),
        (TradeRole::Buyer, EventKind::Counter) => Ok(TradeStatus::CounteredByBuyer),
        (_, EventKind::Decline) => Ok(TradeStatus::Declined),
        // Buyer-accept (signing) and any OFFER are not negotiation transitions
        (_, _) => Err(reject()),
    }
}
