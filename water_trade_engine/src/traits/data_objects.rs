use crate::{
    db_types::{EventKind, SignStatus, TradeRole, TradeStatus},
    trade_api::trade_objects::CounterTerms,
};

/// Everything a backend needs to execute one negotiation transition as a single conditional write.
///
/// The write must be conditioned on `expected_status` (the status the engine observed when it validated the
/// transition) so that of two racing writers, exactly one succeeds. Round
/// arithmetic is derived from `kind`, version always increments, and the matching audit event is appended in the
/// same database transaction.
#[derive(Debug, Clone)]
pub struct TradeMutation {
    pub expected_status: TradeStatus,
    pub next_status: TradeStatus,
    pub actor: TradeRole,
    pub kind: EventKind,
    /// Replacement terms; present exactly when `kind` is `Counter`.
    pub new_terms: Option<CounterTerms>,
    /// `(seller, buyer)` signature statuses to set; present exactly when `kind` is `Accept`.
    pub sign_statuses: Option<(SignStatus, SignStatus)>,
}
