//! Clients for the external custody collaborators.
//!
//! Two services sit on the other side of this crate: the signing gateway,
//! which holds the custodial keys and executes approved trade intents, and
//! the policy registrar, which stores declarative defense-in-depth rules.
//! Both are reached over plain JSON HTTP and both sit behind traits so the
//! engine depends only on their contracts, never on a custody protocol.

/// Gateway errors.
pub mod error;
/// Policy registrar client.
pub mod registrar;
/// Signing gateway client.
pub mod signing;

pub use error::GatewayError;
pub use registrar::{
    DryRunPolicyRegistrar, HttpPolicyRegistrar, PolicyRegistrar, RuleKind, RuleReceipt,
    RuleSubmission,
};
pub use signing::{
    DryRunSigningGateway, HttpSigningGateway, SignedExecution, SigningGateway, TradeIntent,
};
