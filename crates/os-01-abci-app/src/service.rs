//! OrderStream ABCI service - consensus-side state machine
//!
//! Both mempool admission and block execution go through [`admit`], so
//! `check_tx` and `deliver_tx` apply the same rules in the same order:
//!
//! ```text
//! decode ─→ type ─→ payload ─→ signature ─→ quota / state rules
//! ```
//!
//! [`admit`]: OrderStreamApp::admit

use os_03_outbound_queue::OrderTracker;
use shared_types::codec;
use shared_types::{
    Address, BalanceChange, Hash, Order, OrderId, RebalanceProposal, Round, StakeWitness,
    TaggedOrder, Transaction,
};
use tracing::{debug, error, info, warn};

use crate::domain::{CommitState, QuotaPolicy, RejectReason, Verdict};
use crate::ports::{AbciApplication, BlockHeader, InfoResponse, NoopNotifier, OrderQueue, RebalancerNotifier};

/// ABCI application configuration.
#[derive(Clone, Debug)]
pub struct AbciConfig {
    /// Name reported by `info`.
    pub app_name: String,
    /// Version reported by `info`.
    pub version: String,
    /// Order quota enforcement.
    pub quota_policy: QuotaPolicy,
}

impl Default for AbciConfig {
    fn default() -> Self {
        Self {
            app_name: "OrderStream ABCI Application".to_string(),
            version: crate::VERSION.to_string(),
            quota_policy: QuotaPolicy::default(),
        }
    }
}

/// A transaction that passed admission.
#[derive(Debug, Clone)]
pub enum Admitted {
    /// Order with its recovered poster and content hash.
    Order {
        /// The order.
        order: Order,
        /// Recovered poster.
        poster: Address,
        /// Content hash.
        id: OrderId,
    },
    /// New stake witness.
    Stake(StakeWitness),
    /// Rebalance continuing the current round.
    Rebalance(RebalanceProposal),
}

impl Admitted {
    fn hint(&self) -> String {
        match self {
            Admitted::Order { id, .. } => id.to_string(),
            Admitted::Stake(w) => format!("stake {} {} at block {}", w.staker, w.amount, w.block),
            Admitted::Rebalance(p) => format!("rebalance to round {}", p.round.number),
        }
    }
}

/// The OrderStream state machine.
pub struct OrderStreamApp<Q = OrderTracker, N = NoopNotifier> {
    config: AbciConfig,
    state: CommitState,
    orders: Q,
    notifier: N,
    current_height: u64,
    accepted_rounds: Vec<Round>,
}

impl<Q: OrderQueue, N: RebalancerNotifier> OrderStreamApp<Q, N> {
    /// Application over an explicit initial state.
    pub fn new(config: AbciConfig, state: CommitState, orders: Q, notifier: N) -> Self {
        info!(
            "[os-01] ABCI application initialized (quota policy: {})",
            config.quota_policy
        );
        Self {
            config,
            state,
            orders,
            notifier,
            current_height: 0,
            accepted_rounds: Vec::new(),
        }
    }

    /// Current commit state.
    pub fn state(&self) -> &CommitState {
        &self.state
    }

    /// Order queue.
    pub fn orders(&self) -> &Q {
        &self.orders
    }

    /// Mutable order queue.
    pub fn orders_mut(&mut self) -> &mut Q {
        &mut self.orders
    }

    /// Height recorded by the last `begin_block`.
    pub fn current_height(&self) -> u64 {
        self.current_height
    }

    /// Validate a transaction against the current state without changing it.
    pub fn admit(&self, tx: &[u8]) -> Result<Admitted, RejectReason> {
        let envelope = codec::decode(tx).map_err(|_| RejectReason::Decompress)?;
        let kind = envelope
            .tx_kind()
            .map_err(|_| RejectReason::UnknownType(envelope.kind.clone()))?;
        let transaction = envelope.into_transaction().map_err(|e| RejectReason::Format {
            kind: kind.as_str(),
            detail: e.to_string(),
        })?;

        match transaction {
            Transaction::OrderBroadcast(order) => self.admit_order(order),
            Transaction::Stake(witness) => self.admit_stake(witness),
            Transaction::Rebalance(proposal) => self.admit_rebalance(proposal),
        }
    }

    fn admit_order(&self, order: Order) -> Result<Admitted, RejectReason> {
        let poster = order.recover_poster().map_err(|e| {
            debug!("[os-01] Poster recovery failed: {}", e);
            RejectReason::NoSigner
        })?;

        if self.config.quota_policy.is_enforced() {
            let remaining = self.state.limit_of(&poster).map_or(0, |l| l.order_limit);
            if remaining == 0 {
                return Err(RejectReason::NoQuota(poster));
            }
        }

        let id = order.order_id().map_err(|e| RejectReason::Format {
            kind: "OrderBroadcast",
            detail: e.to_string(),
        })?;
        Ok(Admitted::Order { order, poster, id })
    }

    fn admit_stake(&self, witness: StakeWitness) -> Result<Admitted, RejectReason> {
        if self.state.is_witnessed(witness.block, &witness.staker) {
            return Err(RejectReason::DuplicateWitness {
                block: witness.block,
                staker: witness.staker,
            });
        }
        Ok(Admitted::Stake(witness))
    }

    fn admit_rebalance(&self, proposal: RebalanceProposal) -> Result<Admitted, RejectReason> {
        let expected = self.state.round.number.saturating_add(1);
        if proposal.round.number != expected {
            return Err(RejectReason::StaleRound {
                expected,
                got: proposal.round.number,
            });
        }
        if proposal.round.length() == 0 {
            return Err(RejectReason::InvalidRebalance(format!(
                "empty window {}..{}",
                proposal.round.starts_at, proposal.round.ends_at
            )));
        }
        let total = proposal.total_order_limit();
        if total > proposal.round.limit {
            return Err(RejectReason::InvalidRebalance(format!(
                "quotas sum to {} over round limit {}",
                total, proposal.round.limit
            )));
        }
        Ok(Admitted::Rebalance(proposal))
    }

    fn execute(&mut self, admitted: Admitted) {
        match admitted {
            Admitted::Order { order, poster, id } => {
                if self.config.quota_policy.is_enforced() {
                    let remaining = self.state.consume_order_quota(&poster);
                    debug!(
                        "[os-01] Poster {} remaining quota: {:?}",
                        poster, remaining
                    );
                }
                self.state.order_counter = self.state.order_counter.saturating_add(1);
                self.orders.add(TaggedOrder { order, id, poster });
                info!("[os-01] Order {} from poster {} verified", id, poster);
            }
            Admitted::Stake(witness) => match self.state.apply_stake(&witness) {
                Some(BalanceChange::Clamped { shortfall }) => warn!(
                    "[os-01] Removal for {} exceeded balance by {}; balance cleared",
                    witness.staker, shortfall
                ),
                Some(BalanceChange::UnknownStaker) => warn!(
                    "[os-01] Removal for unknown staker {} ignored",
                    witness.staker
                ),
                Some(_) => info!(
                    "[os-01] Stake witness applied: {:?} {} for {} (block {})",
                    witness.kind, witness.amount, witness.staker, witness.block
                ),
                None => {}
            },
            Admitted::Rebalance(proposal) => {
                self.state.apply_rebalance(&proposal);
                self.accepted_rounds.push(proposal.round);
                info!(
                    "[os-01] Rebalance accepted: round {} [{}, {}) with {} stakers",
                    proposal.round.number,
                    proposal.round.starts_at,
                    proposal.round.ends_at,
                    proposal.limits.len()
                );
            }
        }
    }
}

impl<Q: OrderQueue, N: RebalancerNotifier> AbciApplication for OrderStreamApp<Q, N> {
    fn info(&self) -> InfoResponse {
        InfoResponse {
            data: self.config.app_name.clone(),
            version: self.config.version.clone(),
            last_block_height: self.state.last_block_height,
            last_block_app_hash: self
                .state
                .last_block_app_hash
                .map(|h| h.to_vec())
                .unwrap_or_default(),
        }
    }

    fn begin_block(&mut self, header: &BlockHeader) {
        self.current_height = header.height;
        info!(
            "[os-01] New block {} proposed by {}",
            header.height,
            hex::encode(&header.proposer)
        );
        self.notifier
            .order_stream_block(header.height, &header.proposer);
    }

    fn check_tx(&self, tx: &[u8]) -> Verdict {
        let verdict: Verdict = self.admit(tx).map(|a| a.hint()).into();
        match verdict.reason() {
            None => debug!("[os-01] Mempool accepted: {}", verdict.log()),
            Some(reason) => warn!("[os-01] Mempool rejected: {}", reason),
        }
        verdict
    }

    fn deliver_tx(&mut self, tx: &[u8]) -> Verdict {
        match self.admit(tx) {
            Ok(admitted) => {
                let hint = admitted.hint();
                self.execute(admitted);
                Verdict::accept(hint)
            }
            Err(reason) => {
                warn!("[os-01] Delivery rejected: {}", reason);
                Verdict::Reject(reason)
            }
        }
    }

    fn commit(&mut self) -> Hash {
        if let Err(e) = self.orders.flush() {
            error!(
                "[os-01] Error broadcasting orders (may require operator attention): {}",
                e
            );
        }

        self.state.last_block_height = self.current_height;
        let hash = self.state.app_hash();
        self.state.last_block_app_hash = Some(hash);

        for round in std::mem::take(&mut self.accepted_rounds) {
            self.notifier.round_accepted(&round);
        }
        self.notifier.block_committed(self.current_height);

        info!(
            "[os-01] Commit complete at height {}. State hash: {}",
            self.current_height,
            hex::encode(hash)
        );
        hash
    }
}
