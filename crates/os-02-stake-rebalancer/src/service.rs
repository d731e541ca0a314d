//! Stake Rebalancer Service - bridge between the staking contract and
//! consensus.
//!
//! All state lives in one task: every input arrives as a [`BridgeEvent`]
//! or an accepted [`Round`] and is handled to completion before the next one
//! is read. Accepted rounds have their own unbounded channel so consensus
//! never blocks on, or loses them to, a backlog of chain events.
//!
//! ```text
//! StakeLog ──→ PendingEventBuffer (last write wins per block and staker)
//!
//! NewBlock(h) ──→ drain heights <= h - finality ──→ balances + witnesses
//!             └─→ period over? ──→ rebalance tx (genLimits)
//!
//! accepted Round ──→ synchronize
//! ```
//!
//! Events that were already final at startup go through the buffer too and
//! drain on the first head. Consensus keeps one witness per block and
//! staker, so the balance table only converges with it if the bridge also
//! applies one event per block and staker.

use rand::Rng;
use shared_types::{RebalanceProposal, Round, Transaction};
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};
use url::Url;

use crate::domain::{
    gen_limits, BalanceTable, Lifecycle, PendingEventBuffer, RebalancerConfig, RebalancerError,
    RebalancerResult, StakeEvent, StakeLog,
};
use crate::ports::{BridgeEvent, StakingChain, TxSubmitter};
use shared_types::BalanceChange;

/// The stake rebalancer.
pub struct StakeRebalancer<C, S> {
    config: RebalancerConfig,
    chain: C,
    submitter: S,
    lifecycle: Lifecycle,
    init_height: u64,
    current_height: u64,
    period: Round,
    balances: BalanceTable,
    pending: PendingEventBuffer,
    /// Round number and external height of the last unaccepted proposal.
    last_proposal: Option<(u64, u64)>,
    order_stream_height: u64,
}

impl<C: StakingChain, S: TxSubmitter> StakeRebalancer<C, S> {
    /// Validate configuration, contact the chain and bind the contract.
    pub async fn create(config: RebalancerConfig, chain: C, submitter: S) -> RebalancerResult<Self> {
        let mut rebalancer = Self::construct(config, chain, submitter)?;
        rebalancer.initialize().await?;
        Ok(rebalancer)
    }

    fn construct(config: RebalancerConfig, chain: C, submitter: S) -> RebalancerResult<Self> {
        validate_provider_url(&config.provider_url)?;
        validate_rpc_url(&config.tendermint_rpc_host, config.tendermint_rpc_port)?;

        Ok(Self {
            config,
            chain,
            submitter,
            lifecycle: Lifecycle::Constructed,
            init_height: 0,
            current_height: 0,
            period: Round::default(),
            balances: BalanceTable::new(),
            pending: PendingEventBuffer::new(),
            last_proposal: None,
            order_stream_height: 0,
        })
    }

    async fn initialize(&mut self) -> RebalancerResult<()> {
        if self.lifecycle != Lifecycle::Constructed {
            return Ok(());
        }

        self.init_height = self.chain.block_number().await?;
        self.current_height = self.init_height;
        self.chain.bind_contract(self.config.stake_contract).await?;

        self.lifecycle = Lifecycle::Initialized;
        info!(
            "[os-02] Stake rebalancer initialized at external height {} (contract {})",
            self.init_height, self.config.stake_contract
        );
        Ok(())
    }

    /// Subscribe to stake events and new heads, delivered into `sink`.
    pub async fn start(&mut self, sink: mpsc::Sender<BridgeEvent>) -> RebalancerResult<()> {
        match self.lifecycle {
            Lifecycle::Constructed => return Err(RebalancerError::NotInitialized),
            Lifecycle::Started => return Err(RebalancerError::AlreadyStarted),
            Lifecycle::Initialized => {}
        }

        // Historical events are replayed from genesis
        self.chain
            .subscribe(self.config.stake_contract, 0, sink)
            .await?;

        self.lifecycle = Lifecycle::Started;
        info!("[os-02] Stake rebalancer started");
        Ok(())
    }

    /// Lifecycle state.
    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    /// External height at initialization.
    pub fn init_height(&self) -> u64 {
        self.init_height
    }

    /// Best known external height.
    pub fn current_height(&self) -> u64 {
        self.current_height
    }

    /// Current period as last accepted by consensus.
    pub fn period(&self) -> &Round {
        &self.period
    }

    /// Balances from matured events.
    pub fn balances(&self) -> &BalanceTable {
        &self.balances
    }

    /// Events waiting for finality.
    pub fn pending(&self) -> &PendingEventBuffer {
        &self.pending
    }

    /// Last order-stream height seen.
    pub fn order_stream_height(&self) -> u64 {
        self.order_stream_height
    }

    /// Configuration.
    pub fn config(&self) -> &RebalancerConfig {
        &self.config
    }

    /// Handle one bridge event.
    pub fn handle_event(&mut self, event: BridgeEvent) {
        match event {
            BridgeEvent::StakeLog(log) => self.handle_stake(&log),
            BridgeEvent::NewBlock(height) => self.handle_block(height),
            BridgeEvent::OrderStreamBlock { height, proposer } => {
                self.order_stream_height = height;
                debug!(
                    "[os-02] Order-stream block {} by {}",
                    height,
                    hex::encode(proposer)
                );
            }
        }
    }

    /// Ingest a staking contract log.
    pub fn handle_stake(&mut self, log: &StakeLog) {
        let event = match StakeEvent::from_log(log) {
            Ok(event) => event,
            Err(e) => {
                warn!("[os-02] Dropping stake log: {}", e);
                return;
            }
        };

        if let Some(previous) = self.pending.insert(event) {
            debug!(
                "[os-02] Replaced pending event for {} at block {} (was {:?} {})",
                event.staker, event.block, previous.kind, previous.amount
            );
        }
        debug!(
            "[os-02] Buffered {:?} {} for {} at block {} ({} pending)",
            event.kind,
            event.amount,
            event.staker,
            event.block,
            self.pending.len()
        );
    }

    /// React to a new external head.
    pub fn handle_block(&mut self, height: u64) {
        self.current_height = height;
        let matured = height.checked_sub(self.config.finality_threshold);

        if let Some(matured) = matured {
            for event in self.pending.drain_matured(matured) {
                self.apply_and_witness(&event);
            }
        }

        if self.period.number == 0 {
            if height > self.init_height {
                info!("[os-02] Proposing parameters for initial period");
                self.propose(height, Default::default());
            }
            return;
        }

        let Some(matured) = matured else {
            return;
        };
        debug!(
            "[os-02] Most final block is {}, round {} ends at {}",
            matured, self.period.number, self.period.ends_at
        );

        if matured >= self.period.ends_at {
            let limits = gen_limits(self.balances.as_map(), self.config.period_limit);
            self.propose(height, limits);
        }
    }

    /// Adopt a round accepted by consensus.
    pub fn synchronize(&mut self, round: &Round) {
        if round.number != self.period.number.saturating_add(1) {
            error!(
                "[os-02] New round {} is not one greater than current round {}; node may be out of state with network",
                round.number, self.period.number
            );
        }

        self.period = *round;
        if matches!(self.last_proposal, Some((n, _)) if n <= round.number) {
            self.last_proposal = None;
        }
        info!(
            "[os-02] Synchronized to round {} [{}, {})",
            round.number, round.starts_at, round.ends_at
        );
    }

    /// Consume bridge events and accepted rounds until shutdown or the event
    /// channel closes. Pending rounds are always adopted before the next event.
    pub async fn run(
        &mut self,
        mut events: mpsc::Receiver<BridgeEvent>,
        mut rounds: mpsc::UnboundedReceiver<Round>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        info!("[os-02] Bridge event loop running");
        let mut rounds_open = true;
        loop {
            tokio::select! {
                biased;
                round = rounds.recv(), if rounds_open => match round {
                    Some(round) => self.synchronize(&round),
                    None => rounds_open = false,
                },
                event = events.recv() => match event {
                    Some(event) => self.handle_event(event),
                    None => break,
                },
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        info!("[os-02] Bridge event loop stopped");
    }

    fn apply_and_witness(&mut self, event: &StakeEvent) {
        match self.balances.apply(event) {
            BalanceChange::Clamped { shortfall } => warn!(
                "[os-02] Removal for {} exceeds balance by {}; clamped to zero",
                event.staker, shortfall
            ),
            BalanceChange::UnknownStaker => warn!(
                "[os-02] Removal for unknown staker {} ignored",
                event.staker
            ),
            BalanceChange::Credited | BalanceChange::Debited => {}
        }

        let nonce: u32 = rand::thread_rng().gen();
        let tx = Transaction::Stake(event.to_witness(nonce));
        if let Err(e) = self.submitter.submit(&tx) {
            error!("[os-02] Event tx failed (code {}): {}", e.code(), e);
        }
    }

    fn propose(&mut self, height: u64, limits: shared_types::LimitMapping) {
        let round = Round::next(
            self.period.number,
            height,
            self.config.period_length,
            self.config.period_limit,
        );

        if let Some((number, proposed_at)) = self.last_proposal {
            let retry_at = proposed_at.saturating_add(self.config.proposal_retry_blocks());
            if number == round.number && height < retry_at {
                debug!(
                    "[os-02] Rebalance for round {} already proposed at {}; retry at {}",
                    number, proposed_at, retry_at
                );
                return;
            }
        }

        let tx = Transaction::Rebalance(RebalanceProposal { round, limits });
        match self.submitter.submit(&tx) {
            Ok(()) => {
                self.last_proposal = Some((round.number, height));
                info!(
                    "[os-02] Proposed rebalance for round {} [{}, {})",
                    round.number, round.starts_at, round.ends_at
                );
            }
            Err(e) => error!("[os-02] Tx failed with code {}: {}", e.code(), e),
        }
    }
}

fn validate_provider_url(provider: &str) -> RebalancerResult<()> {
    let url = Url::parse(provider)
        .map_err(|e| RebalancerError::InvalidProviderUrl(format!("{}: {}", provider, e)))?;
    match url.scheme() {
        "http" | "https" | "ws" | "wss" => Ok(()),
        other => Err(RebalancerError::UnsupportedUriScheme(other.to_string())),
    }
}

fn validate_rpc_url(host: &str, port: u16) -> RebalancerResult<()> {
    if host.is_empty() {
        return Err(RebalancerError::InvalidRpcUrl("empty host".to_string()));
    }
    let raw = format!("ws://{}:{}", host, port);
    let url = Url::parse(&raw).map_err(|e| RebalancerError::InvalidRpcUrl(format!("{}: {}", raw, e)))?;
    if url.host_str().is_none() {
        return Err(RebalancerError::InvalidRpcUrl(raw));
    }
    Ok(())
}
