//! # Bridge Flow
//!
//! Stake rebalancer output goes through the wire codec into the ABCI
//! application; accepted rounds are fed back to the rebalancer.
//!
//! ```text
//! StakeLog / NewBlock ──→ StakeRebalancer ──Transaction──→ codec ──→ OrderStreamApp
//!        ↑                                                              │
//!        └──────────────── synchronize(round) ←── RecordingNotifier ←───┘
//! ```
//!
//! The bridge's balance table and the committed balances must agree after
//! every witnessed block, otherwise the next proposal is computed from
//! stakes consensus never accepted.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use os_01_abci_app::{
        AbciApplication, AbciConfig, BlockHeader, CommitState, OrderStreamApp, RecordingNotifier,
        RejectReason, Verdict,
    };
    use os_02_stake_rebalancer::{
        BridgeEvent, MockStakingChain, RebalancerConfig, RecordingSubmitter, StakeLog,
        StakeRebalancer,
    };
    use os_03_outbound_queue::OrderTracker;
    use shared_types::{codec, Address, Limit, Transaction, U256};
    use tokio::sync::{mpsc, watch};

    type App = OrderStreamApp<OrderTracker, Arc<RecordingNotifier>>;
    type Bridge = StakeRebalancer<Arc<MockStakingChain>, Arc<RecordingSubmitter>>;

    const ALICE: Address = Address([0xA1; 20]);
    const BOB: Address = Address([0xB0; 20]);

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    fn bridge_config() -> RebalancerConfig {
        RebalancerConfig {
            provider_url: "http://localhost:8545".to_string(),
            period_length: 10,
            period_limit: 100,
            finality_threshold: 2,
            stake_contract: Address([0x5A; 20]),
            ..Default::default()
        }
    }

    async fn bridge_at(height: u64) -> (Bridge, Arc<RecordingSubmitter>) {
        let submitter = Arc::new(RecordingSubmitter::new());
        let bridge = StakeRebalancer::create(
            bridge_config(),
            Arc::new(MockStakingChain::new(height)),
            Arc::clone(&submitter),
        )
        .await
        .unwrap();
        (bridge, submitter)
    }

    fn app() -> (App, Arc<RecordingNotifier>) {
        let notifier = Arc::new(RecordingNotifier::new());
        let mut tracker = OrderTracker::default();
        tracker.activate();
        let app = OrderStreamApp::new(
            AbciConfig::default(),
            CommitState::new(),
            tracker,
            Arc::clone(&notifier),
        );
        (app, notifier)
    }

    fn stake_made(staker: Address, amount: u64, block: u64) -> StakeLog {
        stake_log("StakeMade", staker, amount, block)
    }

    fn stake_log(event: &str, staker: Address, amount: u64, block: u64) -> StakeLog {
        StakeLog {
            event: event.to_string(),
            staker,
            amount: U256::from(amount),
            block,
        }
    }

    fn rebalance_rounds(txs: &[Transaction]) -> Vec<u64> {
        txs.iter()
            .filter_map(|tx| match tx {
                Transaction::Rebalance(p) => Some(p.round.number),
                _ => None,
            })
            .collect()
    }

    /// Run one order-stream block carrying `txs` and return the verdicts.
    fn run_block(app: &mut App, height: u64, txs: &[Transaction]) -> Vec<Verdict> {
        app.begin_block(&BlockHeader {
            height,
            proposer: vec![0x01],
        });
        let verdicts = txs
            .iter()
            .map(|tx| app.deliver_tx(&codec::encode(tx).unwrap()))
            .collect();
        app.commit();
        verdicts
    }

    /// Hand every round consensus accepted back to the bridge.
    fn sync_rounds(bridge: &mut Bridge, notifier: &RecordingNotifier, seen: &mut usize) {
        let rounds = notifier.rounds();
        for round in &rounds[*seen..] {
            bridge.synchronize(round);
        }
        *seen = rounds.len();
    }

    // =============================================================================
    // INTEGRATION TESTS
    // =============================================================================

    /// Genesis round, matured stakes, then proportional quotas for round 2.
    #[tokio::test]
    async fn test_full_period_cycle() {
        let (mut bridge, submitter) = bridge_at(100).await;
        let (mut app, notifier) = app();
        let mut seen = 0;

        bridge.handle_stake(&stake_made(ALICE, 300, 101));
        bridge.handle_stake(&stake_made(BOB, 700, 101));
        assert_eq!(bridge.pending().len(), 2);

        // First head after init proposes the genesis round
        bridge.handle_block(101);
        let genesis = submitter.submitted();
        assert_eq!(genesis.len(), 1);
        let verdicts = run_block(&mut app, 1, &genesis);
        assert!(verdicts.iter().all(Verdict::is_accepted));
        sync_rounds(&mut bridge, &notifier, &mut seen);
        assert_eq!(bridge.period().number, 1);
        assert_eq!(app.state().round.number, 1);
        submitter.clear();

        // Block 101 matures at 103
        bridge.handle_block(102);
        assert!(submitter.submitted().is_empty());
        bridge.handle_block(103);
        let witnesses = submitter.submitted();
        assert_eq!(witnesses.len(), 2);
        let verdicts = run_block(&mut app, 2, &witnesses);
        assert!(verdicts.iter().all(Verdict::is_accepted));
        assert_eq!(app.state().balances.get(&ALICE), Some(&U256::from(300u64)));
        assert_eq!(app.state().balances.get(&BOB), Some(&U256::from(700u64)));
        submitter.clear();

        // Round 1 ends at 111; the proposal goes out once 111 is final
        bridge.handle_block(112);
        assert!(submitter.submitted().is_empty());
        bridge.handle_block(113);
        let proposal = submitter.submitted();
        assert_eq!(proposal.len(), 1);
        let verdicts = run_block(&mut app, 3, &proposal);
        assert!(verdicts[0].is_accepted(), "{}", verdicts[0].log());
        sync_rounds(&mut bridge, &notifier, &mut seen);

        let state = app.state();
        assert_eq!(state.round.number, 2);
        assert_eq!(state.round.starts_at, 113);
        assert_eq!(state.round.ends_at, 123);
        assert_eq!(
            state.limits.get(&ALICE),
            Some(&Limit {
                order_limit: 30,
                stream_limit: 1
            })
        );
        assert_eq!(
            state.limits.get(&BOB),
            Some(&Limit {
                order_limit: 70,
                stream_limit: 1
            })
        );
        assert_eq!(bridge.period(), &state.round);
    }

    /// Two nodes witness the same event; consensus applies it once.
    #[tokio::test]
    async fn test_stake_witnessed_by_two_nodes_applies_once() {
        let (mut first, first_out) = bridge_at(100).await;
        let (mut second, second_out) = bridge_at(100).await;
        let (mut app, notifier) = app();
        let mut seen_first = 0;
        let mut seen_second = 0;

        first.handle_block(101);
        second.handle_block(101);
        run_block(&mut app, 1, &first_out.submitted());
        sync_rounds(&mut first, &notifier, &mut seen_first);
        sync_rounds(&mut second, &notifier, &mut seen_second);
        first_out.clear();
        second_out.clear();

        for bridge in [&mut first, &mut second] {
            bridge.handle_stake(&stake_made(ALICE, 500, 102));
            bridge.handle_block(104);
        }

        let mut txs = first_out.submitted();
        txs.extend(second_out.submitted());
        assert_eq!(txs.len(), 2);
        assert_ne!(txs[0], txs[1], "nonces differ between nodes");

        let verdicts = run_block(&mut app, 2, &txs);
        assert!(verdicts[0].is_accepted());
        assert!(matches!(
            verdicts[1].reason(),
            Some(RejectReason::DuplicateWitness { block: 102, .. })
        ));
        assert_eq!(app.state().balances.get(&ALICE), Some(&U256::from(500u64)));
    }

    /// Both nodes propose genesis; only the first proposal advances the round.
    #[tokio::test]
    async fn test_competing_genesis_proposals() {
        let (mut first, first_out) = bridge_at(100).await;
        let (mut second, second_out) = bridge_at(100).await;
        let (mut app, notifier) = app();

        first.handle_block(101);
        second.handle_block(102);
        let mut txs = first_out.submitted();
        txs.extend(second_out.submitted());

        let verdicts = run_block(&mut app, 1, &txs);
        assert!(verdicts[0].is_accepted());
        assert!(matches!(
            verdicts[1].reason(),
            Some(RejectReason::StaleRound {
                expected: 2,
                got: 1
            })
        ));

        let mut seen = 0;
        sync_rounds(&mut second, &notifier, &mut seen);
        assert_eq!(second.period().starts_at, 101);
        assert_eq!(notifier.rounds().len(), 1);
    }

    /// A proposal consensus never includes is retried after the retry window.
    #[tokio::test]
    async fn test_unaccepted_genesis_is_retried() {
        let (mut bridge, submitter) = bridge_at(100).await;

        bridge.handle_block(101);
        bridge.handle_block(102);
        assert_eq!(submitter.submitted().len(), 1);

        bridge.handle_block(101 + bridge_config().proposal_retry_blocks());
        assert_eq!(submitter.submitted().len(), 2);
    }

    /// Historical events sharing a block and staker: bridge and consensus
    /// keep the same one.
    #[tokio::test]
    async fn test_historical_same_block_events_converge() {
        let (mut bridge, submitter) = bridge_at(100).await;
        let (mut app, _) = app();

        bridge.handle_stake(&stake_made(ALICE, 300, 50));
        bridge.handle_stake(&stake_made(ALICE, 400, 50));
        bridge.handle_stake(&stake_made(BOB, 900, 60));
        bridge.handle_stake(&stake_log("StakeRemoved", BOB, 200, 60));
        bridge.handle_block(101);

        let witnesses: Vec<_> = submitter
            .submitted()
            .into_iter()
            .filter(|tx| matches!(tx, Transaction::Stake(_)))
            .collect();
        assert_eq!(witnesses.len(), 2);
        let verdicts = run_block(&mut app, 1, &witnesses);
        assert!(verdicts.iter().all(Verdict::is_accepted));

        for staker in [ALICE, BOB] {
            let committed = app.state().balances.get(&staker).copied().unwrap_or_default();
            assert_eq!(bridge.balances().get(&staker), committed);
        }
        assert_eq!(app.state().balances.get(&ALICE), Some(&U256::from(400u64)));
    }

    /// An accepted round queued while the event channel is full still
    /// reaches the bridge, which then moves on to the next round.
    #[tokio::test]
    async fn test_round_accepted_under_event_backlog() {
        let (mut bridge, submitter) = bridge_at(100).await;
        let (mut app, notifier) = app();

        bridge.handle_block(101);
        run_block(&mut app, 1, &submitter.submitted());
        submitter.clear();

        let (events_tx, events_rx) = mpsc::channel(1);
        let (rounds_tx, rounds_rx) = mpsc::unbounded_channel();
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        events_tx.try_send(BridgeEvent::NewBlock(102)).unwrap();
        assert!(events_tx.try_send(BridgeEvent::NewBlock(103)).is_err());
        for round in notifier.rounds() {
            rounds_tx.send(round).unwrap();
        }
        drop(events_tx);

        bridge.run(events_rx, rounds_rx, shutdown_rx).await;
        assert_eq!(bridge.period(), &app.state().round);

        // Round 1 ends at 111, final at 113
        for height in 104..=114 {
            bridge.handle_block(height);
        }
        assert_eq!(rebalance_rounds(&submitter.submitted()), vec![2]);
    }
}
