//! # Order Flow
//!
//! A signed order travels as the ingress would encode it, through `CheckTx`
//! and `DeliverTx`, and reaches subscribers at commit.

#[cfg(test)]
mod tests {
    use k256::ecdsa::SigningKey;
    use os_01_abci_app::{
        AbciApplication, AbciConfig, BlockHeader, CommitState, NoopNotifier, OrderStreamApp,
        QuotaPolicy, RejectReason,
    };
    use os_03_outbound_queue::OrderTracker;
    use serde_json::{json, Map};
    use shared_types::{
        address_from_key, codec, Address, Limit, LimitMapping, Order, RebalanceProposal, Round,
        Transaction,
    };

    type App = OrderStreamApp<OrderTracker, NoopNotifier>;

    fn key(seed: u8) -> SigningKey {
        SigningKey::from_slice(&[seed; 32]).unwrap()
    }

    fn order_tx(signer: &SigningKey, seq: u64) -> Vec<u8> {
        let mut values = Map::new();
        values.insert("seq".to_string(), json!(seq));
        let order = Order::new(Address([0x0C; 20]), Address([0x0D; 20]), values)
            .sign(signer)
            .unwrap();
        codec::encode(&Transaction::OrderBroadcast(order)).unwrap()
    }

    fn app(policy: QuotaPolicy) -> App {
        let mut tracker = OrderTracker::new(16);
        tracker.activate();
        OrderStreamApp::new(
            AbciConfig {
                quota_policy: policy,
                ..AbciConfig::default()
            },
            CommitState::new(),
            tracker,
            NoopNotifier,
        )
    }

    fn begin(app: &mut App, height: u64) {
        app.begin_block(&BlockHeader {
            height,
            proposer: vec![0x01],
        });
    }

    fn grant(app: &mut App, poster: Address, order_limit: u64) {
        let mut limits = LimitMapping::new();
        limits.insert(
            poster,
            Limit {
                order_limit,
                stream_limit: 1,
            },
        );
        let proposal = RebalanceProposal {
            round: Round::next(app.state().round.number, 100, 10, order_limit),
            limits,
        };
        let tx = codec::encode(&Transaction::Rebalance(proposal)).unwrap();
        assert!(app.deliver_tx(&tx).is_accepted());
    }

    #[test]
    fn test_order_reaches_subscriber_at_commit() {
        let mut app = app(QuotaPolicy::Unmetered);
        let mut orders = app.orders().subscribe();
        let signer = key(7);
        let tx = order_tx(&signer, 1);

        assert!(app.check_tx(&tx).is_accepted());
        begin(&mut app, 1);
        let verdict = app.deliver_tx(&tx);
        assert!(verdict.is_accepted());
        assert!(orders.try_recv().is_err(), "nothing delivered before commit");

        app.commit();
        let tagged = orders.try_recv().unwrap();
        assert_eq!(tagged.poster, address_from_key(signer.verifying_key()));
        assert_eq!(tagged.id, tagged.order.order_id().unwrap());
        assert_eq!(verdict.log(), tagged.id.to_string());
        assert_eq!(app.state().order_counter, 1);
    }

    #[test]
    fn test_orders_delivered_in_acceptance_order() {
        let mut app = app(QuotaPolicy::Unmetered);
        let mut orders = app.orders().subscribe();
        let signer = key(9);

        begin(&mut app, 1);
        for seq in 0..5 {
            assert!(app.deliver_tx(&order_tx(&signer, seq)).is_accepted());
        }
        app.commit();

        let received: Vec<_> = (0..5)
            .map(|_| orders.try_recv().unwrap().order.maker_values["seq"].clone())
            .collect();
        assert_eq!(received, (0..5).map(|s| json!(s)).collect::<Vec<_>>());
    }

    #[test]
    fn test_inactive_tracker_keeps_orders_until_activated() {
        let mut app = OrderStreamApp::new(
            AbciConfig::default(),
            CommitState::new(),
            OrderTracker::new(16),
            NoopNotifier,
        );
        let mut orders = app.orders().subscribe();

        begin(&mut app, 1);
        assert!(app.deliver_tx(&order_tx(&key(3), 1)).is_accepted());
        let hash = app.commit();
        assert_eq!(app.orders().pending(), 1);
        assert_eq!(app.state().last_block_app_hash, Some(hash));

        app.orders_mut().activate();
        begin(&mut app, 2);
        app.commit();
        assert!(orders.try_recv().is_ok());
        assert_eq!(app.orders().pending(), 0);
    }

    #[test]
    fn test_per_order_quota_exhausts() {
        let mut app = app(QuotaPolicy::PerOrder);
        let signer = key(11);
        let poster = address_from_key(signer.verifying_key());

        begin(&mut app, 1);
        let tx = order_tx(&signer, 0);
        assert!(matches!(
            app.deliver_tx(&tx).reason(),
            Some(RejectReason::NoQuota(p)) if *p == poster
        ));

        grant(&mut app, poster, 2);
        app.commit();

        begin(&mut app, 2);
        assert!(app.deliver_tx(&order_tx(&signer, 1)).is_accepted());
        assert!(app.deliver_tx(&order_tx(&signer, 2)).is_accepted());
        let third = app.deliver_tx(&order_tx(&signer, 3));
        assert_eq!(third.code(), 5);
        app.commit();

        assert_eq!(app.state().order_counter, 2);
    }

    #[test]
    fn test_unmetered_accepts_posters_without_quota() {
        let mut app = app(QuotaPolicy::Unmetered);
        begin(&mut app, 1);
        assert!(app.deliver_tx(&order_tx(&key(12), 0)).is_accepted());
    }

    #[test]
    fn test_undecodable_bytes_rejected_without_state_change() {
        let mut app = app(QuotaPolicy::Unmetered);
        begin(&mut app, 1);
        let before = app.state().clone();

        let verdict = app.deliver_tx(b"\x00\x01garbage");
        assert_eq!(verdict.code(), 1);
        assert_eq!(app.state(), &before);
    }

    #[test]
    fn test_app_hash_tracks_state() {
        let mut a = app(QuotaPolicy::Unmetered);
        let mut b = app(QuotaPolicy::Unmetered);
        let tx = order_tx(&key(21), 0);

        begin(&mut a, 1);
        begin(&mut b, 1);
        a.deliver_tx(&tx);
        b.deliver_tx(&tx);
        assert_eq!(a.commit(), b.commit());

        begin(&mut a, 2);
        begin(&mut b, 2);
        a.deliver_tx(&order_tx(&key(21), 1));
        assert_ne!(a.commit(), b.commit());
    }
}
