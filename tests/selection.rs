use backend_selector::lb::{Fnv1aHasher, IpHash, WeightedRoundRobin};
use backend_selector::{
    create_strategy, LoadBalancer, LoadBalancerError, SelectionStrategy, Server, ServerPool,
    StrategyKind,
};
use proptest::prelude::*;
use std::sync::Arc;
use std::time::Duration;

fn pool_with_weights(weights: &[u32]) -> ServerPool {
    weights
        .iter()
        .enumerate()
        .map(|(i, &w)| Server::with_weight(format!("192.168.1.{}:80", i + 1), w))
        .collect()
}

fn position(pool: &ServerPool, selected: &Arc<Server>) -> usize {
    pool.iter()
        .position(|s| Arc::ptr_eq(s, selected))
        .expect("selected server is not in the pool")
}

fn gcd(a: u32, b: u32) -> u32 {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}

#[test]
fn sample_scenario() {
    let pool = pool_with_weights(&[1, 2, 3]);

    let rr = create_strategy(StrategyKind::RoundRobin, pool.clone()).unwrap();
    let sequence: Vec<usize> = (0..6)
        .map(|_| position(&pool, rr.select(None).unwrap()))
        .collect();
    assert_eq!(sequence, vec![0, 1, 2, 0, 1, 2]);

    for (server, (conns, ms)) in pool.iter().zip([(5, 50), (2, 30), (3, 40)]) {
        server.set_connections(conns);
        server.set_response_time(Duration::from_millis(ms));
    }

    let lc = create_strategy(StrategyKind::LeastConnections, pool.clone()).unwrap();
    assert_eq!(lc.select(None).unwrap().address, "192.168.1.2:80");

    let lrt = create_strategy(StrategyKind::LeastResponseTime, pool.clone()).unwrap();
    assert_eq!(lrt.select(None).unwrap().address, "192.168.1.2:80");

    let ip_hash = create_strategy(StrategyKind::IpHash, pool.clone()).unwrap();
    let expected = (IpHash::<Fnv1aHasher>::hash_key("10.0.0.1") % 3) as usize;
    assert_eq!(position(&pool, ip_hash.select(Some("10.0.0.1")).unwrap()), expected);
    assert_eq!(expected, 0);
}

#[test]
fn error_scenarios() {
    for kind in StrategyKind::ALL {
        assert!(matches!(
            LoadBalancer::new(kind, ServerPool::default()),
            Err(LoadBalancerError::InvalidPool)
        ));
    }

    let lb = LoadBalancer::new(StrategyKind::IpHash, pool_with_weights(&[1, 1])).unwrap();
    assert!(matches!(lb.select(None), Err(LoadBalancerError::MissingKey)));
}

#[test]
fn round_robin_is_serialized_across_threads() {
    let pool = pool_with_weights(&[1, 1, 1]);
    let lb = LoadBalancer::new(StrategyKind::RoundRobin, pool.clone()).unwrap();

    let counts = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                scope.spawn(|| {
                    let mut counts = [0usize; 3];
                    for _ in 0..300 {
                        counts[position(&pool, &lb.select(None).unwrap())] += 1;
                    }
                    counts
                })
            })
            .collect();

        handles.into_iter().fold([0usize; 3], |mut total, handle| {
            for (t, c) in total.iter_mut().zip(handle.join().unwrap()) {
                *t += c;
            }
            total
        })
    });

    assert_eq!(counts, [400, 400, 400]);
}

#[test]
fn weighted_round_robin_keeps_proportions_across_threads() {
    let pool = pool_with_weights(&[1, 2, 3]);
    let wrr = WeightedRoundRobin::new(pool.clone()).unwrap();

    let counts = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                scope.spawn(|| {
                    (0..150)
                        .map(|_| position(&pool, wrr.select(None).unwrap()))
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut counts = [0usize; 3];
        for handle in handles {
            for index in handle.join().unwrap() {
                counts[index] += 1;
            }
        }
        counts
    });

    // 600 selections are exactly 100 weighted cycles.
    assert_eq!(counts, [100, 200, 300]);
}

#[test]
fn least_connections_tracks_concurrent_writers() {
    let pool = pool_with_weights(&[1, 1]);
    let lb = LoadBalancer::new(StrategyKind::LeastConnections, pool.clone()).unwrap();

    std::thread::scope(|scope| {
        scope.spawn(|| {
            for n in 0..1000 {
                pool[0].set_connections(n % 3);
            }
        });
        scope.spawn(|| {
            for _ in 0..1000 {
                let server = lb.select(None).unwrap();
                assert!(server.address == "192.168.1.1:80" || server.address == "192.168.1.2:80");
            }
        });
    });

    pool[0].set_connections(1);
    assert_eq!(lb.select(None).unwrap().address, "192.168.1.2:80");
}

proptest! {
    #[test]
    fn round_robin_visits_each_server_once_per_period(len in 1usize..12, offset in 0usize..30) {
        let pool = pool_with_weights(&vec![1; len]);
        let rr = create_strategy(StrategyKind::RoundRobin, pool.clone()).unwrap();
        for _ in 0..offset {
            rr.select(None).unwrap();
        }

        let first: Vec<usize> = (0..len).map(|_| position(&pool, rr.select(None).unwrap())).collect();
        let second: Vec<usize> = (0..len).map(|_| position(&pool, rr.select(None).unwrap())).collect();

        let mut sorted = first.clone();
        sorted.sort_unstable();
        prop_assert_eq!(sorted, (0..len).collect::<Vec<_>>());
        prop_assert_eq!(first, second);
    }

    #[test]
    fn weighted_round_robin_cycle_matches_weights(
        weights in prop::collection::vec(0u32..9, 1..7)
            .prop_filter("needs a non-zero weight", |w| w.iter().any(|&x| x > 0))
    ) {
        let g = weights.iter().copied().fold(0, gcd);
        let cycle = weights.iter().sum::<u32>() / g;
        let pool = pool_with_weights(&weights);
        let wrr = WeightedRoundRobin::new(pool.clone()).unwrap();

        for _ in 0..2 {
            let mut counts = vec![0u32; weights.len()];
            for _ in 0..cycle {
                counts[position(&pool, wrr.select(None).unwrap())] += 1;
            }
            let expected: Vec<u32> = weights.iter().map(|w| w / g).collect();
            prop_assert_eq!(counts, expected);
        }
    }

    #[test]
    fn weighted_round_robin_all_zero_picks_first(len in 1usize..8, calls in 1usize..20) {
        let pool = pool_with_weights(&vec![0; len]);
        let wrr = WeightedRoundRobin::new(pool.clone()).unwrap();
        for _ in 0..calls {
            prop_assert_eq!(position(&pool, wrr.select(None).unwrap()), 0);
        }
    }

    #[test]
    fn least_connections_returns_first_minimum(conns in prop::collection::vec(0u32..5, 1..10)) {
        let pool = pool_with_weights(&vec![1; conns.len()]);
        for (server, &c) in pool.iter().zip(&conns) {
            server.set_connections(c);
        }
        let lc = create_strategy(StrategyKind::LeastConnections, pool.clone()).unwrap();

        let min = *conns.iter().min().unwrap();
        let expected = conns.iter().position(|&c| c == min).unwrap();
        prop_assert_eq!(position(&pool, lc.select(None).unwrap()), expected);
    }

    #[test]
    fn least_response_time_returns_first_minimum(times in prop::collection::vec(0u64..5, 1..10)) {
        let pool = pool_with_weights(&vec![1; times.len()]);
        for (server, &ms) in pool.iter().zip(&times) {
            server.set_response_time(Duration::from_millis(ms));
        }
        let lrt = create_strategy(StrategyKind::LeastResponseTime, pool.clone()).unwrap();

        let min = *times.iter().min().unwrap();
        let expected = times.iter().position(|&t| t == min).unwrap();
        prop_assert_eq!(position(&pool, lrt.select(None).unwrap()), expected);
    }

    #[test]
    fn ip_hash_is_sticky(key in "[0-9]{1,3}(\\.[0-9]{1,3}){3}", len in 1usize..10) {
        let pool = pool_with_weights(&vec![1; len]);
        let ip_hash = IpHash::new(pool.clone()).unwrap();

        let first = position(&pool, ip_hash.select(Some(key.as_str())).unwrap());
        prop_assert_eq!(first, (IpHash::<Fnv1aHasher>::hash_key(&key) % len as u64) as usize);
        for _ in 0..3 {
            prop_assert_eq!(position(&pool, ip_hash.select(Some(key.as_str())).unwrap()), first);
        }
    }
}
