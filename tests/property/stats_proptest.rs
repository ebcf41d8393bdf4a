//! Property-based tests for registry and stats consistency

use std::collections::{BTreeMap, HashMap, HashSet};

use activity_hub::backend::realtime::{ClientConnection, ConnectionRegistry, ConnectionStats};
use chrono::Utc;
use proptest::prelude::*;
use tokio::sync::mpsc;

#[derive(Debug, Clone)]
enum Op {
    Connect { region: usize, language: usize, user: Option<usize> },
    Disconnect(usize),
}

const REGIONS: [&str; 3] = ["KE", "NG", ""];
const LANGUAGES: [&str; 3] = ["sw", "yo", "en"];

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..3usize, 0..3usize, proptest::option::of(0..4usize))
            .prop_map(|(region, language, user)| Op::Connect { region, language, user }),
        (0..16usize).prop_map(Op::Disconnect),
    ]
}

proptest! {
    #[test]
    fn prop_stats_match_live_connections(ops in proptest::collection::vec(op(), 0..40)) {
        let registry = ConnectionRegistry::new();
        let mut live: Vec<ClientConnection> = Vec::new();
        let mut receivers = HashMap::new();

        for op in ops {
            match op {
                Op::Connect { region, language, user } => {
                    let mut connection = ClientConnection::new(REGIONS[region], [LANGUAGES[language]]);
                    if let Some(user) = user {
                        connection = connection.with_user(format!("user-{user}"), None);
                    }
                    let (tx, rx) = mpsc::channel(1);
                    prop_assert!(registry.register(connection.clone(), tx).is_ok());
                    receivers.insert(connection.id, rx);
                    live.push(connection);
                }
                Op::Disconnect(index) => {
                    if live.is_empty() {
                        continue;
                    }
                    let connection = live.remove(index % live.len());
                    prop_assert!(registry.unregister(&connection.id));
                    prop_assert!(!registry.unregister(&connection.id));
                }
            }
        }

        let stats = ConnectionStats::compute(&registry.snapshot(), Utc::now());
        prop_assert_eq!(stats.total_clients, live.len());
        prop_assert_eq!(registry.count(), live.len());

        let users: HashSet<_> = live.iter().filter_map(|c| c.user_id.clone()).collect();
        prop_assert_eq!(stats.online_now, users.len());

        let mut regions = BTreeMap::new();
        for connection in &live {
            *regions.entry(connection.region.clone()).or_insert(0usize) += 1;
        }
        prop_assert_eq!(&stats.clients_by_region, &regions);
        prop_assert_eq!(stats.clients_by_region.values().sum::<usize>(), live.len());
        prop_assert!(!stats.clients_by_region.contains_key(""));
    }
}
