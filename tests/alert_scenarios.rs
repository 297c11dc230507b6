use proptest::prelude::*;
use queuewatch::alerts::{NewAlert, Notification};
use queuewatch::client::QueueClient;
use queuewatch::drill::{Drill, DrillConfig};
use queuewatch::storage::QueueStore;

fn bodies(n: usize) -> Vec<String> {
    vec!["message".to_string(); n]
}

fn store_with_alert(kind: &str, trigger: i64, direction: &str) -> QueueStore {
    let store = QueueStore::new();
    store
        .add_alert("q", &NewAlert::new(kind, trigger, direction, "q-alerts"))
        .unwrap();
    store
}

fn alerts(store: &QueueStore) -> usize {
    store.size("q-alerts").unwrap_or(0)
}

#[test]
fn size_ascending_fires_once_per_crossing() {
    let store = store_with_alert("size", 10, "asc");

    store.post("q", bodies(13)).unwrap();
    assert_eq!(alerts(&store), 1);

    store.post("q", bodies(10)).unwrap();
    assert_eq!(alerts(&store), 1);

    store.get("q", 16).unwrap();
    assert_eq!(store.size("q").unwrap(), 7);
    assert_eq!(alerts(&store), 1);

    store.post("q", bodies(4)).unwrap();
    assert_eq!(alerts(&store), 2);
}

#[test]
fn progressive_ascending_fires_per_multiple() {
    let store = store_with_alert("progressive", 10, "asc");

    for target in [10, 20, 30] {
        let size = store.size("q").unwrap_or(0);
        store.post("q", bodies(target - size)).unwrap();
    }
    assert_eq!(alerts(&store), 3);

    store.get("q", 15).unwrap();
    assert_eq!(alerts(&store), 3);
}

#[test]
fn progressive_both_tracks_each_direction() {
    let store = store_with_alert("progressive", 10, "both");

    store.post("q", bodies(10)).unwrap();
    assert_eq!(alerts(&store), 1);

    store.post("q", bodies(10)).unwrap();
    assert_eq!(alerts(&store), 2);

    // 20 -> 7 passes 10 on the way down
    store.get("q", 13).unwrap();
    assert_eq!(alerts(&store), 3);

    let notes: Vec<Notification> = store
        .get("q-alerts", 10)
        .unwrap()
        .iter()
        .map(|m| Notification::from_body(&m.body).unwrap())
        .collect();
    let crossed: Vec<usize> = notes.iter().map(|n| n.crossed).collect();
    assert_eq!(crossed, vec![10, 20, 10]);
    assert_eq!(notes[2].queue_size, 7);
}

#[test]
fn several_rules_fire_independently() {
    let store = QueueStore::new();
    store
        .add_alert("q", &NewAlert::new("size", 5, "asc", "size-alerts"))
        .unwrap();
    store
        .add_alert("q", &NewAlert::new("progressive", 2, "desc", "drain-alerts"))
        .unwrap();

    store.post("q", bodies(6)).unwrap();
    store.get("q", 6).unwrap();

    assert_eq!(store.size("size-alerts").unwrap(), 1);
    // 6 -> 0 reaches 4 and 2 from above
    assert_eq!(store.size("drain-alerts").unwrap(), 2);
}

#[tokio::test]
async fn drill_passes_in_memory() {
    let mut drill = Drill::new(QueueClient::in_memory(), DrillConfig::default());
    let report = drill.run_all().await.unwrap();

    assert_eq!(report.scenarios, 6);
    assert!(report.checks > 30);
}

#[tokio::test]
async fn drill_passes_with_other_triggers() {
    for trigger in [6, 7, 25] {
        let config = DrillConfig {
            trigger,
            ..DrillConfig::default()
        };
        let mut drill = Drill::new(QueueClient::in_memory(), config);
        drill
            .run_all()
            .await
            .unwrap_or_else(|e| panic!("trigger {trigger}: {e}"));
    }
}

#[derive(Debug, Clone)]
enum Op {
    Post(usize),
    Get(usize),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (1usize..40).prop_map(Op::Post),
        (1usize..40).prop_map(Op::Get),
    ]
}

/// Count thresholds crossed by walking every integer between the sizes
fn reference_count(old: usize, new: usize, trigger: usize, progressive: bool, asc: bool, desc: bool) -> usize {
    let is_threshold = |m: usize| {
        if progressive {
            m > 0 && m % trigger == 0
        } else {
            m == trigger
        }
    };

    if new > old && asc {
        ((old + 1)..=new).filter(|m| is_threshold(*m)).count()
    } else if new < old && desc {
        (new..old).filter(|m| is_threshold(*m)).count()
    } else {
        0
    }
}

proptest! {
    #[test]
    fn notifications_match_reference(
        ops in prop::collection::vec(op_strategy(), 1..30),
        trigger in 1usize..15,
        progressive in any::<bool>(),
        direction in prop_oneof![Just("asc"), Just("desc"), Just("both")],
    ) {
        let kind = if progressive { "progressive" } else { "size" };
        let store = store_with_alert(kind, trigger as i64, direction);
        let asc = direction != "desc";
        let desc = direction != "asc";

        let mut size = 0usize;
        let mut expected = 0usize;
        for op in ops {
            let new = match op {
                Op::Post(n) => {
                    store.post("q", bodies(n)).unwrap();
                    size + n
                }
                Op::Get(n) => {
                    store.get("q", n).unwrap();
                    size.saturating_sub(n)
                }
            };
            expected += reference_count(size, new, trigger, progressive, asc, desc);
            size = new;

            prop_assert_eq!(store.size("q").unwrap(), size);
            prop_assert_eq!(alerts(&store), expected);
        }
    }
}
