use msgbus_ring::{Record, Ring, RECORD_SIZE, MAX_CAPACITY};

fn unique_name(tag: &str) -> String {
    format!("ring-it-{tag}-{}", std::process::id())
}

#[test]
fn capacity_bound_scenario() {
    let name = unique_name("capacity-bound");
    assert!(Ring::create(&name, MAX_CAPACITY + 1, RECORD_SIZE).is_err());

    let ring = Ring::create(&name, MAX_CAPACITY, RECORD_SIZE).unwrap();
    for i in 0..MAX_CAPACITY as u64 {
        assert!(ring.enqueue(&Record::new(i, &[])));
    }
    assert!(!ring.enqueue(&Record::new(u64::MAX, &[])));
    ring.destroy().unwrap();
}

#[test]
fn round_trip_preserves_record_bytes() {
    let name = unique_name("round-trip");
    let ring = Ring::create(&name, 32, RECORD_SIZE).unwrap();
    let payload = b"[128572] a log item is here";
    let sent = Record::new(128_570, payload);
    assert!(ring.enqueue(&sent));
    let received = ring.dequeue().unwrap();
    assert_eq!(received, sent);
    assert_eq!(received.payload(), payload);
    ring.destroy().unwrap();
}

#[test]
fn concurrent_producers_and_single_consumer_see_every_record() {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;

    let name = unique_name("concurrent");
    let ring = Arc::new(Ring::create(&name, 256, RECORD_SIZE).unwrap());
    let producers = 4;
    let per_producer = 500u64;
    let total = producers * per_producer as usize;

    let mut handles = Vec::new();
    for p in 0..producers {
        let ring = Arc::clone(&ring);
        handles.push(thread::spawn(move || {
            for i in 0..per_producer {
                let id = p as u64 * per_producer + i;
                while !ring.enqueue(&Record::new(id, &[])) {
                    std::hint::spin_loop();
                }
            }
        }));
    }

    let consumed = Arc::new(AtomicUsize::new(0));
    let seen = {
        let ring = Arc::clone(&ring);
        let consumed = Arc::clone(&consumed);
        thread::spawn(move || {
            let mut ids = Vec::with_capacity(total);
            while ids.len() < total {
                if let Some(r) = ring.dequeue() {
                    ids.push(r.id);
                    consumed.fetch_add(1, Ordering::Relaxed);
                } else {
                    std::hint::spin_loop();
                }
            }
            ids
        })
    };

    for h in handles {
        h.join().unwrap();
    }
    let mut ids = seen.join().unwrap();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), total);

    match Arc::try_unwrap(ring) {
        Ok(ring) => ring.destroy().unwrap(),
        Err(_) => panic!("ring still has outstanding references"),
    }
}
