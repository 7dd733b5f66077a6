// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use device_dispatch_core::{ProgressCounter, ProgressSnapshot};
use std::sync::{Arc, Mutex};
use std::thread;

fn recording_counter(total: usize) -> (ProgressCounter, Arc<Mutex<Vec<ProgressSnapshot>>>) {
    let rendered = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&rendered);
    let counter = ProgressCounter::with_renderer(total, move |snapshot| {
        sink.lock().unwrap().push(snapshot);
    });
    (counter, rendered)
}

#[test]
fn test_advance_renders_each_step() {
    let (counter, rendered) = recording_counter(3);

    assert_eq!(counter.advance(1), 1);
    assert_eq!(counter.advance(2), 3);

    let rendered = rendered.lock().unwrap();
    assert_eq!(
        *rendered,
        vec![
            ProgressSnapshot { completed: 1, total: 3 },
            ProgressSnapshot { completed: 3, total: 3 },
        ]
    );
}

#[test]
fn test_close_renders_once_and_silences_later_advances() {
    let (counter, rendered) = recording_counter(2);
    counter.advance(1);

    counter.close();
    counter.close();
    counter.advance(1);

    assert!(counter.is_closed());
    assert_eq!(counter.completed(), 2, "advances after close are still counted");
    assert_eq!(rendered.lock().unwrap().len(), 2);
}

#[test]
fn test_concurrent_advances_are_not_lost() {
    let counter = ProgressCounter::new(8_000);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let counter = counter.clone();
            thread::spawn(move || {
                for _ in 0..1_000 {
                    counter.advance(1);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(counter.snapshot(), ProgressSnapshot { completed: 8_000, total: 8_000 });
}
