// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use device_dispatch_core::{WorkSet, Partition};

#[test]
fn test_slice_returns_partition_items() {
    let set: WorkSet<_> = ["a", "b", "c", "d"].into_iter().collect();

    assert_eq!(set.slice(Partition::new(1, 3)), &["b", "c"]);
    assert_eq!(set.slice(Partition::new(4, 4)), &[] as &[&str]);
}

#[test]
fn test_clones_share_items() {
    let set = WorkSet::new(vec![1, 2, 3]);
    let view = set.clone();

    assert_eq!(view.len(), 3);
    assert_eq!(view.get(2), Some(&3));
    assert_eq!(view.get(3), None);
    assert_eq!(set.iter().sum::<i32>(), 6);
}
