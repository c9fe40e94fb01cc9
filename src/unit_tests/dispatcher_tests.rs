use crate::gpu::ClusterDispatcher;
use crate::types::ClusterAssignment;
use std::collections::HashSet;

fn clusters(dispatcher: &mut ClusterDispatcher, n: usize) -> Vec<usize> {
    (0..n).map(|_| dispatcher.next_assignment().cluster_id).collect()
}

#[test]
fn chunk_of_one_rotates_every_call() {
    let mut dispatcher = ClusterDispatcher::new(3, 4, 1);
    assert_eq!(clusters(&mut dispatcher, 7), vec![0, 1, 2, 0, 1, 2, 0]);
}

#[test]
fn chunk_repeats_each_cluster() {
    let mut dispatcher = ClusterDispatcher::new(2, 8, 3);
    assert_eq!(
        clusters(&mut dispatcher, 9),
        vec![0, 0, 0, 1, 1, 1, 0, 0, 0]
    );
}

#[test]
fn units_advance_per_cluster() {
    let mut dispatcher = ClusterDispatcher::new(2, 3, 2);
    let got: Vec<_> = dispatcher
        .by_ref()
        .take(8)
        .map(|a| (a.cluster_id, a.unit_id))
        .collect();
    assert_eq!(
        got,
        vec![(0, 0), (0, 1), (1, 0), (1, 1), (0, 2), (0, 0), (1, 2), (1, 0)]
    );
}

#[test]
fn full_device_visits_every_unit_once() {
    let mut dispatcher = ClusterDispatcher::new(8, 32, 1);
    let mut seen = HashSet::new();
    for call in 0..256 {
        let assignment = dispatcher.next_assignment();
        assert_eq!(assignment.cluster_id, call % 8, "round-robin order broken");
        assert!(seen.insert(assignment), "{:?} issued twice", assignment);
    }
    assert_eq!(seen.len(), 256);
    // the next call wraps back to the first unit of cluster 0
    assert_eq!(
        dispatcher.next_assignment(),
        ClusterAssignment {
            cluster_id: 0,
            unit_id: 0
        }
    );
}

#[test]
fn fresh_dispatchers_are_identical() {
    let a: Vec<_> = ClusterDispatcher::new(4, 5, 2).take(100).collect();
    let b: Vec<_> = ClusterDispatcher::new(4, 5, 2).take(100).collect();
    assert_eq!(a, b);
}

#[test]
#[should_panic(expected = "chunk_size must be > 0")]
fn zero_chunk_panics() {
    let _ = ClusterDispatcher::new(2, 2, 0);
}
