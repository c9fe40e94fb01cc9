use crate::types::ClusterAssignment;

/// The dispatcher hands out compute units to workgroups as they launch.
///
/// Assumptions:
/// - Workgroups are pulled one at a time in launch order; the caller makes exactly one
///   call per workgroup and the sequence never ends on its own
/// - Scheduling policy is round-robin across clusters, staying on one cluster for
///   `chunk_size` consecutive workgroups before moving on
/// - Each cluster walks its own units round-robin, independently of the others
///
/// A dispatcher is owned by a single mapping build and never reused.
#[derive(Debug, Clone)]
pub struct ClusterDispatcher {
    num_clusters: usize,
    units_per_cluster: usize,
    chunk_size: usize,
    state: DispatcherState,
}

#[derive(Debug, Clone)]
struct DispatcherState {
    current_cluster: usize,
    unit_counters: Vec<usize>,
    issued_in_chunk: usize,
}

impl ClusterDispatcher {
    /// All three parameters must be non-zero; `GpuConfig::validate` enforces this
    /// before a dispatcher is ever built.
    pub fn new(num_clusters: usize, units_per_cluster: usize, chunk_size: usize) -> Self {
        assert!(num_clusters > 0, "num_clusters must be > 0");
        assert!(units_per_cluster > 0, "units_per_cluster must be > 0");
        assert!(chunk_size > 0, "chunk_size must be > 0");
        Self {
            num_clusters,
            units_per_cluster,
            chunk_size,
            state: DispatcherState {
                current_cluster: 0,
                unit_counters: vec![0; num_clusters],
                issued_in_chunk: 0,
            },
        }
    }

    pub fn next_assignment(&mut self) -> ClusterAssignment {
        let state = &mut self.state;
        let cluster_id = state.current_cluster;
        let unit = &mut state.unit_counters[cluster_id];
        let assignment = ClusterAssignment {
            cluster_id,
            unit_id: *unit,
        };
        *unit = (*unit + 1) % self.units_per_cluster;

        state.issued_in_chunk += 1;
        if state.issued_in_chunk == self.chunk_size {
            state.current_cluster = (state.current_cluster + 1) % self.num_clusters;
            state.issued_in_chunk = 0;
        }
        assignment
    }
}

impl Iterator for ClusterDispatcher {
    type Item = ClusterAssignment;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.next_assignment())
    }
}
