use std::fmt::Write;

use log::debug;
use serde::Serialize;

use crate::error::InvariantViolation;
use crate::gpu::ClusterDispatcher;
use crate::remap::{Remap, RemapDiagnostics};
use crate::types::{ClusterAssignment, GridShape, WorkgroupCoord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Workgroup {
    pub original: WorkgroupCoord,
    pub remapped: WorkgroupCoord,
    pub assignment: ClusterAssignment,
    pub diagnostics: RemapDiagnostics,
}

/// Launch-order placement of every workgroup of one kernel.
///
/// Both directions are dense vectors indexed by linear id: `workgroups[id]` is the workgroup
/// launched `id`-th, `inverse[id']` is the launch id whose remapped tile has linear id `id'`.
#[derive(Debug, Clone, Serialize)]
pub struct MappingTable {
    grid: GridShape,
    workgroups: Vec<Workgroup>,
    #[serde(skip)]
    inverse: Vec<usize>,
}

impl MappingTable {
    /// Walk the grid in launch order, drawing one assignment per workgroup.
    ///
    /// The dispatcher is consumed: assignments depend on how many draws came before, so a
    /// dispatcher must never be shared between builds.
    pub fn build<R: Remap>(
        grid: GridShape,
        mut dispatcher: ClusterDispatcher,
        remapper: &R,
    ) -> Result<Self, InvariantViolation> {
        let mut workgroups = Vec::with_capacity(grid.len());
        let mut inverse: Vec<Option<usize>> = vec![None; grid.len()];

        for (launch_id, original) in grid.launch_order().enumerate() {
            let assignment = dispatcher.next_assignment();
            let result = remapper.remap(original);
            let remapped = result.coord;

            if !grid.contains(remapped) {
                return Err(InvariantViolation::RemapOutOfGrid { original, remapped });
            }
            let slot = &mut inverse[grid.linear_id(remapped)];
            if let Some(existing) = *slot {
                return Err(InvariantViolation::RemapCollision {
                    original,
                    remapped,
                    existing: grid.coord_of(existing),
                });
            }
            *slot = Some(launch_id);

            debug!(
                "{} -> {} on cluster {} unit {}",
                original, remapped, assignment.cluster_id, assignment.unit_id
            );
            workgroups.push(Workgroup {
                original,
                remapped,
                assignment,
                diagnostics: result.diagnostics,
            });
        }

        // no collisions and no out-of-grid results over grid.len() inserts fills every slot
        let inverse = inverse.into_iter().flatten().collect::<Vec<_>>();
        assert_eq!(inverse.len(), grid.len(), "inverse mapping has gaps");

        Ok(Self {
            grid,
            workgroups,
            inverse,
        })
    }

    pub fn grid(&self) -> GridShape {
        self.grid
    }

    pub fn len(&self) -> usize {
        self.workgroups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workgroups.is_empty()
    }

    /// Workgroups in launch order.
    pub fn workgroups(&self) -> &[Workgroup] {
        &self.workgroups
    }

    pub fn by_launch_id(&self, launch_id: usize) -> &Workgroup {
        &self.workgroups[launch_id]
    }

    pub fn by_original(&self, coord: WorkgroupCoord) -> Option<&Workgroup> {
        self.grid
            .contains(coord)
            .then(|| &self.workgroups[self.grid.linear_id(coord)])
    }

    /// The workgroup that ends up computing tile `coord`.
    pub fn by_remapped(&self, coord: WorkgroupCoord) -> Option<&Workgroup> {
        self.grid
            .contains(coord)
            .then(|| &self.workgroups[self.inverse[self.grid.linear_id(coord)]])
    }

    /// One line per grid row, each cell `|(m, n) -> (m', n')|`, indexed by original tile.
    pub fn render_by_original(&self) -> String {
        self.render(|coord| self.by_original(coord))
    }

    /// Same layout as [`Self::render_by_original`], indexed by remapped tile.
    pub fn render_by_remapped(&self) -> String {
        self.render(|coord| self.by_remapped(coord))
    }

    fn render<'a>(&'a self, lookup: impl Fn(WorkgroupCoord) -> Option<&'a Workgroup>) -> String {
        let mut out = String::new();
        for row in 0..self.grid.m_tiles {
            for col in 0..self.grid.n_tiles {
                if let Some(wg) = lookup(WorkgroupCoord::new(row, col)) {
                    let _ = write!(out, " |{} -> {}|", wg.original, wg.remapped);
                }
            }
            out.push('\n');
        }
        out
    }
}
