//! Volume diff engine.
//!
//! Reconciles the desired volume set for an auxiliary deployment against
//! the labeled volumes that physically exist, so Update can leave
//! unchanged volumes alone instead of destroying and recreating them.

use std::collections::HashSet;

use berth_engine::VolumeInfo;

/// A volume the desired state requires.
#[derive(Debug, Clone, PartialEq)]
pub struct DesiredVolume {
    /// Recomputed engine name.
    pub name: String,
    /// Volume ref within the module or record.
    pub volume_ref: String,
    /// Container mount point.
    pub target: String,
}

/// Partition of desired versus existing volumes.
///
/// Invariants: `kept ∪ new` equals the desired set, and no orphaned name
/// appears in it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VolumePlan {
    /// Existing volumes still wanted; left untouched.
    pub kept: Vec<DesiredVolume>,
    /// Desired volumes with no existing match; to be created.
    pub new: Vec<DesiredVolume>,
    /// Existing volume names no desired entry matches; removed after the
    /// swap.
    pub orphaned: Vec<String>,
}

/// Partition `desired` against the `existing` labeled volumes.
pub fn diff(desired: &[DesiredVolume], existing: &[VolumeInfo]) -> VolumePlan {
    let existing_names: HashSet<&str> = existing.iter().map(|v| v.name.as_str()).collect();
    let desired_names: HashSet<&str> = desired.iter().map(|v| v.name.as_str()).collect();

    let mut plan = VolumePlan::default();
    for volume in desired {
        if existing_names.contains(volume.name.as_str()) {
            plan.kept.push(volume.clone());
        } else {
            plan.new.push(volume.clone());
        }
    }
    plan.orphaned = existing
        .iter()
        .filter(|v| !desired_names.contains(v.name.as_str()))
        .map(|v| v.name.clone())
        .collect();
    plan
}
