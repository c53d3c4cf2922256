//! Scaling decision — direction and magnitude of a cluster change.

/// Which way the cluster has to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalingDirection {
    /// Already at the desired size.
    None,
    /// Remove members.
    ScaleIn,
    /// Add members.
    ScaleOut,
}

impl std::fmt::Display for ScalingDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::None => "none",
            Self::ScaleIn => "in",
            Self::ScaleOut => "out",
        })
    }
}

/// Compare the cluster's current capacity with the strategy's desired count.
///
/// Returns the number of members to add or remove and the direction.
/// The magnitude is zero exactly when the direction is `None`.
pub fn compute_direction(current: i64, desired: i64) -> (u64, ScalingDirection) {
    let magnitude = current.abs_diff(desired);
    let direction = match desired.cmp(&current) {
        std::cmp::Ordering::Less => ScalingDirection::ScaleIn,
        std::cmp::Ordering::Greater => ScalingDirection::ScaleOut,
        std::cmp::Ordering::Equal => ScalingDirection::None,
    };
    (magnitude, direction)
}
