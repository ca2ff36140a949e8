//! Ordered depot-anchored tours

use uuid::Uuid;

/// One node of a tour. The depot is its own variant so tour boundaries
/// never rely on a nullable visit id.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TourNode {
    Depot,
    Visit {
        point_id: Uuid,
        visit_minutes: i32,
    },
}

impl TourNode {
    pub fn is_depot(&self) -> bool {
        matches!(self, Self::Depot)
    }

    pub fn point_id(&self) -> Option<Uuid> {
        match self {
            Self::Depot => None,
            Self::Visit { point_id, .. } => Some(*point_id),
        }
    }

    pub fn visit_minutes(&self) -> i32 {
        match self {
            Self::Depot => 0,
            Self::Visit { visit_minutes, .. } => *visit_minutes,
        }
    }
}

/// A stop within a computed tour, tied back to its row/column in the
/// travel matrices the tour was solved against.
#[derive(Debug, Clone)]
pub struct TourStop {
    pub node: TourNode,
    pub matrix_idx: usize,
}

/// An ordered closed tour for one cluster. First and last stop are the
/// depot; every cluster point appears exactly once in between.
#[derive(Debug, Clone)]
pub struct Tour {
    pub cluster_id: i64,
    pub stops: Vec<TourStop>,
    /// Total driving time over all legs in seconds
    pub total_travel_seconds: u64,
    /// Total driving distance over all legs in meters
    pub total_distance_meters: u64,
}

impl Tour {
    /// Number of customer visits (excludes the depot anchors)
    pub fn visit_count(&self) -> usize {
        self.stops.iter().filter(|s| !s.node.is_depot()).count()
    }
}
