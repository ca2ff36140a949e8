//! Cluster types

use serde::Serialize;

use super::point::VisitPoint;

/// A capacity- and proximity-bounded group of visit points, before it has
/// been written to the store.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterDraft {
    pub name: String,
    pub points: Vec<VisitPoint>,
}

impl ClusterDraft {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// A cluster as persisted, with its store-assigned id.
/// The point set is final once the cluster is stored.
#[derive(Debug, Clone)]
pub struct StoredCluster {
    pub id: i64,
    pub name: String,
    pub points: Vec<VisitPoint>,
}
