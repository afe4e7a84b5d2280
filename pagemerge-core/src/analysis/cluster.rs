use rstar::{AABB, RTree, RTreeObject};
use tracing::*;

use crate::{
    analysis::bbox::Bbox,
    layout::{component::Component, element::Detection},
};

/// R-tree entry pointing back at a detection index.
#[derive(Debug, Clone, Copy)]
struct IndexedBox {
    envelope: AABB<[f32; 2]>,
    idx: usize,
}

impl RTreeObject for IndexedBox {
    type Envelope = AABB<[f32; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Spatial index over the boxes of a single page.
///
/// Degenerate boxes are left out of the tree, they can only ever form
/// singleton clusters.
struct OverlapIndex<'a> {
    boxes: &'a [Bbox],
    tree: RTree<IndexedBox>,
}

impl<'a> OverlapIndex<'a> {
    fn new(boxes: &'a [Bbox]) -> Self {
        let entries = boxes
            .iter()
            .enumerate()
            .filter(|(_, bbox)| !bbox.is_degenerate())
            .map(|(idx, bbox)| IndexedBox {
                envelope: bbox.envelope(),
                idx,
            })
            .collect();

        Self {
            boxes,
            tree: RTree::bulk_load(entries),
        }
    }

    /// Indices whose IoU with `idx` reaches `threshold`, ascending.
    fn neighbours(&self, idx: usize, threshold: f32) -> Vec<usize> {
        let bbox = &self.boxes[idx];
        if bbox.is_degenerate() {
            return Vec::new();
        }

        let mut found: Vec<usize> = self
            .tree
            .locate_in_envelope_intersecting(&bbox.envelope())
            .map(|entry| entry.idx)
            .filter(|&j| j != idx && bbox.iou(&self.boxes[j]) >= threshold)
            .collect();
        found.sort_unstable();
        found
    }
}

/// Groups box indices into maximal connected overlap groups.
///
/// Two boxes are linked when their IoU is at least `threshold`; a group is
/// everything reachable through such links, so members of one group need not
/// overlap each other directly. Groups come out in order of their lowest
/// index and each group is sorted ascending. Every index appears exactly once.
///
/// # Arguments
/// * `boxes` - The boxes of one page
/// * `threshold` - Minimum IoU for two boxes to be linked
///
/// # Example
/// ```
/// use pagemerge_core::analysis::{bbox::Bbox, cluster::cluster_indices};
///
/// let boxes = [
///     Bbox::from_corners(0.0, 0.0, 100.0, 20.0),
///     Bbox::from_corners(0.0, 50.0, 100.0, 70.0),
///     Bbox::from_corners(0.0, 1.0, 100.0, 21.0),
/// ];
/// assert_eq!(cluster_indices(&boxes, 0.5), vec![vec![0, 2], vec![1]]);
/// ```
pub fn cluster_indices(boxes: &[Bbox], threshold: f32) -> Vec<Vec<usize>> {
    let index = OverlapIndex::new(boxes);
    let mut visited = vec![false; boxes.len()];
    let mut groups = Vec::new();

    for seed in 0..boxes.len() {
        if visited[seed] {
            continue;
        }

        let mut stack = vec![seed];
        let mut group = Vec::new();

        while let Some(idx) = stack.pop() {
            if visited[idx] {
                continue;
            }
            visited[idx] = true;
            group.push(idx);

            // pushed in reverse so the lowest neighbour is visited first
            for j in index.neighbours(idx, threshold).into_iter().rev() {
                if !visited[j] {
                    stack.push(j);
                }
            }
        }

        group.sort_unstable();
        groups.push(group);
    }

    groups
}

/// Clusters one page's detections into components.
pub fn cluster_detections(detections: Vec<Detection>, threshold: f32) -> Vec<Component> {
    if detections.is_empty() {
        return Vec::new();
    }

    let boxes: Vec<Bbox> = detections.iter().map(|d| d.bbox).collect();
    let groups = cluster_indices(&boxes, threshold);
    debug!(
        "Clustered {} detections into {} components",
        detections.len(),
        groups.len()
    );

    let mut slots: Vec<Option<Detection>> = detections.into_iter().map(Some).collect();
    groups
        .into_iter()
        .map(|group| {
            Component::new(
                group
                    .into_iter()
                    .filter_map(|idx| slots[idx].take())
                    .collect(),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::labels::Category;

    fn boxes() -> Vec<Bbox> {
        vec![
            Bbox::from_corners(0.0, 0.0, 100.0, 20.0),
            // near duplicate of 0
            Bbox::from_corners(0.0, 2.0, 100.0, 22.0),
            Bbox::from_corners(0.0, 50.0, 100.0, 200.0),
            // chained to 1 but not to 0 at 0.75
            Bbox::from_corners(0.0, 4.0, 100.0, 24.0),
            Bbox::from_corners(300.0, 300.0, 310.0, 310.0),
        ]
    }

    #[test]
    fn test_cluster_totality() {
        for threshold in [0.1, 0.5, 0.8, 1.0] {
            let groups = cluster_indices(&boxes(), threshold);
            let mut all: Vec<usize> = groups.into_iter().flatten().collect();
            all.sort_unstable();
            assert_eq!(all, vec![0, 1, 2, 3, 4]);
        }
    }

    #[test]
    fn test_cluster_groups_overlapping() {
        let groups = cluster_indices(&boxes(), 0.5);
        assert_eq!(groups, vec![vec![0, 1, 3], vec![2], vec![4]]);
    }

    #[test]
    fn test_cluster_is_connected_not_mutual() {
        // 0~1 and 1~3 pass 0.75, 0~3 does not
        let b = boxes();
        assert!(b[0].iou(&b[1]) >= 0.75);
        assert!(b[1].iou(&b[3]) >= 0.75);
        assert!(b[0].iou(&b[3]) < 0.75);

        let groups = cluster_indices(&b, 0.75);
        assert_eq!(groups[0], vec![0, 1, 3]);
    }

    #[test]
    fn test_cluster_monotonic_in_threshold() {
        let b = boxes();
        let mut previous = usize::MAX;
        for threshold in [0.05, 0.3, 0.6, 0.75, 0.9, 1.0] {
            let largest = cluster_indices(&b, threshold)
                .iter()
                .map(Vec::len)
                .max()
                .unwrap();
            assert!(largest <= previous);
            previous = largest;
        }
    }

    #[test]
    fn test_cluster_degenerate_boxes_are_singletons() {
        let b = vec![
            Bbox::from_corners(0.0, 0.0, 10.0, 10.0),
            Bbox::from_corners(10.0, 10.0, 0.0, 0.0),
            Bbox::from_corners(0.0, 0.0, 10.0, 0.0),
            Bbox::from_corners(0.0, 0.0, 10.0, 10.0),
        ];
        let groups = cluster_indices(&b, 0.5);
        assert_eq!(groups, vec![vec![0, 3], vec![1], vec![2]]);
    }

    #[test]
    fn test_cluster_detections_builds_components() {
        let detections = vec![
            Detection::new(
                Bbox::from_corners(0.0, 0.0, 100.0, 40.0),
                Category::Table,
                "<table></table>",
            ),
            Detection::new(
                Bbox::from_corners(0.0, 60.0, 100.0, 80.0),
                Category::Text,
                "after",
            ),
            Detection::new(
                Bbox::from_corners(0.0, 0.0, 100.0, 42.0),
                Category::Text,
                "cells",
            ),
        ];
        let components = cluster_detections(detections, 0.5);
        assert_eq!(components.len(), 2);
        assert_eq!(components[0].text(), "<table></table>\ncells");
        assert!(components[0].is_table());
        assert_eq!(components[1].text(), "after");
    }

    #[test]
    fn test_cluster_empty_page() {
        assert!(cluster_detections(Vec::new(), 0.5).is_empty());
    }
}
