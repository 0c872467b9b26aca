//! Grouping stage: partition enriched images by (entity, difficulty).
//!
//! A pure partition: every input image lands in exactly one group or is
//! excluded as unknown, so grouped + excluded always equals the input
//! count. Groups keep first-seen insertion order so downstream id
//! allocation is deterministic for a given input ordering.

use std::collections::HashMap;
use std::fmt;

use tracing::debug;

use caselib_core::{Difficulty, GalleryImage};

/// Identity of one image group: the (entity, difficulty) pair it shares.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupKey {
    pub entity: String,
    pub difficulty: Difficulty,
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.entity, self.difficulty)
    }
}

/// The partition of enriched images into candidate case groups.
#[derive(Debug, Default)]
pub struct ImageGroups {
    order: Vec<GroupKey>,
    groups: HashMap<GroupKey, Vec<GalleryImage>>,
    excluded: usize,
}

impl ImageGroups {
    /// Partition `images` by classification key, excluding images whose
    /// entity is unknown or absent.
    pub fn partition(images: &[GalleryImage]) -> Self {
        let mut result = ImageGroups::default();

        for image in images {
            let classification = match image.classification() {
                Some(c) if !c.is_unknown() => c,
                _ => {
                    result.excluded += 1;
                    continue;
                }
            };

            let key = GroupKey {
                entity: classification.entity,
                difficulty: classification.difficulty,
            };
            match result.groups.get_mut(&key) {
                Some(group) => group.push(image.clone()),
                None => {
                    result.order.push(key.clone());
                    result.groups.insert(key, vec![image.clone()]);
                }
            }
        }

        debug!(
            subsystem = "engine",
            component = "grouping",
            group_count = result.order.len(),
            image_count = images.len(),
            excluded = result.excluded,
            "Partition complete"
        );
        result
    }

    /// Groups in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&GroupKey, &[GalleryImage])> {
        self.order
            .iter()
            .map(move |key| (key, self.groups[key].as_slice()))
    }

    /// Number of groups.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Images excluded as unknown or unclassified.
    pub fn excluded_count(&self) -> usize {
        self.excluded
    }

    /// Total images across all groups.
    pub fn grouped_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }
}
