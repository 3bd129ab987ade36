//! Arena of discovered regions.
//!
//! Regions of one document live in a [`RegionTree`] and refer to each other
//! by [`RegionId`]. The root region is the host document itself and has no
//! depth; regions found directly in the host are at depth 0. Every region
//! other than the root stores its range relative to the local text of its
//! parent.

use std::ops::Range;

use crate::error::RegionContext;

/// Index of a region inside its [`RegionTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegionId(usize);

impl RegionId {
    /// Returns the arena index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// One embedded region and its extracted text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    /// Byte range in the parent's local text; the root spans the document.
    pub range: Range<usize>,
    /// Language label.
    pub language: String,
    /// Escape-sensitive character inherited from the query.
    pub escape: Option<char>,
    /// Nesting depth, with 0 for regions found directly in the host. `None`
    /// marks the host document itself.
    pub depth: Option<usize>,
    /// Unescaped text of the region, before child replacement.
    pub local: String,
    /// Nested regions ordered by start offset in `local`.
    pub children: Vec<RegionId>,
}

impl Region {
    /// Returns the error context describing this region.
    #[must_use]
    pub fn context(&self) -> RegionContext {
        self.depth.map_or_else(
            || RegionContext::host(self.range.clone(), self.language.clone()),
            |depth| RegionContext::new(self.range.clone(), depth, self.language.clone()),
        )
    }

    /// Returns whether this region is the host document.
    #[must_use]
    pub const fn is_host(&self) -> bool {
        self.depth.is_none()
    }
}

/// Regions of a document addressed by [`RegionId`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionTree {
    regions: Vec<Region>,
    root: RegionId,
}

impl RegionTree {
    /// Returns the region with the given id.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not issued by this tree.
    #[must_use]
    #[expect(
        clippy::indexing_slicing,
        reason = "ids are only issued by the builder that filled this arena"
    )]
    pub fn get(&self, id: RegionId) -> &Region {
        &self.regions[id.0]
    }

    /// Returns the id of the host document region.
    #[must_use]
    pub const fn root(&self) -> RegionId {
        self.root
    }

    /// Returns the number of regions, including the root.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.regions.len()
    }

    /// Returns whether the tree holds only the root.
    #[must_use]
    pub const fn has_injections(&self) -> bool {
        self.regions.len() > 1
    }

    /// Iterates over the regions with their ids, children before parents.
    pub fn iter(&self) -> impl Iterator<Item = (RegionId, &Region)> {
        self.regions
            .iter()
            .enumerate()
            .map(|(index, region)| (RegionId(index), region))
    }

    /// Returns the deepest nesting level in the tree, or `None` when the
    /// document has no embedded regions.
    #[must_use]
    pub fn max_depth(&self) -> Option<usize> {
        self.regions.iter().filter_map(|r| r.depth).max()
    }
}

/// Fills a [`RegionTree`] bottom-up.
#[derive(Debug, Default)]
pub(crate) struct RegionArena {
    regions: Vec<Region>,
}

impl RegionArena {
    /// Stores `region`, whose children must already be in the arena.
    pub(crate) fn push(&mut self, region: Region) -> RegionId {
        self.regions.push(region);
        RegionId(self.regions.len() - 1)
    }

    /// Seals the arena with `root` as the host document.
    pub(crate) fn finish(self, root: RegionId) -> RegionTree {
        RegionTree {
            regions: self.regions,
            root,
        }
    }
}
