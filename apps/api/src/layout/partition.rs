//! Partition Engine — recursive weight-driven subdivision of blocks into a split tree.
//!
//! # Algorithm
//! - 1 block  → leaf.
//! - 2 blocks → one split, ratio `wA / (wA + wB)`, clamped to [0.2, 0.8].
//! - N blocks → sort by weight (descending, stable), walk the sorted weights and
//!   take the cut whose cumulative fraction lands in [0.4, 0.7] nearest an even
//!   split (midpoint fallback), cut the *original-order* list at that index and
//!   recurse on both halves with the opposite axis.
//! - A hero block (when not every block is one) is split off first into its own
//!   leaf, taking at least [`HERO_MIN_SHARE`] of the extent whatever its weight.
//!   The remaining blocks are partitioned as above.
//!
//! Every call consumes its input slice and recurses on strictly smaller slices,
//! so recursion depth is bounded by the number of blocks.

use serde::Serialize;

use crate::blocks::{Block, BlockKind, Orientation};
use crate::layout::geometry::{clamp_ratio, normalize_weight, weight_ratio, Axis};

/// Cumulative weight window in which the N-block cut is placed.
const CUT_WINDOW_MIN: f32 = 0.4;
const CUT_WINDOW_MAX: f32 = 0.7;

/// Smallest share of its parent an isolated hero leaf receives.
const HERO_MIN_SHARE: f32 = 0.6;

// ────────────────────────────────────────────────────────────────────────────
// Tree type
// ────────────────────────────────────────────────────────────────────────────

/// Binary partition tree. Recomputed from scratch on every layout pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "node", rename_all = "camelCase")]
pub enum PartitionNode {
    Leaf {
        block: Block,
    },
    Split {
        axis: Axis,
        /// Fraction of the parent's extent given to `a`. Always within [0.2, 0.8].
        ratio: f32,
        a: Box<PartitionNode>,
        b: Box<PartitionNode>,
    },
}

impl PartitionNode {
    /// Leaf blocks in left-to-right (a before b) order.
    pub fn leaves(&self) -> Vec<&Block> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a Block>) {
        match self {
            PartitionNode::Leaf { block } => out.push(block),
            PartitionNode::Split { a, b, .. } => {
                a.collect_leaves(out);
                b.collect_leaves(out);
            }
        }
    }

    pub fn depth(&self) -> usize {
        match self {
            PartitionNode::Leaf { .. } => 0,
            PartitionNode::Split { a, b, .. } => 1 + a.depth().max(b.depth()),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Direction selection
// ────────────────────────────────────────────────────────────────────────────

/// Picks the top-level axis from the content mix.
///
/// Order of precedence:
/// 1. Copy-heavy sets (more copy blocks than images, and more than 2 copy blocks) → column.
/// 2. Images whose known orientations lean portrait → row (give them width);
///    lean landscape → column (give them height).
/// 3. Any image + copy mix, or multiple images → row.
/// 4. Otherwise → column.
pub fn choose_direction(blocks: &[Block]) -> Axis {
    let image_count = blocks.iter().filter(|b| b.kind.is_image()).count();
    let copy_count = blocks.iter().filter(|b| b.kind.is_copy()).count();

    if copy_count > image_count && copy_count > 2 {
        return Axis::Column;
    }

    let (mut portrait, mut landscape) = (0usize, 0usize);
    for block in blocks.iter().filter(|b| b.kind == BlockKind::Image) {
        match block.orientation() {
            Some(Orientation::Portrait) => portrait += 1,
            Some(Orientation::Landscape) => landscape += 1,
            _ => {}
        }
    }
    if portrait > landscape {
        return Axis::Row;
    }
    if landscape > portrait {
        return Axis::Column;
    }

    if (image_count >= 1 && copy_count >= 1) || image_count > 1 {
        return Axis::Row;
    }

    Axis::Column
}

// ────────────────────────────────────────────────────────────────────────────
// Partition
// ────────────────────────────────────────────────────────────────────────────

/// Subdivides `blocks` into a split tree, starting with `axis` at the root.
///
/// Returns `None` only for an empty slice.
pub fn partition(blocks: &[Block], axis: Axis) -> Option<PartitionNode> {
    if let Some(index) = hero_index(blocks) {
        return isolate_hero(blocks, index, axis);
    }
    match blocks {
        [] => None,
        [only] => Some(PartitionNode::Leaf {
            block: only.clone(),
        }),
        [first, second] => {
            let wa = weight_of(first) as u64;
            let wb = weight_of(second) as u64;
            Some(PartitionNode::Split {
                axis,
                ratio: weight_ratio(wa, wa + wb),
                a: Box::new(PartitionNode::Leaf {
                    block: first.clone(),
                }),
                b: Box::new(PartitionNode::Leaf {
                    block: second.clone(),
                }),
            })
        }
        _ => {
            let cut = split_index(blocks);
            let (section_a, section_b) = blocks.split_at(cut);
            let total: u64 = blocks.iter().map(|b| weight_of(b) as u64).sum();
            let weight_a: u64 = section_a.iter().map(|b| weight_of(b) as u64).sum();

            let a = partition(section_a, axis.toggle())?;
            let b = partition(section_b, axis.toggle())?;
            Some(PartitionNode::Split {
                axis,
                ratio: weight_ratio(weight_a, total),
                a: Box::new(a),
                b: Box::new(b),
            })
        }
    }
}

/// First hero block, unless the set is a single block or made only of heroes.
fn hero_index(blocks: &[Block]) -> Option<usize> {
    if blocks.len() < 2 || blocks.iter().all(|b| b.is_hero) {
        return None;
    }
    blocks.iter().position(|b| b.is_hero)
}

/// Splits the hero at `index` into its own leaf and partitions the rest on the
/// opposite axis. The hero leads unless it is the last block.
fn isolate_hero(blocks: &[Block], index: usize, axis: Axis) -> Option<PartitionNode> {
    let hero = &blocks[index];
    let rest: Vec<Block> = blocks
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != index)
        .map(|(_, b)| b.clone())
        .collect();

    let total: u64 = blocks.iter().map(|b| weight_of(b) as u64).sum();
    let share = clamp_ratio(weight_ratio(weight_of(hero) as u64, total).max(HERO_MIN_SHARE));

    let hero_leaf = Box::new(PartitionNode::Leaf {
        block: hero.clone(),
    });
    let rest = Box::new(partition(&rest, axis.toggle())?);

    Some(if index + 1 == blocks.len() {
        PartitionNode::Split {
            axis,
            ratio: clamp_ratio(1.0 - share),
            a: rest,
            b: hero_leaf,
        }
    } else {
        PartitionNode::Split {
            axis,
            ratio: share,
            a: hero_leaf,
            b: rest,
        }
    })
}

/// Cut index for an N-block set (N ≥ 2). Always within `1..N`.
///
/// Walks the weight-sorted sequence; among the prefixes whose cumulative weight
/// fraction lies in [0.4, 0.7], picks the one closest to an even split (ties go to
/// the larger prefix, so the heavier items stay together in section A). Falls back
/// to the midpoint when no prefix lands in the window.
pub(crate) fn split_index(blocks: &[Block]) -> usize {
    let n = blocks.len();
    let midpoint = (n / 2).max(1);
    if n < 2 {
        return midpoint;
    }

    let mut weights: Vec<u64> = blocks.iter().map(|b| weight_of(b) as u64).collect();
    // sort_by is stable, so equal weights keep their input order.
    weights.sort_by(|a, b| b.cmp(a));
    let total: u64 = weights.iter().sum();

    let mut cumulative = 0u64;
    let mut best: Option<(usize, u64)> = None;
    for (i, weight) in weights.iter().enumerate().take(n - 1) {
        cumulative += weight;
        let fraction = cumulative as f32 / total as f32;
        if !(CUT_WINDOW_MIN..=CUT_WINDOW_MAX).contains(&fraction) {
            continue;
        }
        let distance = (2 * cumulative).abs_diff(total);
        if best.map_or(true, |(_, d)| distance <= d) {
            best = Some((i + 1, distance));
        }
    }
    best.map(|(index, _)| index).unwrap_or(midpoint)
}

fn weight_of(block: &Block) -> u32 {
    normalize_weight(block.size_weight)
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
