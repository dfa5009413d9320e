//! A Lin-Kernighan style heuristic solver for the Travelling Salesman Problem
//! and its close relatives (ATSP, HCP, HPP).
//!
//! The crate is split into the pieces a faithful LK port needs:
//!
//! - [`repo`]: the node pool and distance kernels the engine treats as opaque.
//! - [`candidate`]: per-node candidate-edge lists (a minimal MST/nearest-neighbour
//!   stand-in for the real α-nearness precomputation, which is out of scope here).
//! - [`tour`]: the tour representation(s) - [`tour::array::Array`] and the
//!   segmented [`tour::tll::TwoLevelList`] - plus the `Tour` trait they share.
//! - [`queue`], [`hash`], [`excluded`], [`swap`]: the small coupled subsystems
//!   (active-node queue, visited-tour hash table, excluded-edge bookkeeping,
//!   trial undo) that the move searchers and driver share.
//! - [`search`]: the move searchers (`BestkOptMove`, the sampled 2-opt variants,
//!   and the breadth-first tree searcher).
//! - [`driver`]: `LinKernighan`/`LinKernighanSW`, `Gain23`, and the run loop.

pub mod candidate;
pub mod driver;
pub mod engine;
pub mod error;
pub mod excluded;
pub mod hash;
pub mod params;
pub mod queue;
pub mod repo;
pub mod search;
pub mod swap;
pub mod tour;

pub use error::{Error, Result};
pub use params::Params;
pub use repo::{atsp_double, hpp_augment, MatrixKind, Node, ProblemKind, Repo, RepoBuilder, WeightKind};

/// Common scalar type used throughout the crate for coordinates and costs.
///
/// A single alias keeps the distance kernels, gain arithmetic, and tour cost
/// bookkeeping consistent without threading a generic parameter everywhere.
pub type Scalar = f64;

/// Sentinel used in place of `Option<usize>` in the handful of places (segment
/// links, swap-tree child/sibling links) where an arena index of `usize::MAX`
/// unambiguously means "absent" and a real `Option` would cost an extra word
/// in a hot array.
pub const NONE: usize = usize::MAX;
