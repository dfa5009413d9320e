//! The node pool and distance kernels the engine treats as opaque.
//!
//! Problem-file parsing (TSPLIB keyword/value text) is out of scope for this
//! crate; [`Repo`] is the boundary a loader hands nodes and a cost matrix to.
//! Everything below this line is what the engine actually consumes: dense
//! 1-based node ids, a `distance(a, b)` kernel, and optional fixed edges.

use getset::Getters;

use crate::error::{Error, Result};
use crate::Scalar;

/// Which distance kernel [`Repo::distance`] applies to a coordinate pair.
///
/// TSPLIB's `EDGE_WEIGHT_TYPE` keyword selects one of these; the crate that
/// reads problem files is responsible for mapping the keyword to this enum; we
/// only implement the arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeightKind {
    Euc2d,
    Euc3d,
    Max2d,
    Max3d,
    Man2d,
    Man3d,
    Ceil2d,
    Ceil3d,
    Geo,
    Att,
    /// Distances come from an explicit matrix rather than coordinates.
    Explicit,
}

/// Layout of an explicit cost matrix, mirroring TSPLIB's `EDGE_WEIGHT_FORMAT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatrixKind {
    Full,
    UpperRow,
    UpperDiagRow,
    LowerRow,
    LowerDiagRow,
}

/// TSPLIB's `TYPE` keyword. Distinct from [`WeightKind`]: this is the
/// *problem variant* the engine is solving, not how an edge's cost is
/// computed.
///
/// The only place the engine itself branches on this is the gain criterion
/// (`Best2OptMove.c`: `GainCriterionUsed && ProblemType != HCP && ProblemType
/// != HPP`) - for a Hamiltonian cycle/path problem any legal completion is
/// acceptable, so a negative running gain must not prune a candidate the way
/// it does for TSP/ATSP. ATSP and HPP instances are realised by transforming
/// the underlying cost matrix ([`atsp_double`], [`hpp_augment`]) before
/// building the [`Repo`]; the engine then just sees a larger symmetric TSP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProblemKind {
    Tsp,
    Atsp,
    Hcp,
    Hpp,
}

impl Default for ProblemKind {
    fn default() -> Self {
        ProblemKind::Tsp
    }
}

impl ProblemKind {
    /// `true` iff the gain criterion's `G1 <= 0` pruning is suspended for
    /// this problem type.
    pub fn suspends_gain_criterion(self) -> bool {
        matches!(self, ProblemKind::Hcp | ProblemKind::Hpp)
    }
}

/// One city: coordinates (when coordinate-based), the Lagrangian penalty `Pi`
/// used in α-nearness / held-Karp style cost adjustment, and an optional fixed
/// neighbour pair from `FIXED_EDGES_SECTION`.
#[derive(Debug, Clone, Copy, Getters, PartialEq)]
#[getset(get = "pub")]
pub struct Node {
    id: usize,
    x: Scalar,
    y: Scalar,
    z: Scalar,
    pi: Scalar,
}

impl Node {
    fn new(id: usize, x: Scalar, y: Scalar, z: Scalar) -> Self {
        Self { id, x, y, z, pi: 0. }
    }

    pub fn set_pi(&mut self, pi: Scalar) {
        self.pi = pi;
    }
}

/// The node pool plus whatever lets it answer `distance(a, b)`.
///
/// `C(a, b) = Distance(a, b) - Pi(a) - Pi(b)` per the Held-Karp-adjusted cost
/// used throughout the candidate/move machinery; [`Repo::distance`] returns
/// the raw kernel value and [`Repo::cost`] applies the `Pi` adjustment.
#[derive(Debug)]
pub struct Repo {
    kind: WeightKind,
    problem_kind: ProblemKind,
    nodes: Vec<Node>,
    matrix: Option<Vec<Vec<Scalar>>>,
    fixed: Vec<Option<(usize, usize)>>,
}

impl Repo {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// The `TYPE` keyword this repo was built for (TSP by default).
    pub fn problem_kind(&self) -> ProblemKind {
        self.problem_kind
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: usize) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn node_mut(&mut self, id: usize) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn kind(&self) -> WeightKind {
        self.kind
    }

    /// Raw distance kernel, ignoring `Pi` penalties.
    pub fn distance(&self, a: usize, b: usize) -> Scalar {
        if a == b {
            return 0.;
        }
        if let Some(m) = &self.matrix {
            return matrix_lookup(m, a, b);
        }
        let (na, nb) = (&self.nodes[a], &self.nodes[b]);
        match self.kind {
            WeightKind::Euc2d => euc(na, nb),
            WeightKind::Euc3d => euc3(na, nb),
            WeightKind::Max2d => max2(na, nb),
            WeightKind::Max3d => max3(na, nb),
            WeightKind::Man2d => man2(na, nb),
            WeightKind::Man3d => man3(na, nb),
            WeightKind::Ceil2d => euc(na, nb).ceil(),
            WeightKind::Ceil3d => euc3(na, nb).ceil(),
            WeightKind::Geo => geo(na, nb),
            WeightKind::Att => att(na, nb),
            WeightKind::Explicit => unreachable!("explicit matrix repo built without a matrix"),
        }
    }

    /// `Pi`-adjusted cost used by the move searchers: `C(a,b) = d(a,b) - Pi(a) - Pi(b)`.
    pub fn cost(&self, a: usize, b: usize) -> Scalar {
        self.distance(a, b) - self.nodes[a].pi - self.nodes[b].pi
    }

    pub fn fixed_neighbours(&self, id: usize) -> Option<(usize, usize)> {
        self.fixed.get(id).copied().flatten()
    }

    pub fn is_fixed_edge(&self, a: usize, b: usize) -> bool {
        matches!(self.fixed_neighbours(a), Some((f1, f2)) if f1 == b || f2 == b)
    }
}

fn matrix_lookup(m: &[Vec<Scalar>], a: usize, b: usize) -> Scalar {
    if a == b {
        0.
    } else if a < m.len() && b < m[a].len() {
        m[a][b]
    } else {
        m[b][a]
    }
}

fn euc(a: &Node, b: &Node) -> Scalar {
    ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt()
}

fn euc3(a: &Node, b: &Node) -> Scalar {
    ((a.x - b.x).powi(2) + (a.y - b.y).powi(2) + (a.z - b.z).powi(2)).sqrt()
}

fn max2(a: &Node, b: &Node) -> Scalar {
    (a.x - b.x).abs().max((a.y - b.y).abs())
}

fn max3(a: &Node, b: &Node) -> Scalar {
    (a.x - b.x).abs().max((a.y - b.y).abs()).max((a.z - b.z).abs())
}

fn man2(a: &Node, b: &Node) -> Scalar {
    (a.x - b.x).abs() + (a.y - b.y).abs()
}

fn man3(a: &Node, b: &Node) -> Scalar {
    (a.x - b.x).abs() + (a.y - b.y).abs() + (a.z - b.z).abs()
}

/// TSPLIB's GEO kernel: coordinates are encoded degrees-and-minutes, distance
/// is great-circle on a sphere of radius 6378.388km.
fn geo(a: &Node, b: &Node) -> Scalar {
    const PI: Scalar = std::f64::consts::PI;
    let to_radians = |coord: Scalar| -> Scalar {
        let deg = coord.trunc();
        let min = coord - deg;
        PI * (deg + 5.0 * min / 3.0) / 180.0
    };
    let (lat1, lon1) = (to_radians(a.x), to_radians(a.y));
    let (lat2, lon2) = (to_radians(b.x), to_radians(b.y));

    let q1 = (lon1 - lon2).cos();
    let q2 = (lat1 - lat2).cos();
    let q3 = (lat1 + lat2).cos();
    6378.388 * (0.5 * ((1.0 + q1) * q2 - (1.0 - q1) * q3)).acos()
}

/// TSPLIB's ATT (pseudo-Euclidean) kernel.
fn att(a: &Node, b: &Node) -> Scalar {
    let r = (((a.x - b.x).powi(2) + (a.y - b.y).powi(2)) / 10.0).sqrt();
    let t = r.round();
    if t < r {
        t + 1.0
    } else {
        t
    }
}

/// Builds a [`Repo`] either from coordinates or from an explicit cost matrix.
pub struct RepoBuilder {
    kind: WeightKind,
    problem_kind: ProblemKind,
    coords: Vec<(Scalar, Scalar, Scalar)>,
    matrix: Option<Vec<Vec<Scalar>>>,
    matrix_kind: MatrixKind,
    capacity: usize,
    fixed: Vec<(usize, usize)>,
}

impl RepoBuilder {
    pub fn new(kind: WeightKind) -> Self {
        Self {
            kind,
            problem_kind: ProblemKind::default(),
            coords: Vec::new(),
            matrix: None,
            matrix_kind: MatrixKind::Full,
            capacity: 0,
            fixed: Vec::new(),
        }
    }

    /// Sets the `TYPE` this repo is being built for. Callers building an ATSP
    /// or HPP repo should also transform their cost matrix with
    /// [`atsp_double`]/[`hpp_augment`] before calling [`RepoBuilder::costs`];
    /// this setter only controls the gain-criterion exception, it does not
    /// itself grow the node count.
    pub fn problem_kind(mut self, kind: ProblemKind) -> Self {
        self.problem_kind = kind;
        self
    }

    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self.coords.reserve(capacity);
        self
    }

    /// Appends one node with the given 3D coordinates (`z` is ignored by 2D kernels).
    pub fn add(&mut self, x: Scalar, y: Scalar, z: Scalar) -> &mut Self {
        self.coords.push((x, y, z));
        self
    }

    /// Supplies an explicit cost matrix, in the given layout, instead of coordinates.
    pub fn costs(mut self, matrix: Vec<Vec<Scalar>>, layout: MatrixKind) -> Self {
        self.matrix_kind = layout;
        self.matrix = Some(expand_matrix(matrix, layout));
        self
    }

    pub fn fixed_edge(mut self, a: usize, b: usize) -> Self {
        self.fixed.push((a, b));
        self
    }

    pub fn build(self) -> Result<Repo> {
        let n = if let Some(m) = &self.matrix {
            m.len()
        } else {
            self.coords.len()
        };

        if let Some(m) = &self.matrix {
            for (i, row) in m.iter().enumerate() {
                if row.len() != n {
                    return Err(Error::MatrixNotSquare {
                        rows: n,
                        cols: row.len().max(i),
                    });
                }
            }
        }

        let nodes = if self.matrix.is_some() {
            (0..n).map(|id| Node::new(id, 0., 0., 0.)).collect()
        } else {
            self.coords
                .iter()
                .enumerate()
                .map(|(id, &(x, y, z))| Node::new(id, x, y, z))
                .collect()
        };

        let mut fixed = vec![None; n];
        for (a, b) in self.fixed {
            if a >= n {
                return Err(Error::NodeOutOfRange(a));
            }
            if b >= n {
                return Err(Error::NodeOutOfRange(b));
            }
            fixed[a] = Some(extend_fixed(fixed[a], b));
            fixed[b] = Some(extend_fixed(fixed[b], a));
        }

        Ok(Repo {
            kind: self.kind,
            problem_kind: self.problem_kind,
            nodes,
            matrix: self.matrix,
            fixed,
        })
    }
}

/// Transforms an `n x n` asymmetric cost matrix into the `2n x 2n` symmetric
/// matrix (plus the `n` fixed node<->duplicate edges) the engine actually
/// solves, per `ReadProblem.c`'s `Distance_ATSP`/`CreateNodes` handling of
/// `TYPE = ATSP`: node `i` is split into a pair `(i, i+n)`; the forward cost
/// `c(i,j)` becomes the cross cost `c'(i, j+n)`, the `(i, i+n)` pair is forced
/// together by a zero-cost fixed edge, and same-side pairs `(i,j)`/`(i+n,j+n)`
/// are forbidden by an arbitrarily large cost so the optimal symmetric tour
/// always alternates sides. Each traversed arc `i -> j` of the original tour
/// shows up as exactly one priced edge `(i, j+n)` plus one zero-cost paired
/// edge `(j+n, j)`, so a symmetric tour of the doubled instance has the same
/// total cost `L` as the asymmetric tour it encodes.
pub fn atsp_double(costs: &[Vec<Scalar>]) -> (Vec<Vec<Scalar>>, Vec<(usize, usize)>) {
    let n = costs.len();
    const FORBIDDEN: Scalar = 1e9;
    let mut m = vec![vec![FORBIDDEN; 2 * n]; 2 * n];
    for i in 0..n {
        m[i][i] = 0.;
        m[n + i][n + i] = 0.;
        m[i][n + i] = 0.;
        m[n + i][i] = 0.;
        for j in 0..n {
            if i == j {
                continue;
            }
            m[i][n + j] = costs[i][j];
            m[n + j][i] = costs[i][j];
        }
    }
    let fixed: Vec<(usize, usize)> = (0..n).map(|i| (i, n + i)).collect();
    (m, fixed)
}

/// Appends a zero-cost dummy node connected to every other node, turning a
/// Hamiltonian-*path* search over `costs` into a Hamiltonian-*cycle* search
/// the engine already knows how to run: any tour of the augmented instance
/// splits into a Hamiltonian path of the original nodes at the two zero-cost
/// edges touching the dummy (`CreateNodes`'s `Dimension++` for `TYPE = HPP`,
/// with the new row/column zeroed per `ReadProblem.c`'s special-cased
/// `Ni->C[Nj->Id] = 0` branch for the dummy node).
///
/// The returned matrix has the dummy node as the last row/column (id `n`).
pub fn hpp_augment(costs: &[Vec<Scalar>]) -> Vec<Vec<Scalar>> {
    let n = costs.len();
    let mut m = vec![vec![0.; n + 1]; n + 1];
    for (i, row) in costs.iter().enumerate() {
        m[i][..n].copy_from_slice(row);
    }
    m
}

fn extend_fixed(existing: Option<(usize, usize)>, b: usize) -> (usize, usize) {
    match existing {
        None => (b, usize::MAX),
        Some((f1, _)) => (f1, b),
    }
}

/// Expands an upper/lower-triangular matrix into the dense, symmetric form
/// [`Repo::distance`] indexes directly.
fn expand_matrix(input: Vec<Vec<Scalar>>, layout: MatrixKind) -> Vec<Vec<Scalar>> {
    match layout {
        MatrixKind::Full => input,
        MatrixKind::UpperRow | MatrixKind::UpperDiagRow => {
            let diag = matches!(layout, MatrixKind::UpperDiagRow);
            let n = if diag { input.len() } else { input.len() + 1 };
            let mut full = vec![vec![0.; n]; n];
            // Row i of `input` holds costs to columns i..n (diag) or i+1..n (no diag).
            for (i, row) in input.iter().enumerate() {
                let offset = if diag { i } else { i + 1 };
                for (k, &c) in row.iter().enumerate() {
                    let j = offset + k;
                    full[i][j] = c;
                    full[j][i] = c;
                }
            }
            full
        }
        MatrixKind::LowerRow | MatrixKind::LowerDiagRow => {
            let diag = matches!(layout, MatrixKind::LowerDiagRow);
            let n = if diag { input.len() } else { input.len() + 1 };
            let mut full = vec![vec![0.; n]; n];
            for (i, row) in input.iter().enumerate() {
                // Row i holds costs to columns 0..=i (diag) or 0..i (no diag).
                let row_idx = if diag { i } else { i + 1 };
                for (j, &c) in row.iter().enumerate() {
                    full[row_idx][j] = c;
                    full[j][row_idx] = c;
                }
            }
            full
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_atsp_double_forces_pairs_and_mirrors_costs() {
        let costs = vec![
            vec![0., 1., 5.],
            vec![3., 0., 2.],
            vec![4., 6., 0.],
        ];
        let (m, fixed) = atsp_double(&costs);
        assert_eq!(m.len(), 6);
        assert_eq!(fixed, vec![(0, 3), (1, 4), (2, 5)]);
        // Forward cost c(0,1) shows up as the cross cost (0, 1+3).
        assert_eq!(m[0][4], costs[0][1]);
        assert_eq!(m[1][3], costs[0][1]);
        // Node/duplicate pairs are free.
        assert_eq!(m[0][3], 0.);
        // Same-side pairs are forbidden.
        assert!(m[0][1] > 1e6);
        assert!(m[3][4] > 1e6);
    }

    #[test]
    fn test_hpp_augment_adds_zero_cost_dummy() {
        let costs = vec![vec![0., 2.], vec![2., 0.]];
        let m = hpp_augment(&costs);
        assert_eq!(m.len(), 3);
        assert_eq!(m[0][2], 0.);
        assert_eq!(m[2][0], 0.);
        assert_eq!(m[0][1], 2.);
    }

    #[test]
    fn test_gain_criterion_suspended_only_for_hcp_hpp() {
        assert!(!ProblemKind::Tsp.suspends_gain_criterion());
        assert!(!ProblemKind::Atsp.suspends_gain_criterion());
        assert!(ProblemKind::Hcp.suspends_gain_criterion());
        assert!(ProblemKind::Hpp.suspends_gain_criterion());
    }

    #[test]
    fn test_repo_builder_default_problem_kind_is_tsp() {
        let mut b = RepoBuilder::new(WeightKind::Euc2d).capacity(1);
        b.add(0., 0., 0.);
        let repo = b.build().unwrap();
        assert_eq!(repo.problem_kind(), ProblemKind::Tsp);
    }

    #[test]
    fn test_repo_builder_problem_kind_override() {
        let mut b = RepoBuilder::new(WeightKind::Euc2d)
            .problem_kind(ProblemKind::Hcp)
            .capacity(1);
        b.add(0., 0., 0.);
        let repo = b.build().unwrap();
        assert_eq!(repo.problem_kind(), ProblemKind::Hcp);
    }
}
