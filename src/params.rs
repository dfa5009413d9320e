//! Run parameters: the globals a parameters-file loader would populate and
//! hand to the engine. Parsing the `key : value` file format itself is out of
//! scope; this module only models the resulting values and their defaults.

use getset::{CopyGetters, Getters};

/// Which move searcher the driver's anchor loop calls as `BestMove`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveType {
    /// Best-k-Opt for `k` in `2..=5`.
    KOpt(u8),
}

impl Default for MoveType {
    fn default() -> Self {
        MoveType::KOpt(5)
    }
}

/// Which move searcher is used when backtracking into a deeper chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BacktrackMoveType {
    KOpt(u8),
}

impl Default for BacktrackMoveType {
    fn default() -> Self {
        BacktrackMoveType::KOpt(4)
    }
}

/// How the sampled searchers draw the next candidate index out of the
/// remaining pool (`SamplingBiasUsed`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplingBias {
    /// `i = 0, 1, .., lambda-1`: no randomness, candidate-list order.
    Deterministic,
    /// `Random() % remaining`.
    Uniform,
    /// Geometric bias toward the front of the remaining pool.
    Geometric,
}

impl Default for SamplingBias {
    fn default() -> Self {
        SamplingBias::Deterministic
    }
}

/// The full set of run parameters the engine reads.
#[derive(Debug, Clone, Getters, CopyGetters)]
pub struct Params {
    #[getset(get_copy = "pub")]
    runs: u32,
    #[getset(get_copy = "pub")]
    max_trials: u32,
    #[getset(get_copy = "pub")]
    max_candidates: usize,
    #[getset(get_copy = "pub")]
    max_swaps: usize,
    #[getset(get_copy = "pub")]
    max_depth: usize,
    #[getset(get_copy = "pub")]
    lambda: usize,
    #[getset(get_copy = "pub")]
    move_type: MoveType,
    #[getset(get_copy = "pub")]
    backtrack_move_type: BacktrackMoveType,
    #[getset(get_copy = "pub")]
    gain_criterion_used: bool,
    #[getset(get_copy = "pub")]
    restricted_search: bool,
    #[getset(get_copy = "pub")]
    gain23_used: bool,
    #[getset(get_copy = "pub")]
    sampling_bias_used: SamplingBias,
    /// The `SW` flag: use the sampled breadth-first tree searcher and the
    /// `LinKernighanSW` driver instead of the classical `BestkOptMove` loop.
    #[getset(get_copy = "pub")]
    sw: bool,
    #[getset(get_copy = "pub")]
    precision: f64,
    #[getset(get_copy = "pub")]
    trial_time_budget: f64,
    #[getset(get_copy = "pub")]
    sw_neighborhood_limit_time_exceed: f64,
    #[getset(get_copy = "pub")]
    seed: u64,
    #[getset(get_copy = "pub")]
    optimum: Option<f64>,
    #[getset(get_copy = "pub")]
    trace_level: u8,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            runs: 1,
            max_trials: 10_000,
            max_candidates: 5,
            max_swaps: 1_000_000,
            max_depth: 5,
            lambda: 3,
            move_type: MoveType::default(),
            backtrack_move_type: BacktrackMoveType::default(),
            gain_criterion_used: true,
            restricted_search: true,
            gain23_used: true,
            sampling_bias_used: SamplingBias::default(),
            sw: false,
            precision: 1e-6,
            trial_time_budget: 10.0,
            sw_neighborhood_limit_time_exceed: 10.0,
            seed: 1,
            optimum: None,
            trace_level: 0,
        }
    }
}

impl Params {
    pub fn builder() -> ParamsBuilder {
        ParamsBuilder::default()
    }

    /// Advances `Seed` the way the reference driver does between runs
    /// (`srand(++Seed)`): the RNG stream for run `k+1` is seeded from `seed + k + 1`.
    pub fn seed_for_run(&self, run_index: u32) -> u64 {
        self.seed + run_index as u64 + 1
    }
}

/// Builder for [`Params`], since most fields have sane defaults and callers
/// typically only override a handful.
#[derive(Debug, Clone, Default)]
pub struct ParamsBuilder {
    params: OptionParams,
}

#[derive(Debug, Clone, Default)]
struct OptionParams {
    runs: Option<u32>,
    max_trials: Option<u32>,
    max_candidates: Option<usize>,
    max_swaps: Option<usize>,
    max_depth: Option<usize>,
    lambda: Option<usize>,
    move_type: Option<MoveType>,
    backtrack_move_type: Option<BacktrackMoveType>,
    gain_criterion_used: Option<bool>,
    restricted_search: Option<bool>,
    gain23_used: Option<bool>,
    sampling_bias_used: Option<SamplingBias>,
    sw: Option<bool>,
    precision: Option<f64>,
    trial_time_budget: Option<f64>,
    sw_neighborhood_limit_time_exceed: Option<f64>,
    seed: Option<u64>,
    optimum: Option<f64>,
    trace_level: Option<u8>,
}

macro_rules! builder_setter {
    ($name:ident, $ty:ty) => {
        pub fn $name(mut self, v: $ty) -> Self {
            self.params.$name = Some(v);
            self
        }
    };
}

impl ParamsBuilder {
    builder_setter!(runs, u32);
    builder_setter!(max_trials, u32);
    builder_setter!(max_candidates, usize);
    builder_setter!(max_swaps, usize);
    builder_setter!(max_depth, usize);
    builder_setter!(lambda, usize);
    builder_setter!(move_type, MoveType);
    builder_setter!(backtrack_move_type, BacktrackMoveType);
    builder_setter!(gain_criterion_used, bool);
    builder_setter!(restricted_search, bool);
    builder_setter!(gain23_used, bool);
    builder_setter!(sampling_bias_used, SamplingBias);
    builder_setter!(sw, bool);
    builder_setter!(precision, f64);
    builder_setter!(trial_time_budget, f64);
    builder_setter!(sw_neighborhood_limit_time_exceed, f64);
    builder_setter!(seed, u64);
    builder_setter!(trace_level, u8);

    pub fn optimum(mut self, v: f64) -> Self {
        self.params.optimum = Some(v);
        self
    }

    pub fn build(self) -> Params {
        let d = Params::default();
        let o = self.params;
        Params {
            runs: o.runs.unwrap_or(d.runs),
            max_trials: o.max_trials.unwrap_or(d.max_trials),
            max_candidates: o.max_candidates.unwrap_or(d.max_candidates),
            max_swaps: o.max_swaps.unwrap_or(d.max_swaps),
            max_depth: o.max_depth.unwrap_or(d.max_depth),
            lambda: o.lambda.unwrap_or(d.lambda),
            move_type: o.move_type.unwrap_or(d.move_type),
            backtrack_move_type: o.backtrack_move_type.unwrap_or(d.backtrack_move_type),
            gain_criterion_used: o.gain_criterion_used.unwrap_or(d.gain_criterion_used),
            restricted_search: o.restricted_search.unwrap_or(d.restricted_search),
            gain23_used: o.gain23_used.unwrap_or(d.gain23_used),
            sampling_bias_used: o.sampling_bias_used.unwrap_or(d.sampling_bias_used),
            sw: o.sw.unwrap_or(d.sw),
            precision: o.precision.unwrap_or(d.precision),
            trial_time_budget: o.trial_time_budget.unwrap_or(d.trial_time_budget),
            sw_neighborhood_limit_time_exceed: o
                .sw_neighborhood_limit_time_exceed
                .unwrap_or(d.sw_neighborhood_limit_time_exceed),
            seed: o.seed.unwrap_or(d.seed),
            optimum: o.optimum.or(d.optimum),
            trace_level: o.trace_level.unwrap_or(d.trace_level),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_params_are_sane() {
        let p = Params::default();
        assert_eq!(p.runs(), 1);
        assert!(p.gain_criterion_used());
    }

    #[test]
    fn test_builder_overrides_only_given_fields() {
        let p = Params::builder().runs(5).seed(42).build();
        assert_eq!(p.runs(), 5);
        assert_eq!(p.seed(), 42);
        assert_eq!(p.max_candidates(), Params::default().max_candidates());
    }

    #[test]
    fn test_seed_advances_between_runs() {
        let p = Params::builder().seed(1).build();
        assert_eq!(p.seed_for_run(0), 2);
        assert_eq!(p.seed_for_run(1), 3);
    }
}
