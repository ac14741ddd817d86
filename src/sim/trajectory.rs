use nalgebra::{Matrix2xX, Matrix6xX};

use crate::dynamics::state::{Input, State};

// ---------------------------------------------------------------------------
// Trajectory: sampled states and held inputs
// ---------------------------------------------------------------------------

// Longer runs grow past this on push.
const RESERVE_LIMIT: usize = 1 << 16;

/// Record of one closed-loop run.
///
/// Holds `N + 1` states (initial condition through the state at
/// `N * sampling_time`) and `N` inputs, input `i` having been held over
/// `[t_i, t_i+1)`. Only the simulation driver appends to it.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    sampling_time: f64,
    times: Vec<f64>,
    states: Vec<State>,
    inputs: Vec<Input>,
}

/// Column-aligned arrays for plotting: `times[i]`, `states.column(i)` and
/// `inputs.column(i)` all refer to sample `i`.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotSeries {
    pub times: Vec<f64>,
    pub states: Matrix6xX<f64>,
    pub inputs: Matrix2xX<f64>,
}

impl Trajectory {
    pub(crate) fn new(initial: State, sampling_time: f64, steps: usize) -> Self {
        let reserve = steps.min(RESERVE_LIMIT);
        let mut times = Vec::with_capacity(reserve + 1);
        let mut states = Vec::with_capacity(reserve + 1);
        times.push(0.0);
        states.push(initial);
        Self {
            sampling_time,
            times,
            states,
            inputs: Vec::with_capacity(reserve),
        }
    }

    /// Record the input held over the last interval and the state it produced.
    pub(crate) fn push(&mut self, input: Input, next: State) {
        self.inputs.push(input);
        self.states.push(next);
        self.times.push(self.inputs.len() as f64 * self.sampling_time);
    }

    pub fn sampling_time(&self) -> f64 {
        self.sampling_time
    }

    /// Number of control steps taken (`N`).
    pub fn steps(&self) -> usize {
        self.inputs.len()
    }

    /// `N + 1` stamps, one per state.
    pub fn time_stamps(&self) -> &[f64] {
        &self.times
    }

    /// `N + 1` states, including the initial condition.
    pub fn states(&self) -> &[State] {
        &self.states
    }

    /// `N` inputs.
    pub fn inputs(&self) -> &[Input] {
        &self.inputs
    }

    pub fn initial_state(&self) -> &State {
        &self.states[0]
    }

    pub fn final_state(&self) -> &State {
        &self.states[self.states.len() - 1]
    }

    pub fn final_time(&self) -> f64 {
        self.times[self.times.len() - 1]
    }

    /// `(t_i, state_i, input_i)` for `i` in `0..N`.
    pub fn samples(&self) -> impl Iterator<Item = (f64, &State, &Input)> + '_ {
        self.times
            .iter()
            .zip(&self.states)
            .zip(&self.inputs)
            .map(|((&t, s), u)| (t, s, u))
    }

    /// Plot hand-off: states for `t[0..N-1]` paired 1:1 with `input[0..N-1]`.
    ///
    /// The terminal state has no input and is left out; read it from
    /// [`Trajectory::final_state`].
    pub fn plot_series(&self) -> PlotSeries {
        let n = self.steps();
        if n == 0 {
            return PlotSeries {
                times: Vec::new(),
                states: Matrix6xX::zeros(0),
                inputs: Matrix2xX::zeros(0),
            };
        }
        PlotSeries {
            times: self.times[..n].to_vec(),
            states: Matrix6xX::from_columns(&self.states[..n]),
            inputs: Matrix2xX::from_columns(&self.inputs),
        }
    }
}
