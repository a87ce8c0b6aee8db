//! Per-step counters and timings.

/// Timing and activity collected during a single
/// [`Simulation::step`](crate::Simulation::step).
///
/// All durations are in microseconds.
#[derive(Clone, Debug, Default)]
pub struct StepMetrics {
    /// Wall-clock time for the whole step.
    pub total_us: u64,
    /// Time spent draining and applying queued commands.
    pub command_us: u64,
    /// Time spent ticking agents on the worker pool.
    pub agent_tick_us: u64,
    /// Agents ticked this step.
    pub agents_ticked: u32,
    /// FSM transitions taken this step, including alarm reroutes.
    pub transitions: u64,
    /// Commands applied this step.
    pub commands_applied: u32,
    /// Commands rejected this step.
    pub commands_rejected: u32,
    /// Mine partitions regenerated this step.
    pub partition_regenerations: u32,
    /// Step buffers and search scratch served from a pool this step.
    pub pool_reuse_hits: u64,
}
