/// Gameplay tuning for the play area, movement feel and the node pool.
///
/// Keep this separate from runtime configuration (frame rate, channel sizes, endpoints).

#[derive(Debug, Clone, Copy)]
pub struct WorldTuning {
    /// Lowest coordinate on both axes.
    pub min_coord: f32,

    /// Highest coordinate on both axes.
    pub max_coord: f32,

    /// Radians turned per frame while a turn key is held.
    pub rotation_step: f32,

    /// Multiplier applied to the stat speed before frame scaling.
    pub speed_scale: f32,

    /// Frame length the speed stat was balanced against, in milliseconds.
    pub reference_frame_ms: f32,

    /// Maximum distance from the submarine to a node it can mine.
    pub mining_radius: f32,

    /// Energy spent per mining action.
    pub mining_energy_cost: f64,

    /// Length of each transient game phase and signal, in milliseconds.
    pub phase_duration_ms: f64,

    /// Lifetime of the storage and energy alerts, in milliseconds.
    pub alert_duration_ms: f64,

    /// Storage percentage at which the storage alert fires.
    pub storage_alert_percent: u8,

    pub node_pool: NodePoolTuning,
}

#[derive(Debug, Clone, Copy)]
pub struct NodePoolTuning {
    /// Nodes created per session.
    pub size: usize,
    pub min_amount: u32,
    pub max_amount: u32,
    pub min_radius: f32,
    pub max_radius: f32,
}

impl Default for WorldTuning {
    fn default() -> Self {
        Self {
            min_coord: 50.0,
            max_coord: 1950.0,
            rotation_step: 0.05,
            speed_scale: 0.2,
            reference_frame_ms: 16.0,
            mining_radius: 60.0,
            mining_energy_cost: 5.0,
            phase_duration_ms: 2000.0,
            alert_duration_ms: 3000.0,
            storage_alert_percent: 90,
            node_pool: NodePoolTuning::default(),
        }
    }
}

impl Default for NodePoolTuning {
    fn default() -> Self {
        Self {
            size: 30,
            min_amount: 20,
            max_amount: 100,
            min_radius: 15.0,
            max_radius: 35.0,
        }
    }
}
