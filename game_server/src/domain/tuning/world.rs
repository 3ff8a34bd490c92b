/// Session world tuning. Bounds and radii match the client world.
#[derive(Debug, Clone, Copy)]
pub struct WorldTuning {
    pub min_coord: f32,
    pub max_coord: f32,
    /// Client-side mining radius.
    pub mining_radius: f32,
    /// Extra distance accepted on top of the mining radius to absorb position lag.
    pub proximity_slack: f32,
    pub pool: NodePoolTuning,
}

impl Default for WorldTuning {
    fn default() -> Self {
        Self {
            min_coord: 50.0,
            max_coord: 1950.0,
            mining_radius: 60.0,
            proximity_slack: 60.0,
            pool: NodePoolTuning::default(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct NodePoolTuning {
    pub size: usize,
    pub min_amount: u32,
    pub max_amount: u32,
    pub min_radius: f32,
    pub max_radius: f32,
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
