pub mod tiers;
pub mod trade;
pub mod world;
