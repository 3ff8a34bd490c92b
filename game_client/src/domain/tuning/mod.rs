// Gameplay tuning tables. Runtime settings live in `frameworks::config`.

pub mod tiers;
pub mod world;
