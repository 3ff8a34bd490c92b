pub mod mining;
pub mod spawning;
