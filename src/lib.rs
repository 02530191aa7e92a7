//! Skirmish AI - autonomous squad tactics for a grid combat sim

pub mod battle;
pub mod core;
