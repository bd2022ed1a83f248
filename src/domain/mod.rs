pub mod battle;
pub mod entity;
pub mod map;
pub mod rng;
pub mod rules;
