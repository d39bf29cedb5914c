pub mod cli;
pub mod config;
pub mod crafting;
pub mod inventory;
pub mod items;
pub mod persistence;
pub mod player;
pub mod simulation;
pub mod world;
