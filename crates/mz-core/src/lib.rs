//! mz-core: the core simulation engine for the grid-maze chase game.
//!
//! Pure game logic, no windowing, blitting, font, audio, keyboard, or
//! file-parsing dependencies: every module here is driven by an external
//! caller that owns those concerns and feeds this crate config values,
//! key presses, and tick durations, reading back domain events in return.

pub mod ai;
pub mod animation;
pub mod cell;
pub mod character;
pub mod config;
pub mod consts;
pub mod containers;
pub mod error;
pub mod event;
pub mod game;
pub mod geometry;
pub mod level;
pub mod map;
pub mod maze;
pub mod pathfind;
pub mod powerup;
pub mod rng;
pub mod tile;

pub use rng::GameRng;
