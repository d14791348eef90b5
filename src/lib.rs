pub mod clock;
pub mod command;
pub mod config;
pub mod constants;
pub mod constellations;
pub mod conversion;
mod earth_orientation;
pub mod ephemeris;
pub mod interaction;
pub mod logging;
pub mod observers;
pub mod pick;
pub mod projection;
pub mod quality;
pub mod ref_system;
pub mod render;
pub mod resolver;
pub mod skychart;
pub mod skychart_errors;
pub mod time;
pub mod tracker;
pub mod viewport;
