#[macro_use]
extern crate log;
#[macro_use]
extern crate derive_builder;
#[macro_use]
extern crate lazy_static;

pub mod browser_controller;
pub mod config;
pub mod content;
pub mod fetcher;
pub mod normalizer;
pub mod renderer;
pub mod runner;
pub mod salsa;
pub mod types;
pub mod utils;
