// Library exports for coco-itest
pub mod cli;
pub mod config;
pub mod discover;
pub mod environment;
pub mod error;
pub mod lifecycle;
pub mod process;
pub mod report;
pub mod runner;
