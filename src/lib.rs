//! # adas
//!
//! `adas` is a Rust crate that provides the decision-and-control core of a driver assistance
//! stack. This crate includes modules for multi-object tracking over camera detections, behavior
//! planning for speed and steering, synthesis of actuator commands, and a safety layer that
//! bounds every command before release. These components are designed to sit between a perception
//! front end and a vehicle interface, and ship with synthetic perception sources for closed-loop
//! exercise without hardware.
//!
//! ## Modules
//!
//! `adas` is organized into several modules, each serving a specific purpose:
//!
//! - [MultiObjectTracker](tracking/struct.MultiObjectTracker.html): Maintains persistent tracks
//!   over per-frame detections, with pinhole distance and smoothed range-rate estimates.
//!
//! - [BehaviorPlanner](planning/struct.BehaviorPlanner.html): Decides a target speed and steering
//!   angle from tracks and an optional lane model.
//!
//! - [CommandSynthesizer](control/controller/struct.CommandSynthesizer.html): Converts a motion
//!   plan into throttle, brake, and steering channels.
//!
//! - [SafetyMonitor](control/safety/struct.SafetyMonitor.html): Enforces speed, acceleration, and
//!   steering-rate limits on every command and triggers emergency braking.
//!
//! - [Pipeline](runtime/pipeline/struct.Pipeline.html): Orchestrates one perception frame through
//!   tracking, planning, synthesis, and safety.
//!
//! - [PipelineRunner](runtime/runner/struct.PipelineRunner.html): Drives the pipeline closed-loop
//!   against detection and lane sources with a simulated ego speed.
//!
//! ## Usage
//!
//! To use the `adas` crate in your project, add the following line to your `Cargo.toml` file:
//!
//! ```toml
//! [dependencies]
//! adas = "0.1.0"
//! ```
//!
//! Then, you can import the necessary modules and use the provided functionalities in your code.
//!
//! ## Example
//!
//! ```rust
//! use adas::core::config::RuntimeConfig;
//! use adas::core::models::FrameInput;
//! use adas::runtime::pipeline::Pipeline;
//!
//! // Build a pipeline from the default configuration
//! let config = RuntimeConfig::default();
//! let mut pipeline = Pipeline::from_config(&config).unwrap();
//!
//! // Step one empty frame at standstill
//! let frame = FrameInput::empty(0, 0.0);
//! let output = pipeline.step(&frame, 0.0).unwrap();
//!
//! // The safety layer released a bounded pull-away command
//! assert!(output.command.throttle > 0.0);
//! assert_eq!(output.command.brake, 0.0);
//!
//! // Perform other operations as needed
//! // ...
//! ```
//!
//! ## License
//!
//! This project is licensed under the [MIT License](LICENSE).

pub mod common;
pub mod control;
pub mod core;
pub mod perception;
pub mod planning;
pub mod runtime;
pub mod tracking;
