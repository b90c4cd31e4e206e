//! Packaging and container loading estimator.
//!
//! Estimates how many primary boxes fit on a pallet, what the loaded pallet
//! weighs and how pallets load into standard shipping containers. Supplier
//! submissions are snapshotted into an append-only store and served over a
//! small HTTP API.

pub mod api;
pub mod calculator;
pub mod config;
pub mod geometry;
pub mod model;
pub mod store;
pub mod sustainability;
pub mod types;
pub mod units;
