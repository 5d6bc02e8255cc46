//! Domain models - core alert types and geometry
//!
//! This module contains the canonical data types used throughout the system:
//! - `Alert` - a geotagged hazard notice with severity and affected radius
//! - `ObserverPosition` / `SymptomReport` - observer-side inputs
//! - `geo` - great-circle distance and radius containment
//! - `seed` - builtin starting alert set

pub mod geo;
pub mod seed;
pub mod types;
