// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod backend;
pub mod controller;
pub mod ids;
pub mod model;
pub mod presentation;
pub mod state;

pub use backend::*;
pub use controller::*;
pub use ids::*;
pub use model::*;
pub use presentation::*;
pub use state::*;
