pub mod batch;
pub mod dbkit;
pub mod model;
