pub mod config;
pub mod constants;
pub mod detection;
pub mod error;
pub mod frames;
pub mod pipeline;
pub mod recipes;
pub mod routes;
pub mod services;
pub mod storage;

use pipeline::Pipeline;

pub struct AppState {
    pub pipeline: Pipeline,
}
