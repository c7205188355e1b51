// engine module — backend synchronization engine

mod backend;
mod interface;
mod refresh;
pub mod stub;

pub use backend::{BackendEngine, execute_mutation};
pub use interface::{Engine, EngineHandle, Event, RefreshScope, Request, RunPrediction};
pub use refresh::RefreshScheduler;
pub use stub::StubEngine;
