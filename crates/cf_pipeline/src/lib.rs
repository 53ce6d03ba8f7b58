pub mod checkpoint;
pub mod gate;
pub mod orchestrator;

pub use checkpoint::{CheckpointStore, Run};
pub use gate::{AcceptAll, ConsoleGate, GateEvent, GateLog, ScriptedGate, END_MARKER};
pub use orchestrator::{Pipeline, RunReport};

pub mod prelude {
    pub use super::checkpoint::{CheckpointStore, Run};
    pub use super::gate::{AcceptAll, ConsoleGate, GateEvent, ScriptedGate};
    pub use super::orchestrator::{Pipeline, RunReport};
    pub use cf_core::{HumanGate, PipelineConfig, Result, Error, Role, Stage};
}
