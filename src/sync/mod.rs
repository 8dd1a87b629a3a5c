pub(crate) mod orchestrator;
pub(crate) mod reconciler;
pub(crate) mod simulator;
pub(crate) mod tracker;

pub(crate) use orchestrator::SyncOrchestrator;
