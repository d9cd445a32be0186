use wg_core::DeviceId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveStage {
    CheckingCache,
    LoadingCached,
    DroppingStale,
    Simulating,
    Loading,
    AttachingTimeline,
    Completed,
}

impl ResolveStage {
    pub fn label(self) -> &'static str {
        match self {
            ResolveStage::CheckingCache => "checking cache",
            ResolveStage::LoadingCached => "loading cached output",
            ResolveStage::DroppingStale => "dropping stale table",
            ResolveStage::Simulating => "simulating",
            ResolveStage::Loading => "loading output",
            ResolveStage::AttachingTimeline => "attaching timeline",
            ResolveStage::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResolveProgressEvent {
    pub device_id: DeviceId,
    pub stage: ResolveStage,
    pub elapsed_wall_s: f64,
    pub message: Option<String>,
}
