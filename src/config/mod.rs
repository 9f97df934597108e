pub mod ai;
pub mod curator;

pub use ai::AiConfig;
pub use curator::{
    CuratorConfig, IntakeConfig, RelevanceConfig, ScheduleConfig, SelectionConfig, SourceConfig,
    SourceKind, StorageConfig, SummaryConfig,
};
