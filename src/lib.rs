pub mod catalog;
pub mod cli;
pub mod core;
pub mod engine;
pub mod image_loader;
pub mod logging;
pub mod services;
pub mod storage;
pub mod transform;

pub use crate::core::{
    BatchError, BatchResult, Generation, ImageTransform, ItemRecord, ItemStatus,
    PresentationSink, ProgressUpdate, RunSummary, StatusCounts, Strategy, TransformError,
};
pub use engine::{CancellationToken, EventDispatcher, ItemStore, RunController, UiEvent};
pub use services::{BatchConfig, ConsolePresenter, PanelState};
pub use transform::{FilterKind, RandomFilterTransform};
