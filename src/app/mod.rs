// Application layer - Use case interactors

pub mod analyze_interactor;
pub mod container;

// Re-export interactors
pub use analyze_interactor::{AnalysisOutcome, AnalyzeInteractor};
pub use container::{AppContainer, DefaultAppContainer};
