pub mod config;
pub mod data;
pub mod logging;
pub mod model;
pub mod seed;
pub mod select;

pub use data::{DataError, DataProvider, InMemoryDataProvider, Interaction, Problem, Trajectory};
pub use model::{BayesianKnowledgeTracing, KnowledgeModel, ModelError, Parameters};
pub use select::{
    AdaptiveSelector, NextProblem, ParameterAccessMode, SelectError, SelectionPolicy, SkillMastery,
};
