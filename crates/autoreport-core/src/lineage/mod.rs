//! Static lineage: which model produced a variable or a plot.

pub mod builder;
pub mod classify;
pub mod graph;
pub mod plots;
pub mod resolver;
pub mod walk;

pub use builder::GraphBuilder;
pub use classify::{ClassifyOptions, OwnerMapping, classify, model_names, predictor_classes};
pub use graph::{DependencyGraph, VarNode};
pub use plots::{PlotCall, PlotCallCollector, PlotMapping, PlotRecognizer, map_plots_to_origins};
pub use resolver::{ModelOperations, OriginResolver};
