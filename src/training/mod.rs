//! Model training and selection
//!
//! Fits a fixed set of candidate classifiers on a stratified split of the
//! processed dataset and keeps the one with the best held-out ROC AUC:
//! - Logistic regression (L2-regularised gradient descent)
//! - Random forest (bootstrapped variance-reduction trees)
//! - Gradient boosting (log-loss, shallow trees)

mod config;
mod engine;
mod models;
pub mod decision_tree;
pub mod gradient_boosting;
pub mod linear_models;
pub mod metrics;
pub mod random_forest;
pub mod split;

pub use config::{CandidateKind, TrainingConfig};
pub use decision_tree::{DecisionTree, TreeNode};
pub use engine::{SelectedModel, TrainEngine, TrainingOutcome};
pub use gradient_boosting::{GradientBoostingClassifier, GradientBoostingConfig};
pub use linear_models::{LogisticRegression, LogisticRegressionConfig};
pub use metrics::EvaluationResult;
pub use models::{CandidateModel, Classifier};
pub use random_forest::{MaxFeatures, RandomForest, RandomForestConfig};
pub use split::{StratifiedSplit, TrainTestSplit};
