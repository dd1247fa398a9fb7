use std::cmp::Ordering;

use ndarray::{Array2, ArrayView1};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};

use super::{argmax_lowest, check_training_set, SymptomClassifier};
use crate::classifier::error::ClassifierError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForestConfig {
    pub n_trees: usize,
    /// Unlimited when `None`: trees grow until their leaves are pure
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    /// Candidate features per split; `None` means `sqrt(n_features)`
    pub max_features: Option<usize>,
    pub seed: u64,
}

impl Default for RandomForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: None,
            min_samples_split: 2,
            max_features: None,
            seed: 18,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
enum Node {
    Leaf {
        class: usize,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// A CART tree stored as a flat node list; the root is `nodes[0]` and children
/// always come after their parent.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct DecisionTree {
    nodes: Vec<Node>,
}

impl DecisionTree {
    fn predict(&self, features: ArrayView1<'_, f64>) -> usize {
        let mut id = 0;
        loop {
            match &self.nodes[id] {
                Node::Leaf { class } => return *class,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    id = if features[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    fn validate(&self, n_features: usize, n_classes: usize) -> Result<(), ClassifierError> {
        if self.nodes.is_empty() {
            return Err(ClassifierError::ModelError("Decision tree has no nodes".into()));
        }
        for (id, node) in self.nodes.iter().enumerate() {
            let valid = match node {
                Node::Leaf { class } => *class < n_classes,
                Node::Split {
                    feature,
                    left,
                    right,
                    ..
                } => {
                    *feature < n_features
                        && *left > id
                        && *right > id
                        && *left < self.nodes.len()
                        && *right < self.nodes.len()
                }
            };
            if !valid {
                return Err(ClassifierError::ModelError(format!(
                    "Decision tree node {} is malformed",
                    id
                )));
            }
        }
        Ok(())
    }
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    impurity: f64,
}

fn gini(counts: &[usize], total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    1.0 - counts
        .iter()
        .map(|&c| {
            let p = c as f64 / total;
            p * p
        })
        .sum::<f64>()
}

struct TreeBuilder<'a> {
    samples: &'a Array2<f64>,
    labels: &'a [usize],
    n_classes: usize,
    max_features: usize,
    config: &'a RandomForestConfig,
    rng: ChaCha20Rng,
    nodes: Vec<Node>,
}

impl<'a> TreeBuilder<'a> {
    fn class_counts(&self, indices: &[usize]) -> Vec<usize> {
        let mut counts = vec![0; self.n_classes];
        for &i in indices {
            counts[self.labels[i]] += 1;
        }
        counts
    }

    fn grow(&mut self, indices: Vec<usize>, depth: usize) -> usize {
        let counts = self.class_counts(&indices);
        let majority = argmax_lowest(counts.iter().map(|&c| c as f64));
        let id = self.nodes.len();
        self.nodes.push(Node::Leaf { class: majority });

        let pure = counts.iter().filter(|&&c| c > 0).count() <= 1;
        let too_deep = self.config.max_depth.map_or(false, |max| depth >= max);
        if pure || too_deep || indices.len() < self.config.min_samples_split {
            return id;
        }

        let Some(split) = self.best_split(&indices) else {
            return id;
        };

        let (left, right): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .copied()
            .partition(|&i| self.samples[[i, split.feature]] <= split.threshold);

        let left = self.grow(left, depth + 1);
        let right = self.grow(right, depth + 1);
        self.nodes[id] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        id
    }

    /// Visits features in random order until `max_features` non-constant ones
    /// have been scored, and keeps the split with the lowest weighted Gini impurity.
    fn best_split(&mut self, indices: &[usize]) -> Option<SplitCandidate> {
        let mut features: Vec<usize> = (0..self.samples.ncols()).collect();
        features.shuffle(&mut self.rng);

        let mut best: Option<SplitCandidate> = None;
        let mut scored = 0;
        for feature in features {
            if scored >= self.max_features {
                break;
            }
            let Some(candidate) = self.best_threshold(indices, feature) else {
                continue;
            };
            scored += 1;
            if best.as_ref().map_or(true, |b| candidate.impurity < b.impurity) {
                best = Some(candidate);
            }
        }
        best
    }

    /// Best threshold on one feature, or `None` if the feature is constant within the node.
    fn best_threshold(&self, indices: &[usize], feature: usize) -> Option<SplitCandidate> {
        let mut values: Vec<(f64, usize)> = indices
            .iter()
            .map(|&i| (self.samples[[i, feature]], self.labels[i]))
            .collect();
        values.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));

        let total = values.len();
        let mut right = self.class_counts(indices);
        let mut left = vec![0; self.n_classes];
        let mut best: Option<SplitCandidate> = None;

        for k in 0..total.saturating_sub(1) {
            let (value, label) = values[k];
            left[label] += 1;
            right[label] -= 1;

            let next = values[k + 1].0;
            if next <= value {
                continue;
            }
            let n_left = k + 1;
            let n_right = total - n_left;
            let impurity = (n_left as f64 * gini(&left, n_left)
                + n_right as f64 * gini(&right, n_right))
                / total as f64;
            if best.as_ref().map_or(true, |b| impurity < b.impurity) {
                best = Some(SplitCandidate {
                    feature,
                    threshold: (value + next) / 2.0,
                    impurity,
                });
            }
        }
        best
    }
}

/// Bagged ensemble of CART trees voting by simple majority.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    n_features: usize,
    n_classes: usize,
}

impl RandomForest {
    pub fn fit(
        samples: &Array2<f64>,
        labels: &[usize],
        n_classes: usize,
        config: &RandomForestConfig,
    ) -> Result<Self, ClassifierError> {
        check_training_set(samples, labels, n_classes)?;
        if config.n_trees == 0 {
            return Err(ClassifierError::ModelError(
                "Random forest needs at least one tree".into(),
            ));
        }

        let n_samples = samples.nrows();
        let n_features = samples.ncols();
        let max_features = config
            .max_features
            .unwrap_or_else(|| (n_features as f64).sqrt().round() as usize)
            .clamp(1, n_features);

        let trees = (0..config.n_trees)
            .map(|t| {
                let mut rng = ChaCha20Rng::seed_from_u64(config.seed.wrapping_add(t as u64));
                let bootstrap: Vec<usize> =
                    (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect();
                let mut builder = TreeBuilder {
                    samples,
                    labels,
                    n_classes,
                    max_features,
                    config,
                    rng,
                    nodes: Vec::new(),
                };
                builder.grow(bootstrap, 0);
                DecisionTree {
                    nodes: builder.nodes,
                }
            })
            .collect();

        Ok(Self {
            trees,
            n_features,
            n_classes,
        })
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Vote count per class for one sample.
    pub fn votes(&self, features: ArrayView1<'_, f64>) -> Vec<usize> {
        let mut votes = vec![0; self.n_classes];
        for tree in &self.trees {
            votes[tree.predict(features)] += 1;
        }
        votes
    }

    pub(crate) fn validate(&self) -> Result<(), ClassifierError> {
        if self.trees.is_empty() {
            return Err(ClassifierError::ModelError("Random forest has no trees".into()));
        }
        self.trees
            .iter()
            .try_for_each(|tree| tree.validate(self.n_features, self.n_classes))
    }
}

impl SymptomClassifier for RandomForest {
    fn name(&self) -> &str {
        "random_forest"
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn n_classes(&self) -> usize {
        self.n_classes
    }

    fn predict(&self, features: ArrayView1<'_, f64>) -> usize {
        argmax_lowest(self.votes(features).into_iter().map(|v| v as f64))
    }
}
