//! Decision-forest backend.
//!
//! Trees use the flattened node-array layout produced by common tree learners:
//! node `i` tests `row[feature[i]] <= threshold[i]` and continues at
//! `children_left[i]` or `children_right[i]`. A node whose left child is `-1`
//! is a leaf and `value[i]` holds its per-class sample counts.

use serde::{Deserialize, Serialize};

use crate::engine::{Classification, Classifier};

const LEAF: i64 = -1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    /// Class counts (or weights) per node: `[negative, positive]`.
    pub value: Vec<[f64; 2]>,
}

impl DecisionTree {
    fn node_count(&self) -> usize {
        self.children_left.len()
    }

    fn validate(&self, n_features: usize) -> Result<(), String> {
        let n = self.node_count();
        if n == 0 {
            return Err("tree has no nodes".into());
        }
        if self.children_right.len() != n
            || self.feature.len() != n
            || self.threshold.len() != n
            || self.value.len() != n
        {
            return Err("tree node arrays differ in length".into());
        }
        for i in 0..n {
            if self.children_left[i] == LEAF {
                let [neg, pos] = self.value[i];
                if !(neg >= 0.0 && pos >= 0.0 && neg + pos > 0.0) {
                    return Err(format!("leaf {i} has no usable class counts"));
                }
                continue;
            }
            for child in [self.children_left[i], self.children_right[i]] {
                // Children always follow their parent, which also rules out cycles.
                if child <= i as i64 || child as usize >= n {
                    return Err(format!("node {i} has invalid child {child}"));
                }
            }
            let f = self.feature[i];
            if f < 0 || f as usize >= n_features {
                return Err(format!("node {i} splits on feature {f} of {n_features}"));
            }
        }
        Ok(())
    }

    /// Class distribution of the leaf `row` lands in.
    ///
    /// Walks at most `node_count` nodes so a malformed tree errors instead of
    /// indexing out of bounds or cycling.
    fn leaf_distribution(&self, row: &[f64]) -> anyhow::Result<[f64; 2]> {
        let n = self.node_count();
        let mut node = 0usize;
        for _ in 0..n {
            let left = *self
                .children_left
                .get(node)
                .ok_or_else(|| anyhow::anyhow!("node {node} out of range ({n} nodes)"))?;
            if left == LEAF {
                let [neg, pos] = *self
                    .value
                    .get(node)
                    .ok_or_else(|| anyhow::anyhow!("leaf {node} has no class counts"))?;
                let total = neg + pos;
                anyhow::ensure!(total > 0.0, "leaf {node} has no usable class counts");
                return Ok([neg / total, pos / total]);
            }

            let (Some(&f), Some(&threshold), Some(&right)) = (
                self.feature.get(node),
                self.threshold.get(node),
                self.children_right.get(node),
            ) else {
                anyhow::bail!("node {node} is missing split data");
            };
            let x = usize::try_from(f)
                .ok()
                .and_then(|f| row.get(f))
                .ok_or_else(|| anyhow::anyhow!("node {node} splits on missing feature {f}"))?;
            let next = if *x <= threshold { left } else { right };
            node = usize::try_from(next)
                .map_err(|_| anyhow::anyhow!("node {node} has invalid child {next}"))?;
        }
        anyhow::bail!("no leaf reached after {n} nodes")
    }
}

/// Averaging ensemble of decision trees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    pub n_features: usize,
    pub trees: Vec<DecisionTree>,
}

impl RandomForest {
    pub fn validate(&self, n_features: usize) -> Result<(), String> {
        if self.n_features != n_features {
            return Err(format!(
                "forest was trained on {} features, bundle declares {n_features}",
                self.n_features
            ));
        }
        if self.trees.is_empty() {
            return Err("forest has no trees".into());
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(n_features)
                .map_err(|e| format!("tree {i}: {e}"))?;
        }
        Ok(())
    }
}

impl Classifier for RandomForest {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn check(&self) -> Result<(), String> {
        self.validate(self.n_features)
    }

    fn classify(&self, row: &[f64]) -> anyhow::Result<Classification> {
        anyhow::ensure!(
            row.len() == self.n_features,
            "X has {} features, but the forest expects {}",
            row.len(),
            self.n_features
        );
        anyhow::ensure!(
            row.iter().all(|x| x.is_finite()),
            "input contains NaN or infinity"
        );
        anyhow::ensure!(!self.trees.is_empty(), "forest has no trees");

        let mut proba = [0.0f64; 2];
        for tree in &self.trees {
            let [neg, pos] = tree.leaf_distribution(row)?;
            proba[0] += neg;
            proba[1] += pos;
        }
        let n = self.trees.len() as f64;
        proba[0] /= n;
        proba[1] /= n;

        // argmax; ties go to the first class.
        let label = u8::from(proba[1] > proba[0]);
        Ok(Classification {
            label,
            positive_probability: proba[1],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Single split on feature `f` at `t`: left leaf mostly negative, right
    /// leaf mostly positive.
    fn stump(f: i64, t: f64, left: [f64; 2], right: [f64; 2]) -> DecisionTree {
        DecisionTree {
            children_left: vec![1, LEAF, LEAF],
            children_right: vec![2, LEAF, LEAF],
            feature: vec![f, -2, -2],
            threshold: vec![t, -2.0, -2.0],
            value: vec![[0.0, 0.0], left, right],
        }
    }

    #[test]
    fn single_tree_routes_on_threshold() {
        let forest = RandomForest {
            n_features: 2,
            trees: vec![stump(1, 24.0, [9.0, 1.0], [2.0, 8.0])],
        };
        // Equal to threshold goes left.
        let left = forest.classify(&[0.0, 24.0]).unwrap();
        assert!((left.positive_probability - 0.1).abs() < 1e-12);
        assert_eq!(left.label, 0);

        let right = forest.classify(&[0.0, 25.0]).unwrap();
        assert!((right.positive_probability - 0.8).abs() < 1e-12);
        assert_eq!(right.label, 1);
    }

    #[test]
    fn forest_averages_tree_probabilities() {
        let forest = RandomForest {
            n_features: 2,
            trees: vec![
                stump(0, 5.0, [1.0, 0.0], [0.0, 1.0]),
                stump(1, 5.0, [3.0, 1.0], [1.0, 3.0]),
            ],
        };
        // Tree 1 → right (p=1.0), tree 2 → left (p=0.25).
        let out = forest.classify(&[6.0, 4.0]).unwrap();
        assert!((out.positive_probability - 0.625).abs() < 1e-12);
        assert_eq!(out.label, 1);
    }

    #[test]
    fn tie_goes_to_negative_class() {
        let forest = RandomForest {
            n_features: 1,
            trees: vec![stump(0, 0.0, [1.0, 1.0], [1.0, 1.0])],
        };
        let out = forest.classify(&[1.0]).unwrap();
        assert_eq!(out.positive_probability, 0.5);
        assert_eq!(out.label, 0);
    }

    #[test]
    fn rejects_nan_and_wrong_width() {
        let forest = RandomForest {
            n_features: 2,
            trees: vec![stump(0, 0.0, [1.0, 0.0], [0.0, 1.0])],
        };
        assert!(forest.classify(&[f64::NAN, 0.0]).is_err());
        assert!(forest.classify(&[0.0]).is_err());
    }

    #[test]
    fn validate_rejects_bad_structure() {
        let mut tree = stump(0, 0.0, [1.0, 0.0], [0.0, 1.0]);
        assert!(tree.validate(1).is_ok());
        assert!(tree.validate(0).is_err(), "feature index out of range");

        tree.children_left[0] = 0;
        assert!(tree.validate(1).is_err(), "self-loop");

        let empty_leaf = stump(0, 0.0, [0.0, 0.0], [0.0, 1.0]);
        assert!(empty_leaf.validate(1).is_err());

        let forest = RandomForest {
            n_features: 3,
            trees: vec![],
        };
        assert!(forest.validate(3).is_err());
        assert!(forest.validate(2).is_err());
    }

    #[test]
    fn malformed_tree_errors_instead_of_panicking() {
        let forest = RandomForest {
            n_features: 1,
            trees: vec![DecisionTree {
                children_left: vec![5],
                children_right: vec![5],
                feature: vec![0],
                threshold: vec![0.0],
                value: vec![[1.0, 1.0]],
            }],
        };
        assert!(forest.check().is_err());
        assert!(forest.classify(&[1.0]).is_err());

        let mut looping = stump(0, 0.0, [1.0, 0.0], [0.0, 1.0]);
        looping.children_left[0] = 0;
        looping.children_right[0] = 0;
        let forest = RandomForest {
            n_features: 1,
            trees: vec![looping],
        };
        let err = forest.classify(&[1.0]).unwrap_err();
        assert!(err.to_string().contains("no leaf reached"));
    }
}
