//! Model definitions
//!
//! Concrete regressors behind the `Regressor` contract.

use serde::{Deserialize, Serialize};

use super::FeatureVector;
use crate::error::{ForecastError, ForecastResult};

/// A pretrained scalar regressor
pub trait Regressor: Send + Sync {
    /// Predict a value from one feature row
    fn predict(&self, features: &FeatureVector) -> ForecastResult<f64>;

    /// Number of inputs the artifact was trained with
    fn input_width(&self) -> usize;

    fn predict_batch(&self, rows: &[FeatureVector]) -> ForecastResult<Vec<f64>> {
        rows.iter().map(|row| self.predict(row)).collect()
    }
}

fn check_width(expected: usize, features: &FeatureVector) -> ForecastResult<()> {
    if features.len() != expected {
        return Err(ForecastError::Model(format!(
            "feature count mismatch: expected {}, got {}",
            expected,
            features.len()
        )));
    }
    Ok(())
}

/// Linear model: `intercept + Σ coefficient_i * x_i`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearRegressionModel {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl LinearRegressionModel {
    pub fn new(coefficients: Vec<f64>, intercept: f64) -> Self {
        Self {
            coefficients,
            intercept,
        }
    }
}

impl Regressor for LinearRegressionModel {
    fn predict(&self, features: &FeatureVector) -> ForecastResult<f64> {
        check_width(self.coefficients.len(), features)?;

        Ok(features
            .values
            .iter()
            .zip(self.coefficients.iter())
            .map(|(f, c)| f * c)
            .sum::<f64>()
            + self.intercept)
    }

    fn input_width(&self) -> usize {
        self.coefficients.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    Linear,
    Relu,
    Sigmoid,
    Tanh,
}

impl Activation {
    fn apply(self, x: f64) -> f64 {
        match self {
            Activation::Linear => x,
            Activation::Relu => x.max(0.0),
            Activation::Sigmoid => 1.0 / (1.0 + (-x).exp()),
            Activation::Tanh => x.tanh(),
        }
    }
}

/// Fully connected layer. `weights` is laid out `[input][output]`, matching a
/// Keras `Dense` kernel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DenseLayer {
    pub weights: Vec<Vec<f64>>,
    pub bias: Vec<f64>,
    #[serde(default = "default_activation")]
    pub activation: Activation,
}

fn default_activation() -> Activation {
    Activation::Linear
}

impl DenseLayer {
    fn inputs(&self) -> usize {
        self.weights.len()
    }

    fn outputs(&self) -> usize {
        self.bias.len()
    }

    fn forward(&self, input: &[f64]) -> Vec<f64> {
        let mut out = self.bias.clone();
        for (x, row) in input.iter().zip(self.weights.iter()) {
            for (o, w) in out.iter_mut().zip(row.iter()) {
                *o += x * w;
            }
        }
        out.into_iter().map(|v| self.activation.apply(v)).collect()
    }
}

/// Feed-forward network with a single output unit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DenseNetwork {
    pub layers: Vec<DenseLayer>,
}

impl DenseNetwork {
    pub fn from_json_str(raw: &str) -> ForecastResult<Self> {
        let network: DenseNetwork = serde_json::from_str(raw)?;
        network.validate()?;
        Ok(network)
    }

    /// Check layer shapes chain together and end in one output
    pub fn validate(&self) -> ForecastResult<()> {
        let first = self
            .layers
            .first()
            .ok_or_else(|| ForecastError::Model("dense network has no layers".to_string()))?;
        if first.inputs() == 0 {
            return Err(ForecastError::Model("dense network has no inputs".to_string()));
        }

        let mut expected_inputs = first.inputs();
        for (i, layer) in self.layers.iter().enumerate() {
            if layer.inputs() != expected_inputs {
                return Err(ForecastError::Model(format!(
                    "layer {i} expects {} inputs, previous layer produces {expected_inputs}",
                    layer.inputs()
                )));
            }
            if let Some(row) = layer.weights.iter().find(|row| row.len() != layer.outputs()) {
                return Err(ForecastError::Model(format!(
                    "layer {i} kernel row has {} columns, bias has {}",
                    row.len(),
                    layer.outputs()
                )));
            }
            expected_inputs = layer.outputs();
        }

        if expected_inputs != 1 {
            return Err(ForecastError::Model(format!(
                "dense network must end in one output, found {expected_inputs}"
            )));
        }
        Ok(())
    }
}

impl Regressor for DenseNetwork {
    fn predict(&self, features: &FeatureVector) -> ForecastResult<f64> {
        check_width(self.input_width(), features)?;

        let output = self
            .layers
            .iter()
            .fold(features.values.clone(), |acc, layer| layer.forward(&acc));
        output
            .first()
            .copied()
            .ok_or_else(|| ForecastError::Model("dense network produced no output".to_string()))
    }

    fn input_width(&self) -> usize {
        self.layers.first().map(DenseLayer::inputs).unwrap_or(0)
    }
}
