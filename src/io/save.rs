use crate::nn::{Dense, LayerSpec, Mlp};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Descriptive fields stored alongside the weights
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelMetadata {
    pub name: String,
    pub input_dim: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub feature_names: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedLayer {
    pub spec: LayerSpec,
    pub weights: Vec<f32>,
    pub bias: Vec<f32>,
}

/// Serialized form of a trained network
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedModel {
    pub metadata: ModelMetadata,
    pub layers: Vec<SavedLayer>,
}

impl SavedModel {
    pub fn from_mlp(model: &Mlp, metadata: ModelMetadata) -> Self {
        let layers = model
            .layers()
            .iter()
            .map(|layer| SavedLayer {
                spec: layer.spec(),
                weights: layer.weight().data().to_vec(),
                bias: layer.bias().data().to_vec(),
            })
            .collect();
        Self { metadata, layers }
    }

    pub fn into_mlp(self) -> Result<(ModelMetadata, Mlp)> {
        let mut layers = Vec::with_capacity(self.layers.len());
        for saved in self.layers {
            let expected_w = saved.spec.in_dim * saved.spec.out_dim;
            if saved.weights.len() != expected_w || saved.bias.len() != saved.spec.out_dim {
                return Err(Error::Serialization(format!(
                    "layer shape mismatch: spec {}x{}, got {} weights / {} biases",
                    saved.spec.out_dim,
                    saved.spec.in_dim,
                    saved.weights.len(),
                    saved.bias.len()
                )));
            }
            layers.push(Dense::from_weights(saved.spec, saved.weights, saved.bias));
        }
        if layers.is_empty() {
            return Err(Error::Serialization("model has no layers".into()));
        }
        Ok((self.metadata, Mlp::from_layers(layers)))
    }
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}

/// Write a model artifact; `.yaml`/`.yml` extensions select YAML,
/// anything else JSON.
pub fn save_model(path: &Path, model: &Mlp, metadata: ModelMetadata) -> Result<()> {
    let saved = SavedModel::from_mlp(model, metadata);
    let text = if is_yaml(path) {
        serde_yaml::to_string(&saved).map_err(|e| Error::Serialization(e.to_string()))?
    } else {
        serde_json::to_string_pretty(&saved).map_err(|e| Error::Serialization(e.to_string()))?
    };
    fs::write(path, text)?;
    Ok(())
}

/// Read a model artifact previously written by [`save_model`].
pub fn load_model(path: &Path) -> Result<(ModelMetadata, Mlp)> {
    let text = fs::read_to_string(path)?;
    let saved: SavedModel = if is_yaml(path) {
        serde_yaml::from_str(&text).map_err(|e| Error::Serialization(e.to_string()))?
    } else {
        serde_json::from_str(&text).map_err(|e| Error::Serialization(e.to_string()))?
    };
    saved.into_mlp()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nn::Activation;
    use crate::Tensor;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tempfile::tempdir;

    fn sample_model() -> Mlp {
        let mut rng = StdRng::seed_from_u64(17);
        Mlp::new(
            3,
            &[(4, Activation::Relu), (1, Activation::Identity)],
            &mut rng,
        )
    }

    fn sample_metadata() -> ModelMetadata {
        ModelMetadata {
            name: "classifier".into(),
            input_dim: 3,
            feature_names: vec!["a".into(), "b".into(), "c".into()],
        }
    }

    #[test]
    fn json_round_trip_preserves_predictions() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("model.json");
        let model = sample_model();

        save_model(&path, &model, sample_metadata()).unwrap();
        let (metadata, restored) = load_model(&path).unwrap();

        assert_eq!(metadata, sample_metadata());
        let x = Tensor::from_vec(vec![0.2, -0.4, 1.1], false);
        assert_relative_eq!(model.forward(&x).item(), restored.forward(&x).item());
    }

    #[test]
    fn yaml_round_trip_preserves_predictions() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("model.yaml");
        let model = sample_model();

        save_model(&path, &model, sample_metadata()).unwrap();
        let (_, restored) = load_model(&path).unwrap();

        let x = Tensor::from_vec(vec![1.0, 0.0, -1.0], false);
        assert_relative_eq!(model.forward(&x).item(), restored.forward(&x).item());
    }

    #[test]
    fn shape_mismatch_is_rejected() {
        let saved = SavedModel {
            metadata: sample_metadata(),
            layers: vec![SavedLayer {
                spec: LayerSpec {
                    in_dim: 3,
                    out_dim: 2,
                    activation: Activation::Relu,
                },
                weights: vec![0.0; 5],
                bias: vec![0.0; 2],
            }],
        };
        assert!(matches!(
            saved.into_mlp(),
            Err(Error::Serialization(_))
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = load_model(Path::new("/nonexistent/model.json"));
        assert!(matches!(err, Err(Error::Io(_))));
    }
}
