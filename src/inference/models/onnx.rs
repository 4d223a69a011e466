//! ONNX Runtime backend for networks exported from the training notebooks.

use ndarray::{Array2, ArrayViewD, CowArray, IxDyn};
use ort::{Environment, GraphOptimizationLevel, Session, SessionBuilder, Value};
use std::path::Path;

use crate::inference::adapter::SoftmaxClassifier;
use crate::inference::error::InferenceError;
use crate::inference::features::{ScaledVector, FEATURE_COUNT};

pub struct OnnxClassifier {
    session: Session,
}

impl OnnxClassifier {
    pub fn load(path: &Path) -> Result<Self, InferenceError> {
        let environment = Environment::builder()
            .with_name("nebula-lens")
            .build()
            .map_err(backend)?
            .into_arc();

        let session = SessionBuilder::new(&environment)
            .map_err(backend)?
            .with_optimization_level(GraphOptimizationLevel::Level1)
            .map_err(backend)?
            .with_intra_threads(1)
            .map_err(backend)?
            .with_model_from_file(path)
            .map_err(backend)?;

        tracing::debug!("Loaded ONNX graph from {}", path.display());
        Ok(Self { session })
    }
}

impl SoftmaxClassifier for OnnxClassifier {
    fn predict_raw(&self, input: &ScaledVector) -> Result<Vec<f64>, InferenceError> {
        let array = input_tensor(input)?;

        let inputs = vec![Value::from_array(self.session.allocator(), &array).map_err(backend)?];
        let outputs = self.session.run(inputs).map_err(backend)?;
        let first = outputs
            .first()
            .ok_or_else(|| InferenceError::Backend("graph produced no outputs".to_string()))?;
        let tensor = first.try_extract::<f32>().map_err(backend)?;
        output_row(tensor.view())
    }
}

/// One `(1, 6)` f32 row, the layout the exported graphs were traced with.
fn input_tensor(input: &ScaledVector) -> Result<CowArray<'static, f32, IxDyn>, InferenceError> {
    let row: Vec<f32> = input.as_slice().iter().map(|v| *v as f32).collect();
    let array = Array2::from_shape_vec((1, FEATURE_COUNT), row)
        .map_err(|e| InferenceError::Backend(e.to_string()))?;
    Ok(CowArray::from(array.into_dyn()))
}

/// Accepts `[n]` or `[1, n]` outputs; anything else is a batch or a
/// different head and is rejected.
fn output_row(output: ArrayViewD<'_, f32>) -> Result<Vec<f64>, InferenceError> {
    let width = match output.shape() {
        [n] => *n,
        [1, n] => *n,
        shape => {
            return Err(InferenceError::Backend(format!(
                "unexpected output shape {:?}",
                shape
            )))
        }
    };
    if width == 0 {
        return Err(InferenceError::ShapeMismatch {
            expected: 1,
            actual: 0,
        });
    }
    Ok(output.iter().map(|v| *v as f64).collect())
}

fn backend(e: ort::OrtError) -> InferenceError {
    InferenceError::Backend(e.to_string())
}
