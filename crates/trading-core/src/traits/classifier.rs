//! Classifier trait definition.

use crate::types::{FeatureVector, Label};

/// A trained binary classifier over [`FeatureVector`]s.
///
/// Prediction is infallible: implementations validate their shape when they
/// are loaded, not per call.
pub trait Classifier: Send + Sync {
    /// Predict the label for one feature vector.
    fn predict(&self, features: &FeatureVector) -> Label;

    /// Short description for logs.
    fn name(&self) -> &str;
}

impl<C: Classifier + ?Sized> Classifier for Box<C> {
    fn predict(&self, features: &FeatureVector) -> Label {
        (**self).predict(features)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
