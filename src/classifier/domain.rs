//! Frontera de la capacidad de clasificación.
//!
//! El núcleo solo exige `classify(imagen) -> (etiqueta, confianza)`; si detrás
//! hay una heurística o un modelo entrenado es irrelevante para el protocolo.
//! La implementación por defecto reproduce la heurística de movimiento del
//! servidor de campo.


use std::fmt;
use std::path::Path;
use crate::protocol::domain::{BoundingBox, FrameMetadata};


/// Resultado de una clasificación.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub label: String,
    pub detected: bool,
    pub confidence: f32,
    pub bbox: Option<BoundingBox>,
}


#[derive(Debug)]
pub enum ClassifyError {
    Unavailable(String),
}

impl fmt::Display for ClassifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassifyError::Unavailable(reason) => {
                write!(f, "clasificador no disponible: {reason}")
            }
        }
    }
}

impl std::error::Error for ClassifyError {}


/// Capacidad de clasificación enchufable.
///
/// Los fallos se capturan por conexión en el manejador: el resultado se
/// degrada a `detected = false, confidence = 0` y nunca llega al dispositivo.
pub trait Classifier: Send + Sync {
    fn classify(&self,
                image_path: &Path,
                metadata: &FrameMetadata) -> Result<Classification, ClassifyError>;
}


/// Heurística por defecto: el sensor de movimiento como proxy de detección.
#[derive(Debug, Default)]
pub struct MotionHeuristicClassifier;

impl Classifier for MotionHeuristicClassifier {
    fn classify(&self,
                _image_path: &Path,
                metadata: &FrameMetadata) -> Result<Classification, ClassifyError> {

        if metadata.sensor.motion {
            Ok(Classification {
                label: "cat".to_string(),
                detected: true,
                confidence: 0.8,
                bbox: Some(BoundingBox { x: 100, y: 80, width: 120, height: 100 }),
            })
        } else {
            Ok(Classification {
                label: "none".to_string(),
                detected: false,
                confidence: 0.1,
                bbox: None,
            })
        }
    }
}
