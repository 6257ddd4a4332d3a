//! Frontera de la captura de imagen.
//!
//! El driver de hardware queda fuera del núcleo; el planificador solo pide
//! bytes de imagen a la calidad del perfil vigente.


use std::fmt;
use std::path::PathBuf;


#[derive(Debug)]
pub enum CaptureError {
    Io(std::io::Error),
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureError::Io(e) => write!(f, "error de captura: {e}"),
        }
    }
}

impl std::error::Error for CaptureError {}


/// Fuente de imágenes enchufable.
pub trait Camera: Send {
    fn capture(&mut self, quality: u8) -> Result<Vec<u8>, CaptureError>;
}


/// Cámara respaldada por un archivo fijo, para bancos de prueba y despliegues
/// donde otro proceso deja el último frame en disco.
#[derive(Debug)]
pub struct FileCamera {
    path: PathBuf,
}

impl FileCamera {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Camera for FileCamera {
    fn capture(&mut self, _quality: u8) -> Result<Vec<u8>, CaptureError> {
        std::fs::read(&self.path).map_err(CaptureError::Io)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_source_file_is_a_capture_error() {
        let mut camera = FileCamera::new("/definitivamente/no/existe.jpg");
        assert!(matches!(camera.capture(85), Err(CaptureError::Io(_))));
    }
}
