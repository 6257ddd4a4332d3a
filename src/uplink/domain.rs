use std::fmt;


/// Fallos del viaje de ida y vuelta de una subida.
///
/// Ninguna variante es fatal para el bucle del dispositivo: todas degradan
/// a `offline = true` y el modo local queda intacto.
#[derive(Debug)]
pub enum UploadError {
    ConnectTimeout,
    ReadTimeout,
    Io(std::io::Error),
    Encode(serde_json::Error),
    /// La respuesta llegó pero no parsea como JSON; equivale a "sin respuesta".
    BadResponse(serde_json::Error),
    EmptyResponse,
}

impl fmt::Display for UploadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadError::ConnectTimeout => write!(f, "timeout de conexión"),
            UploadError::ReadTimeout => write!(f, "timeout esperando la respuesta"),
            UploadError::Io(e) => write!(f, "error de red: {e}"),
            UploadError::Encode(e) => write!(f, "no se pudo serializar el frame: {e}"),
            UploadError::BadResponse(e) => write!(f, "respuesta inparseable: {e}"),
            UploadError::EmptyResponse => write!(f, "el servidor cerró sin responder"),
        }
    }
}

impl std::error::Error for UploadError {}
