//! Dominio del Protocolo de Subida y Modelos de Cable.
//!
//! Este módulo define las estructuras de datos que viajan por el canal
//! dispositivo↔servidor: el frame de subida (encabezado + imagen + metadatos)
//! y la respuesta de comando que el servidor devuelve por cada frame aceptado.
//!
//! La forma en bytes del frame está fijada por el firmware de campo y debe
//! reproducirse bit a bit para mantener interoperabilidad.


use serde::{Serialize, Deserialize};
use std::fmt;


/// Modo operativo del dispositivo.
///
/// Controla la cadencia de captura y la calidad de imagen. Existe exactamente
/// un valor por dispositivo en todo momento; el dueño del valor es el
/// planificador de modos del dispositivo y el servidor solo lo refleja a
/// través de los metadatos de cada frame.
#[derive(Default, Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Standby,
    Alert,
    Active,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Standby => write!(f, "standby"),
            Mode::Alert => write!(f, "alert"),
            Mode::Active => write!(f, "active"),
        }
    }
}


/// Directiva de modo emitida por el servidor.
///
/// A diferencia de [`Mode`], incluye `RemainAlert`: fija el modo Alert actual
/// suprimiendo el timeout local del dispositivo, sin re-disparar la alerta.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NextMode {
    Standby,
    Alert,
    Active,
    RemainAlert,
}


/// Acción sugerida por el servidor, por encima del cambio de modo.
#[derive(Default, Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    StartStream,
    StopStream,
    #[default]
    None,
}


/// Instantánea de sensores ambientales embebida en los metadatos del frame.
#[derive(Default, Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SensorSnapshot {
    pub motion: bool,
    pub temperature_c: f32,
    pub humidity: f32,
}


/// Información de captura de la imagen subida.
#[derive(Default, Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CaptureInfo {
    pub exposure_ms: u32,
    pub resolution: String,
    pub format: String,
}


/// Metadatos que acompañan (opcionalmente) a cada imagen subida.
///
/// Si el documento JSON no llega dentro del timeout de lectura o no parsea,
/// el servidor sintetiza estos metadatos con valores por defecto; eso nunca
/// es un error del protocolo.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FrameMetadata {
    pub device_id: String,
    pub timestamp_utc: i64,
    /// `None` cuando los metadatos fueron sintetizados y el modo real del
    /// dispositivo es desconocido.
    #[serde(default)]
    pub mode: Option<Mode>,
    pub seq: u64,
    #[serde(default)]
    pub sensor: SensorSnapshot,
    #[serde(default)]
    pub capture: CaptureInfo,
}

impl FrameMetadata {
    /// Metadatos por defecto para un frame que llegó sin documento JSON.
    pub fn synthesized(seq: u64, timestamp_utc: i64) -> Self {
        Self {
            device_id: "unknown".to_string(),
            timestamp_utc,
            mode: None,
            seq,
            sensor: SensorSnapshot::default(),
            capture: CaptureInfo::default(),
        }
    }
}


/// Unidad de subida completa: secuencia, bytes de imagen y metadatos.
///
/// Se construye fresca en cada captura y es inmutable una vez enviada.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadFrame {
    pub sequence: u64,
    pub image: Vec<u8>,
    pub metadata: FrameMetadata,
}


/// Caja delimitadora de una detección, en coordenadas de píxel.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}


/// Resultado de la capacidad de clasificación, tal como viaja en la respuesta.
#[derive(Default, Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Detection {
    pub cat_detected: bool,
    pub confidence: f32,
    pub bbox: Option<BoundingBox>,
}


/// Respuesta de comando del servidor, un documento JSON por frame aceptado.
///
/// La entrega es best-effort en ambas direcciones: el servidor no exige
/// acuse, y una respuesta ausente o inparseable nunca tumba al dispositivo.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommandResponse {
    #[serde(default)]
    pub status: String,
    /// Eco de la secuencia del encabezado, en decimal, como string.
    #[serde(default)]
    pub frame: String,
    #[serde(default)]
    pub next_mode: Option<NextMode>,
    #[serde(default)]
    pub action: Action,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub detection: Detection,
}


/// Errores fatales de decodificación de un frame.
///
/// Ambas variantes cierran la conexión sin respuesta.
#[derive(Debug)]
pub enum FrameError {
    /// Encabezado malformado: sin coma, campos no numéricos, o longitud
    /// declarada fuera del límite admitido.
    BadHeader(String),
    /// El cuerpo quedó corto respecto de la longitud declarada: el par
    /// cerró o venció el timeout de lectura.
    Truncated { expected: usize, actual: usize },
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameError::BadHeader(reason) => {
                write!(f, "encabezado inválido: {reason}")
            }
            FrameError::Truncated { expected, actual } => {
                write!(f, "cuerpo truncado: esperados {expected} bytes, recibidos {actual}")
            }
        }
    }
}

impl std::error::Error for FrameError {}
