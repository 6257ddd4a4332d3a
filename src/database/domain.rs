//! Estructuras de dominio para la persistencia de metadatos de imágenes.
//!
//! El núcleo solo necesita insertar una fila por subida aceptada y ofrecer
//! las operaciones CRUD básicas sobre ella; el API de gestión por encima de
//! estas filas queda fuera de alcance.


use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};
use sqlx::FromRow;


/// Fila persistida de una imagen recibida.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct ImageRecord {
    pub id: i32,
    pub filename: String,
    pub camera_id: Option<i64>,
    pub file_type: Option<String>,
    pub classification: Option<String>,
    pub classified: bool,
    pub confidence: Option<f32>,
    pub timestamp: DateTime<Utc>,
}


/// Datos de una fila nueva; el id y el timestamp los asigna la base.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct NewImage {
    pub filename: String,
    pub camera_id: Option<i64>,
    pub file_type: Option<String>,
    pub classification: Option<String>,
    pub classified: bool,
    pub confidence: Option<f32>,
}
