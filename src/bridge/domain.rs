//! Dominio del puente con el microcontrolador auxiliar.
//!
//! El enlace serie intercambia JSON delimitado por saltos de línea. Acá solo
//! se modelan las formas de los mensajes; el transporte es un stream de bytes
//! inyectado. Los mensajes entrantes malformados se registran y descartan,
//! nunca son fatales.


use serde::{Serialize, Deserialize};
use crate::protocol::domain::{Mode, SensorSnapshot};


/// Mensajes del enlace serie, etiquetados por el campo `type`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SerialMsg {
    /// Lectura de sensores ambientales del auxiliar.
    Sensor {
        #[serde(default)]
        motion: bool,
        #[serde(default)]
        temp_c: f32,
        #[serde(default)]
        humidity: f32,
    },
    /// Comando directo del auxiliar; hoy solo `set_mode`.
    Command {
        cmd: String,
        #[serde(default)]
        mode: Option<Mode>,
    },
    /// Estado saliente hacia el auxiliar.
    Status {
        mode: Mode,
        last_upload: i64,
        seq: u64,
        offline: bool,
    },
}


/// Evento ya validado que el puente entrega al planificador.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BridgeEvent {
    Sensor(SensorSnapshot),
    SetMode(Mode),
}
