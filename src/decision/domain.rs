//! Motor de Decisión del servidor.
//!
//! Mantiene una historia acotada de detecciones por dispositivo y la tabla
//! de política que convierte (modo actual, resultado de detección) en la
//! directiva de modo/acción de la respuesta. La tabla se reproduce exacta:
//! la historia se muta ANTES de leer la decisión, por lo que el orden de
//! evaluación de las ramas es significativo.


use std::collections::VecDeque;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use crate::config::decision::{ACTIVE_EXIT_FLOOR, HISTORY_CAPACITY};
use crate::protocol::domain::{Action, Detection, Mode, NextMode};


/// Historia acotada de resultados de detección de un dispositivo.
///
/// Capacidad fija de [`HISTORY_CAPACITY`] entradas; al desbordar se expulsa
/// exactamente la más vieja (FIFO). La longitud nunca supera la capacidad.
#[derive(Debug, Clone)]
pub struct DetectionHistory {
    slots: VecDeque<bool>,
}

impl Default for DetectionHistory {
    fn default() -> Self {
        Self { slots: VecDeque::with_capacity(HISTORY_CAPACITY) }
    }
}

impl DetectionHistory {
    pub fn push(&mut self, detected: bool) {
        if self.slots.len() == HISTORY_CAPACITY {
            self.slots.pop_front();
        }
        self.slots.push_back(detected);
    }

    /// Cantidad de positivos en la ventana actual.
    pub fn positives(&self) -> usize {
        self.slots.iter().filter(|d| **d).count()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn oldest(&self) -> Option<bool> {
        self.slots.front().copied()
    }
}


/// Tripleta que la tabla de política produce por cada frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub next_mode: NextMode,
    pub action: Action,
    pub message: &'static str,
}


/// Último estado observado de un dispositivo, para diagnóstico.
#[derive(Debug, Clone)]
pub struct DeviceStatus {
    pub last_seen: DateTime<Utc>,
    pub commanded_mode: NextMode,
    pub frame: u64,
    pub last_detection: bool,
}


/// Estado compartido del motor de decisión.
///
/// El único recurso mutable compartido entre conexiones es el mapa de
/// historias; cada entrada se bloquea por dispositivo, de modo que subidas
/// concurrentes del mismo dispositivo no pueden intercalar el push y la
/// lectura de la historia.
///
/// Las entradas viven lo que vive el proceso: el protocolo no define una
/// política de retención para dispositivos que desaparecen.
#[derive(Debug)]
pub struct DecisionEngine {
    confidence_threshold: f32,
    consecutive_required: usize,
    histories: DashMap<String, DetectionHistory>,
    statuses: DashMap<String, DeviceStatus>,
}

impl DecisionEngine {
    pub fn new(confidence_threshold: f32, consecutive_required: usize) -> Self {
        Self {
            confidence_threshold,
            consecutive_required,
            histories: DashMap::new(),
            statuses: DashMap::new(),
        }
    }

    /// Aplica la tabla de política a un frame ya clasificado.
    ///
    /// # Flujo de Trabajo
    /// 1. Empuja `cat_detected` a la historia del dispositivo (FIFO, cap 5).
    /// 2. Cuenta los positivos recientes bajo el mismo candado de entrada.
    /// 3. Evalúa la rama correspondiente al modo reportado por el frame.
    ///
    /// Un modo desconocido (metadatos sintetizados) cae en la rama por
    /// defecto: volver a standby sin acción.
    pub fn decide(&self,
                  device_id: &str,
                  current_mode: Option<Mode>,
                  detection: &Detection) -> Decision {

        let mut history = self.histories.entry(device_id.to_string()).or_default();
        history.push(detection.cat_detected);
        let recent_positive = history.positives();
        drop(history);

        match current_mode {
            Some(Mode::Standby) => {
                if detection.cat_detected && detection.confidence > self.confidence_threshold {
                    Decision {
                        next_mode: NextMode::Alert,
                        action: Action::None,
                        message: "Cat detected - entering alert mode",
                    }
                } else {
                    Decision {
                        next_mode: NextMode::Standby,
                        action: Action::None,
                        message: "No detection - remaining in standby",
                    }
                }
            }
            Some(Mode::Alert) => {
                if recent_positive >= self.consecutive_required {
                    Decision {
                        next_mode: NextMode::Active,
                        action: Action::StartStream,
                        message: "Multiple detections - entering active mode",
                    }
                } else if detection.cat_detected {
                    Decision {
                        next_mode: NextMode::RemainAlert,
                        action: Action::None,
                        message: "Detection in progress - remaining in alert",
                    }
                } else {
                    // El timeout local del dispositivo se encarga de expirar la alerta.
                    Decision {
                        next_mode: NextMode::Alert,
                        action: Action::None,
                        message: "Monitoring continues",
                    }
                }
            }
            Some(Mode::Active) => {
                if !detection.cat_detected && recent_positive < ACTIVE_EXIT_FLOOR {
                    Decision {
                        next_mode: NextMode::Standby,
                        action: Action::StopStream,
                        message: "No recent detections - returning to standby",
                    }
                } else {
                    Decision {
                        next_mode: NextMode::Active,
                        action: Action::None,
                        message: "Continuing active monitoring",
                    }
                }
            }
            None => Decision {
                next_mode: NextMode::Standby,
                action: Action::None,
                message: "Default response",
            },
        }
    }

    /// Registra el último contacto del dispositivo.
    pub fn touch(&self,
                 device_id: &str,
                 commanded_mode: NextMode,
                 frame: u64,
                 last_detection: bool) {

        self.statuses.insert(device_id.to_string(), DeviceStatus {
            last_seen: Utc::now(),
            commanded_mode,
            frame,
            last_detection,
        });
    }

    pub fn device_status(&self, device_id: &str) -> Option<DeviceStatus> {
        self.statuses.get(device_id).map(|s| s.clone())
    }

    pub fn history_snapshot(&self, device_id: &str) -> Option<(usize, usize)> {
        self.histories.get(device_id).map(|h| (h.len(), h.positives()))
    }
}
