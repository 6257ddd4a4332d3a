//! Definición del Contexto de Aplicación (Shared State).
//!
//! Este módulo implementa el patrón de **Estado Compartido** para el rol
//! servidor. El `AppContext` actúa como un contenedor de "Inyección de
//! Dependencias" manual, agrupando los recursos que deben ser accesibles por
//! cada conexión aceptada (repositorio, configuración, motor de decisión y
//! capacidad de clasificación).


use std::sync::Arc;
use crate::classifier::domain::{Classifier, MotionHeuristicClassifier};
use crate::database::repository::Repository;
use crate::decision::domain::DecisionEngine;
use crate::system::domain::System;


#[derive(Clone)]
pub struct AppContext {
    pub repo: Repository,
    pub system: Arc<System>,
    pub engine: Arc<DecisionEngine>,
    pub classifier: Arc<dyn Classifier>,
}


impl AppContext {
    pub async fn new(system: Arc<System>) -> Self {
        let repo = Repository::create_repository(&system.database_url).await;
        let engine = Arc::new(DecisionEngine::new(
            system.confidence_threshold,
            system.consecutive_required,
        ));

        Self {
            repo,
            system,
            engine,
            classifier: Arc::new(MotionHeuristicClassifier),
        }
    }
}
