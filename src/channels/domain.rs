use tokio::sync::mpsc;
use crate::bridge::domain::{BridgeEvent, SerialMsg};


/// Cableado central de canales entre las tareas del rol dispositivo.
pub struct Channels {
    pub bridge_to_scheduler: mpsc::Sender<BridgeEvent>,
    pub scheduler_from_bridge: mpsc::Receiver<BridgeEvent>,

    pub scheduler_to_bridge: mpsc::Sender<SerialMsg>,
    pub bridge_from_scheduler: mpsc::Receiver<SerialMsg>,
}


impl Channels {
    pub fn new() -> Channels {
        let (b_to_s, s_from_b) = mpsc::channel::<BridgeEvent>(32);
        let (s_to_b, b_from_s) = mpsc::channel::<SerialMsg>(32);

        Self {
            bridge_to_scheduler: b_to_s,
            scheduler_from_bridge: s_from_b,
            scheduler_to_bridge: s_to_b,
            bridge_from_scheduler: b_from_s,
        }
    }
}
