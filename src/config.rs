pub mod modes {
    use tokio::time::Duration;

    pub const STANDBY_INTERVAL: Duration = Duration::from_secs(30);
    pub const ALERT_INTERVAL: Duration = Duration::from_secs(5);
    pub const ACTIVE_INTERVAL: Duration = Duration::from_millis(500);

    pub const STANDBY_QUALITY: u8 = 85;
    pub const ALERT_QUALITY: u8 = 90;
    pub const ACTIVE_QUALITY: u8 = 85;

    pub const ALERT_TIMEOUT: Duration = Duration::from_secs(30);
    pub const TICK: Duration = Duration::from_millis(100);

    /// Ticks entre emisiones periódicas de estado hacia el puente serie.
    pub const STATUS_EVERY_TICKS: u32 = 100;

    pub const CAPTURE_RESOLUTION: &str = "320x240";
    pub const CAPTURE_FORMAT: &str = "jpg";
}

pub mod protocol {
    use tokio::time::Duration;

    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
    pub const READ_TIMEOUT: Duration = Duration::from_secs(5);
    pub const METADATA_WAIT: Duration = Duration::from_millis(500);

    pub const MAX_IMAGE_BYTES: usize = 8 * 1024 * 1024;
    pub const METADATA_BUF_BYTES: usize = 2048;
    pub const RESPONSE_LINE_BYTES: usize = 4096;
}

pub mod decision {
    pub const CONFIDENCE_THRESHOLD: f32 = 0.7;
    pub const CONSECUTIVE_REQUIRED: usize = 3;
    pub const HISTORY_CAPACITY: usize = 5;
    /// Piso de positivos recientes por debajo del cual Active vuelve a Standby.
    pub const ACTIVE_EXIT_FLOOR: usize = 2;
}

pub mod postgres {
    use tokio::time::Duration;

    pub const WAIT_FOR: Duration = Duration::from_secs(5);
    pub const MAX_CONNECTIONS: u32 = 20;
}
