use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::error;
use tokio::time::sleep;
use crate::config::postgres::{MAX_CONNECTIONS, WAIT_FOR};
use crate::database::domain::{ImageRecord, NewImage};
use crate::database::tables::images::{create_table_images, delete_image, get_all_images,
                                      get_image, insert_image, update_image_classification};


#[derive(Clone, Debug)]
pub struct Repository {
    pool: PgPool,
}

impl Repository {
    pub async fn new(database_url: &str) -> Result<Self, sqlx::Error> {
        let pool = create_pool(database_url).await?;
        init_schema(&pool).await?;
        Ok(Self { pool })
    }

    /// Reintenta la inicialización hasta que la base esté disponible.
    pub async fn create_repository(database_url: &str) -> Self {
        loop {
            match Self::new(database_url).await {
                Ok(repo) => return repo,
                Err(e) => {
                    error!("Error inicializando repo: {:?}", e);
                    sleep(WAIT_FOR).await;
                }
            }
        }
    }

    /// Construye el repositorio sobre un pool ya creado, sin tocar el esquema.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, image: NewImage) -> Result<i32, sqlx::Error> {
        insert_image(&self.pool, image).await
    }

    pub async fn get(&self, id: i32) -> Result<Option<ImageRecord>, sqlx::Error> {
        get_image(&self.pool, id).await
    }

    pub async fn get_all(&self) -> Result<Vec<ImageRecord>, sqlx::Error> {
        get_all_images(&self.pool).await
    }

    pub async fn update_classification(&self,
                                       id: i32,
                                       classification: Option<String>,
                                       classified: bool,
                                       confidence: Option<f32>) -> Result<bool, sqlx::Error> {
        update_image_classification(&self.pool, id, classification, classified, confidence).await
    }

    pub async fn delete(&self, id: i32) -> Result<bool, sqlx::Error> {
        delete_image(&self.pool, id).await
    }
}


async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .connect(database_url)
        .await?;

    Ok(pool)
}


async fn init_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    create_table_images(pool).await?;
    Ok(())
}
