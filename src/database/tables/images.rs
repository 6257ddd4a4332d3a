use sqlx::{Executor, PgPool};
use crate::database::domain::{ImageRecord, NewImage};


pub async fn create_table_images(pool: &PgPool) -> Result<(), sqlx::Error> {
    pool.execute(
        r#"
        CREATE TABLE IF NOT EXISTS images (
            id             SERIAL PRIMARY KEY,
            filename       TEXT NOT NULL,
            camera_id      BIGINT,
            file_type      TEXT,
            classification TEXT,
            classified     BOOLEAN NOT NULL DEFAULT FALSE,
            confidence     REAL,
            timestamp      TIMESTAMPTZ NOT NULL DEFAULT NOW()
        );
        "#
    )
        .await?;

    Ok(())
}


pub async fn insert_image(pool: &PgPool,
                          image: NewImage) -> Result<i32, sqlx::Error> {

    let row: (i32,) = sqlx::query_as(
        "INSERT INTO images (filename, camera_id, file_type, classification, classified, confidence)
         VALUES ($1, $2, $3, $4, $5, $6)
         RETURNING id"
    )
        .bind(image.filename)
        .bind(image.camera_id)
        .bind(image.file_type)
        .bind(image.classification)
        .bind(image.classified)
        .bind(image.confidence)
        .fetch_one(pool)
        .await?;

    Ok(row.0)
}


pub async fn get_image(pool: &PgPool,
                       id: i32) -> Result<Option<ImageRecord>, sqlx::Error> {

    sqlx::query_as(
        "SELECT id, filename, camera_id, file_type, classification, classified, confidence, timestamp
         FROM images WHERE id = $1"
    )
        .bind(id)
        .fetch_optional(pool)
        .await
}


pub async fn get_all_images(pool: &PgPool) -> Result<Vec<ImageRecord>, sqlx::Error> {
    sqlx::query_as(
        "SELECT id, filename, camera_id, file_type, classification, classified, confidence, timestamp
         FROM images ORDER BY id"
    )
        .fetch_all(pool)
        .await
}


pub async fn update_image_classification(pool: &PgPool,
                                         id: i32,
                                         classification: Option<String>,
                                         classified: bool,
                                         confidence: Option<f32>) -> Result<bool, sqlx::Error> {

    let result = sqlx::query(
        "UPDATE images SET classification = $2, classified = $3, confidence = $4 WHERE id = $1"
    )
        .bind(id)
        .bind(classification)
        .bind(classified)
        .bind(confidence)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}


pub async fn delete_image(pool: &PgPool,
                          id: i32) -> Result<bool, sqlx::Error> {

    let result = sqlx::query("DELETE FROM images WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
