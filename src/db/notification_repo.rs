// src/db/notification_repo.rs

use async_trait::async_trait;
use sqlx::{types::Json, PgPool};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::notification::{NewNotification, Notification},
};

#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn create(&self, new: &NewNotification) -> Result<Notification, AppError>;

    async fn list_for_user(&self, user_id: Uuid, unread_only: bool)
        -> Result<Vec<Notification>, AppError>;

    /// Marca como lida; `false` se a notificação não existe ou é de outro usuário.
    async fn mark_read(&self, id: Uuid, user_id: Uuid) -> Result<bool, AppError>;
}

#[derive(Clone)]
pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationStore for NotificationRepository {
    async fn create(&self, new: &NewNotification) -> Result<Notification, AppError> {
        let notification = sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO notifications (user_id, notification_type, title, message, payload)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(new.user_id)
        .bind(new.notification_type)
        .bind(&new.title)
        .bind(&new.message)
        .bind(new.payload.clone().map(Json))
        .fetch_one(&self.pool)
        .await?;

        Ok(notification)
    }

    async fn list_for_user(
        &self,
        user_id: Uuid,
        unread_only: bool,
    ) -> Result<Vec<Notification>, AppError> {
        let notifications = sqlx::query_as::<_, Notification>(
            r#"
            SELECT * FROM notifications
            WHERE user_id = $1 AND (NOT $2 OR read = FALSE)
            ORDER BY created_at DESC
            LIMIT 200
            "#,
        )
        .bind(user_id)
        .bind(unread_only)
        .fetch_all(&self.pool)
        .await?;

        Ok(notifications)
    }

    async fn mark_read(&self, id: Uuid, user_id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE notifications SET read = TRUE WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
