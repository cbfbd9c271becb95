use crate::api::ApiClient;
use crate::error::Result;
use crate::models::Notification;

const NOTIFICATIONS_PATH: &str = "/notifications";

#[derive(Debug, Clone)]
pub struct NotificationRepository {
    api: ApiClient,
}

impl NotificationRepository {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn notifications(&self) -> Result<Vec<Notification>> {
        self.api.get(NOTIFICATIONS_PATH).await
    }

    /// Unread notifications, counted client-side.
    pub async fn unread_count(&self) -> Result<usize> {
        let notifications = self.notifications().await?;
        Ok(notifications.iter().filter(|n| !n.read).count())
    }
}
