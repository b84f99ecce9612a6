//! In-app notification inbox.

use super::access_service::resolve_actor;
use super::{ServiceResult, Session};
use crate::model::notification::Notification;
use crate::model::NotificationId;
use crate::repo::notification_repo::NotificationRepository;
use crate::repo::user_repo::UserRepository;
use log::info;

pub struct NotificationService<R> {
    repo: R,
}

impl<R> NotificationService<R>
where
    R: UserRepository + NotificationRepository,
{
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Notifications addressed to the caller, newest first.
    pub fn inbox(&self, session: &Session, unread_only: bool) -> ServiceResult<Vec<Notification>> {
        let actor = resolve_actor(&self.repo, session)?;
        Ok(self.repo.list_notifications(actor.user.id, unread_only)?)
    }

    /// Marks one of the caller's notifications as read.
    ///
    /// Notifications addressed to someone else report `NotFound`.
    pub fn mark_read(&self, session: &Session, id: NotificationId) -> ServiceResult<()> {
        let actor = resolve_actor(&self.repo, session)?;
        self.repo.mark_notification_read(id, actor.user.id)?;
        info!(
            "event=notification_read module=service status=ok notification_id={} user_id={}",
            id, actor.user.id
        );
        Ok(())
    }
}
