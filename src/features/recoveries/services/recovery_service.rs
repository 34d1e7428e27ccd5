use std::sync::Arc;

use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::events::models::{Event, EventStatus};
use crate::features::notifications::{DriverNotice, NotificationDispatcher};
use crate::features::recoveries::dtos::{CreateRecoveryReportDto, UpdateRecoveryReportDto};
use crate::features::recoveries::models::{CreateRecoveryReport, RecoveryReport, RecoveryStatus};
use crate::features::recoveries::store::{RecoveryStore, ReportFilter};

/// Service for filing and revising post-event recovery reports
pub struct RecoveryService {
    store: Arc<dyn RecoveryStore>,
    dispatcher: Arc<dyn NotificationDispatcher>,
}

impl RecoveryService {
    pub fn new(store: Arc<dyn RecoveryStore>, dispatcher: Arc<dyn NotificationDispatcher>) -> Self {
        Self { store, dispatcher }
    }

    /// File the report for an event and move the event to `reported`.
    ///
    /// When food is available every active driver is notified in the
    /// background; a failed notification does not undo the report.
    pub async fn create(
        &self,
        user: &AuthenticatedUser,
        dto: CreateRecoveryReportDto,
    ) -> Result<RecoveryReport> {
        let event = self
            .store
            .find_event(dto.event_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Event {} not found", dto.event_id)))?;

        if matches!(event.status, EventStatus::Cancelled | EventStatus::Completed) {
            return Err(AppError::Conflict(format!(
                "Event is {} and cannot be reported",
                event.status
            )));
        }

        if !user.owns_or_admin(event.reporter_id) {
            return Err(AppError::Forbidden(
                "You are not assigned to this event".to_string(),
            ));
        }

        if self.store.find_report_by_event(event.id).await?.is_some() {
            return Err(AppError::Conflict(
                "Recovery report already exists for this event".to_string(),
            ));
        }

        let report = self
            .store
            .insert_report(CreateRecoveryReport {
                event_id: event.id,
                reporter_id: user.user_id,
                has_food: dto.has_food,
                food_quantity: dto.food_quantity,
                food_description: dto.food_description,
                notes: dto.notes,
                photo_urls: dto.photo_urls,
            })
            .await?;

        tracing::info!(
            "Recovery report {} filed for event {} (has_food={})",
            report.id,
            event.id,
            report.has_food
        );

        if report.has_food {
            self.announce(&report, &event);
        }

        Ok(report)
    }

    fn announce(&self, report: &RecoveryReport, event: &Event) {
        let notice = DriverNotice::new_recovery(
            report.id,
            &event.title,
            &event.location,
            report.food_quantity.as_deref(),
        );
        let dispatcher = Arc::clone(&self.dispatcher);
        let report_id = report.id;

        tokio::spawn(async move {
            match dispatcher.notify_active_drivers(notice).await {
                Ok(count) => {
                    tracing::info!("Notified {} drivers about recovery {}", count, report_id)
                }
                Err(e) => {
                    tracing::warn!("Failed to notify drivers about recovery {}: {}", report_id, e)
                }
            }
        });
    }

    pub async fn list(&self, filter: ReportFilter) -> Result<Vec<RecoveryReport>> {
        self.store.list_reports(filter).await
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<RecoveryReport> {
        self.store
            .find_report(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Recovery report {} not found", id)))
    }

    /// Revise report content (the filing reporter or an admin).
    ///
    /// `has_food` can only change while nobody has claimed the report.
    pub async fn update(
        &self,
        id: Uuid,
        user: &AuthenticatedUser,
        dto: UpdateRecoveryReportDto,
    ) -> Result<RecoveryReport> {
        let current = self.get_by_id(id).await?;

        if !user.owns_or_admin(Some(current.reporter_id)) {
            return Err(AppError::Forbidden(
                "You do not have permission to update this report".to_string(),
            ));
        }

        if dto.has_food.is_some_and(|h| h != current.has_food)
            && current.status != RecoveryStatus::Pending
        {
            return Err(AppError::Conflict(format!(
                "Report is {}; food availability can no longer change",
                current.status
            )));
        }

        let Some(report) = self.store.update_report_content(id, &dto.into()).await? else {
            // Claimed between the read above and the guarded write
            let current = self.get_by_id(id).await?;
            return Err(AppError::Conflict(format!(
                "Report is {}; food availability can no longer change",
                current.status
            )));
        };

        tracing::info!("Updated recovery report: {}", id);
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::users::UserDirectory;
    use crate::shared::test_helpers::{
        admin_user, driver_user, reporter_user, FailPoint, FailingDispatcher, InMemoryStore,
        RecordingDispatcher,
    };
    use std::time::Duration;
    use tokio_test::{assert_err, assert_ok};

    fn create_dto(event_id: Uuid, has_food: bool) -> CreateRecoveryReportDto {
        CreateRecoveryReportDto {
            event_id,
            has_food,
            food_quantity: Some("2 trays".to_string()),
            food_description: Some("Sandwiches".to_string()),
            notes: None,
            photo_urls: vec!["/uploads/tray.jpg".to_string()],
        }
    }

    fn service_with_recorder(
        store: Arc<InMemoryStore>,
    ) -> (
        RecoveryService,
        tokio::sync::mpsc::UnboundedReceiver<DriverNotice>,
    ) {
        let (dispatcher, rx) = RecordingDispatcher::new();
        (RecoveryService::new(store, Arc::new(dispatcher)), rx)
    }

    #[tokio::test]
    async fn test_create_moves_event_to_reported_and_notifies() {
        let store = Arc::new(InMemoryStore::new());
        let reporter = reporter_user();
        let event = store.seed_event(EventStatus::Assigned, Some(reporter.user_id));
        let (service, mut rx) = service_with_recorder(store.clone());

        let report = assert_ok!(service.create(&reporter, create_dto(event.id, true)).await);

        assert_eq!(report.status, RecoveryStatus::Pending);
        assert_eq!(report.reporter_id, reporter.user_id);
        assert_eq!(store.event(event.id).status, EventStatus::Reported);

        let notice = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(notice.related_id, Some(report.id));
        assert!(notice.message.contains(&event.title));
    }

    #[tokio::test]
    async fn test_create_without_food_sends_nothing() {
        let store = Arc::new(InMemoryStore::new());
        let reporter = reporter_user();
        let event = store.seed_event(EventStatus::Assigned, Some(reporter.user_id));
        let (service, mut rx) = service_with_recorder(store.clone());

        assert_ok!(service.create(&reporter, create_dto(event.id, false)).await);

        // Sender dropped with the service once no task holds it
        drop(service);
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_second_report_for_event_conflicts() {
        let store = Arc::new(InMemoryStore::new());
        let reporter = reporter_user();
        let event = store.seed_event(EventStatus::Assigned, Some(reporter.user_id));
        let (service, _rx) = service_with_recorder(store.clone());

        assert_ok!(service.create(&reporter, create_dto(event.id, false)).await);
        let err = assert_err!(service.create(&reporter, create_dto(event.id, true)).await);

        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(store.snapshot().reports.len(), 1);
    }

    #[tokio::test]
    async fn test_unassigned_reporter_is_forbidden() {
        let store = Arc::new(InMemoryStore::new());
        let event = store.seed_event(EventStatus::Assigned, Some(Uuid::new_v4()));
        let (service, _rx) = service_with_recorder(store.clone());

        let err = assert_err!(service.create(&reporter_user(), create_dto(event.id, true)).await);
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_admin_may_report_unstaffed_event() {
        let store = Arc::new(InMemoryStore::new());
        let event = store.seed_event(EventStatus::Scheduled, None);
        let (service, _rx) = service_with_recorder(store.clone());

        assert_ok!(service.create(&admin_user(), create_dto(event.id, false)).await);
        assert_eq!(store.event(event.id).status, EventStatus::Reported);
    }

    #[tokio::test]
    async fn test_cancelled_event_cannot_be_reported() {
        let store = Arc::new(InMemoryStore::new());
        let event = store.seed_event(EventStatus::Cancelled, None);
        let (service, _rx) = service_with_recorder(store.clone());

        let err = assert_err!(service.create(&admin_user(), create_dto(event.id, true)).await);
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_missing_event_is_not_found() {
        let store = Arc::new(InMemoryStore::new());
        let (service, _rx) = service_with_recorder(store);

        let err = assert_err!(
            service
                .create(&admin_user(), create_dto(Uuid::new_v4(), true))
                .await
        );
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_crash_between_report_and_event_leaves_nothing() {
        let store = Arc::new(InMemoryStore::new());
        let reporter = reporter_user();
        let event = store.seed_event(EventStatus::Assigned, Some(reporter.user_id));
        let (service, _rx) = service_with_recorder(store.clone());

        store.fail_at(FailPoint::AfterReportInsert);
        assert_err!(service.create(&reporter, create_dto(event.id, true)).await);

        assert!(store.snapshot().reports.is_empty());
        assert_eq!(store.event(event.id).status, EventStatus::Assigned);
    }

    #[tokio::test]
    async fn test_dispatch_failure_keeps_report() {
        let store = Arc::new(InMemoryStore::new());
        let reporter = reporter_user();
        let event = store.seed_event(EventStatus::Assigned, Some(reporter.user_id));
        let (dispatcher, mut called) = FailingDispatcher::new();
        let service = RecoveryService::new(store.clone(), Arc::new(dispatcher));

        let report = assert_ok!(service.create(&reporter, create_dto(event.id, true)).await);

        tokio::time::timeout(Duration::from_secs(1), called.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(store.report(report.id).status, RecoveryStatus::Pending);
        assert_eq!(store.event(event.id).status, EventStatus::Reported);
    }

    #[tokio::test]
    async fn test_update_by_other_reporter_forbidden() {
        let store = Arc::new(InMemoryStore::new());
        let report = store.seed_report(true, RecoveryStatus::Pending);
        let (service, _rx) = service_with_recorder(store);

        let dto = UpdateRecoveryReportDto {
            notes: Some("Side door".to_string()),
            ..Default::default()
        };
        let err = assert_err!(service.update(report.id, &reporter_user(), dto).await);
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_update_content_keeps_status() {
        let store = Arc::new(InMemoryStore::new());
        let report = store.seed_report(true, RecoveryStatus::Assigned);
        let (service, _rx) = service_with_recorder(store);

        let dto = UpdateRecoveryReportDto {
            food_description: Some("Pasta and salad".to_string()),
            ..Default::default()
        };
        let updated = assert_ok!(service.update(report.id, &admin_user(), dto).await);

        assert_eq!(updated.food_description.as_deref(), Some("Pasta and salad"));
        assert_eq!(updated.status, RecoveryStatus::Assigned);
    }

    #[tokio::test]
    async fn test_has_food_frozen_once_claimed() {
        let store = Arc::new(InMemoryStore::new());
        let report = store.seed_report(true, RecoveryStatus::Assigned);
        let (service, _rx) = service_with_recorder(store);

        let dto = UpdateRecoveryReportDto {
            has_food: Some(false),
            ..Default::default()
        };
        let err = assert_err!(service.update(report.id, &admin_user(), dto).await);
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_has_food_change_loses_to_concurrent_claim() {
        let store = Arc::new(InMemoryStore::new());
        let report = store.seed_report(true, RecoveryStatus::Pending);
        let report_id = report.id;
        // A driver accepts after the service read the report as pending
        store.before_next_write(move |state| {
            if let Some(r) = state.reports.iter_mut().find(|r| r.id == report_id) {
                r.status = RecoveryStatus::Assigned;
            }
        });
        let (service, _rx) = service_with_recorder(store.clone());

        let dto = UpdateRecoveryReportDto {
            has_food: Some(false),
            ..Default::default()
        };
        let err = assert_err!(service.update(report_id, &admin_user(), dto).await);

        assert!(matches!(err, AppError::Conflict(_)));
        let stored = store.report(report_id);
        assert!(stored.has_food);
        assert_eq!(stored.status, RecoveryStatus::Assigned);
    }

    #[tokio::test]
    async fn test_newly_seen_reporter_files_and_mirrored_drivers_are_notified() {
        let store = Arc::new(InMemoryStore::new());
        let reporter = reporter_user();
        let drivers = [driver_user(), driver_user()];
        for user in drivers.iter().chain(std::iter::once(&reporter)) {
            assert_ok!(store.sync_identity(user).await);
        }
        let event = store.seed_event(EventStatus::Assigned, Some(reporter.user_id));
        let service = RecoveryService::new(store.clone(), store.clone());

        assert_ok!(service.create(&reporter, create_dto(event.id, true)).await);

        let mut notified = Vec::new();
        for _ in 0..50 {
            notified = store.snapshot().notifications;
            if !notified.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        let mut recipients: Vec<Uuid> = notified.iter().map(|(id, _)| *id).collect();
        recipients.sort();
        let mut expected: Vec<Uuid> = drivers.iter().map(|d| d.user_id).collect();
        expected.sort();
        assert_eq!(recipients, expected);
    }

    #[tokio::test]
    async fn test_list_filters_by_has_food() {
        let store = Arc::new(InMemoryStore::new());
        store.seed_report(true, RecoveryStatus::Pending);
        store.seed_report(false, RecoveryStatus::Pending);
        let (service, _rx) = service_with_recorder(store);

        let with_food = assert_ok!(
            service
                .list(ReportFilter {
                    has_food: Some(true),
                    ..Default::default()
                })
                .await
        );
        assert_eq!(with_food.len(), 1);
        assert!(with_food[0].has_food);
    }
}
