//! Test fixtures: identities, auth injection and an in-memory store.
//!
//! `InMemoryStore` implements both store ports over one shared state. Every
//! write command works on a staged copy and swaps it in only at the end, so
//! a `FailPoint` firing mid-command leaves the visible state untouched, the
//! same way a rolled-back transaction would. It also stands in for the user
//! directory and the driver fan-out.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use axum::{extract::Request, middleware::Next, Router};
use chrono::{Duration, Utc};
use fake::faker::address::en::StreetName;
use fake::faker::company::en::CompanyName;
use fake::faker::name::en::Name;
use fake::Fake;
use jsonwebtoken::{encode, EncodingKey, Header};
use sqlx::error::{DatabaseError, ErrorKind};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::auth::model::{AuthenticatedUser, Role};
use crate::features::deliveries::models::{Delivery, DeliveryStatus};
use crate::features::deliveries::store::{
    DeliveryFilter, DeliveryStore, NewDelivery, TransitionCommand,
};
use crate::features::events::models::{Event, EventStatus};
use crate::features::notifications::{DriverNotice, NotificationDispatcher};
use crate::features::partners::models::{NeedLevel, Partner, PartnerSnapshot};
use crate::features::recoveries::models::{CreateRecoveryReport, RecoveryReport, RecoveryStatus};
use crate::features::recoveries::store::{RecoveryStore, ReportContentUpdate, ReportFilter};
use crate::features::users::UserDirectory;

// =============================================================================
// IDENTITIES
// =============================================================================

pub fn admin_user() -> AuthenticatedUser {
    AuthenticatedUser::new(Uuid::new_v4(), Role::Admin)
}

pub fn driver_user() -> AuthenticatedUser {
    AuthenticatedUser::new(Uuid::new_v4(), Role::Driver)
}

pub fn reporter_user() -> AuthenticatedUser {
    AuthenticatedUser::new(Uuid::new_v4(), Role::Reporter)
}

pub fn partner_user() -> AuthenticatedUser {
    AuthenticatedUser::new(Uuid::new_v4(), Role::Partner)
}

/// Layer that places `user` on every request, standing in for the JWT middleware
pub fn with_user(router: Router, user: AuthenticatedUser) -> Router {
    router.layer(axum::middleware::from_fn(
        move |mut request: Request, next: Next| {
            let user = user.clone();
            async move {
                request.extensions_mut().insert(user);
                next.run(request).await
            }
        },
    ))
}

/// HS256 token carrying `sub` and `role`, valid for an hour
pub fn bearer_token(secret: &str, user_id: Uuid, role: &str) -> String {
    let claims = serde_json::json!({
        "sub": user_id,
        "role": role,
        "exp": Utc::now().timestamp() + 3600,
    });
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

#[derive(Debug, thiserror::Error)]
#[error("{message}")]
struct ConstraintViolation {
    message: String,
    kind: ErrorKind,
    constraint: Option<&'static str>,
}

impl DatabaseError for ConstraintViolation {
    fn message(&self) -> &str {
        &self.message
    }

    fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        self
    }

    fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
        self
    }

    fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
        self
    }

    fn constraint(&self) -> Option<&str> {
        self.constraint
    }

    fn kind(&self) -> ErrorKind {
        match self.kind {
            ErrorKind::UniqueViolation => ErrorKind::UniqueViolation,
            ErrorKind::ForeignKeyViolation => ErrorKind::ForeignKeyViolation,
            ErrorKind::NotNullViolation => ErrorKind::NotNullViolation,
            ErrorKind::CheckViolation => ErrorKind::CheckViolation,
            _ => ErrorKind::Other,
        }
    }
}

/// A database error as Postgres would raise it for `constraint`
pub fn db_violation(kind: ErrorKind, constraint: Option<&'static str>) -> sqlx::Error {
    sqlx::Error::Database(Box::new(ConstraintViolation {
        message: format!("constraint violated: {:?}", constraint),
        kind,
        constraint,
    }))
}

/// Pool that never connects; for routes that reject before touching the database
pub fn lazy_pool() -> sqlx::PgPool {
    sqlx::postgres::PgPoolOptions::new()
        .connect_lazy("postgres://localhost/unreachable")
        .unwrap()
}

// =============================================================================
// IN-MEMORY STORE
// =============================================================================

/// Point inside a multi-row write where a simulated crash aborts the command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailPoint {
    /// Report inserted, event not yet moved to `reported`
    AfterReportInsert,
    /// Report claimed, delivery not yet inserted
    AfterReportClaim,
    /// Delivery row moved, report cascade not yet applied
    AfterDeliveryWrite,
    /// Report cascaded, event cascade not yet applied
    AfterReportCascade,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryState {
    pub events: Vec<Event>,
    pub reports: Vec<RecoveryReport>,
    pub deliveries: Vec<Delivery>,
    pub partners: Vec<Partner>,
    pub users: HashMap<Uuid, Role>,
    /// Recipient and notice for every notification written
    pub notifications: Vec<(Uuid, DriverNotice)>,
}

type Interleave = Box<dyn FnOnce(&mut MemoryState) + Send>;

#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<MemoryState>,
    fail_point: Mutex<Option<FailPoint>>,
    interleave: Mutex<Option<Interleave>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm a one-shot crash at `point`
    pub fn fail_at(&self, point: FailPoint) {
        *self.fail_point.lock().unwrap() = Some(point);
    }

    /// Apply `f` to the committed state right before the next write command
    /// stages its copy, as if another request committed in between
    pub fn before_next_write(&self, f: impl FnOnce(&mut MemoryState) + Send + 'static) {
        *self.interleave.lock().unwrap() = Some(Box::new(f));
    }

    pub fn snapshot(&self) -> MemoryState {
        self.state.lock().unwrap().clone()
    }

    pub fn event(&self, id: Uuid) -> Event {
        self.snapshot()
            .events
            .into_iter()
            .find(|e| e.id == id)
            .unwrap()
    }

    pub fn report(&self, id: Uuid) -> RecoveryReport {
        self.snapshot()
            .reports
            .into_iter()
            .find(|r| r.id == id)
            .unwrap()
    }

    pub fn delivery(&self, id: Uuid) -> Delivery {
        self.snapshot()
            .deliveries
            .into_iter()
            .find(|d| d.id == id)
            .unwrap()
    }

    pub fn seed_event(&self, status: EventStatus, reporter_id: Option<Uuid>) -> Event {
        let start = Utc::now() + Duration::days(1);
        let event = Event {
            id: Uuid::new_v4(),
            title: format!("{} luncheon", CompanyName().fake::<String>()),
            location: StreetName().fake(),
            latitude: None,
            longitude: None,
            start_time: start,
            end_time: start + Duration::hours(3),
            expected_attendees: Some(80),
            food_type: None,
            catering_company: None,
            notes: None,
            reporter_id,
            status,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        self.state.lock().unwrap().events.push(event.clone());
        event
    }

    /// A reported event with a report in `status`
    pub fn seed_report(&self, has_food: bool, status: RecoveryStatus) -> RecoveryReport {
        let reporter = Uuid::new_v4();
        let event = self.seed_event(EventStatus::Reported, Some(reporter));
        let report = RecoveryReport {
            id: Uuid::new_v4(),
            event_id: event.id,
            reporter_id: reporter,
            has_food,
            food_quantity: Some("4 trays".to_string()),
            food_description: None,
            notes: None,
            photo_urls: Vec::new(),
            status,
            reported_at: Utc::now(),
            updated_at: Utc::now(),
        };
        self.state.lock().unwrap().reports.push(report.clone());
        report
    }

    pub fn seed_partner(&self, need: NeedLevel, active: bool) -> Partner {
        let partner = Partner {
            id: Uuid::new_v4(),
            organization_name: CompanyName().fake(),
            address: StreetName().fake(),
            latitude: None,
            longitude: None,
            contact_name: Name().fake(),
            contact_phone: None,
            contact_email: None,
            operating_hours: None,
            food_preferences: None,
            delivery_instructions: None,
            current_need_level: need,
            active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        self.state.lock().unwrap().partners.push(partner.clone());
        partner
    }

    /// Past deliveries that reached `delivered` for `partner_id`
    pub fn seed_delivered_history(&self, partner_id: Uuid, count: usize) {
        let mut state = self.state.lock().unwrap();
        for _ in 0..count {
            state.deliveries.push(Delivery {
                id: Uuid::new_v4(),
                recovery_report_id: Uuid::new_v4(),
                driver_id: Uuid::new_v4(),
                partner_id,
                status: DeliveryStatus::Delivered,
                pickup_time: Some(Utc::now()),
                delivery_time: Some(Utc::now()),
                pickup_photo_url: None,
                delivery_photo_url: None,
                issues: None,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            });
        }
    }

    pub fn update_partner(&self, id: Uuid, need: NeedLevel, active: bool) {
        let mut state = self.state.lock().unwrap();
        if let Some(partner) = state.partners.iter_mut().find(|p| p.id == id) {
            partner.current_need_level = need;
            partner.active = active;
        }
    }

    /// Run `f` against a staged copy under the lock; swap it in only on `Ok`
    fn write<T>(&self, f: impl FnOnce(&mut MemoryState) -> Result<T>) -> Result<T> {
        let mut state = self.state.lock().unwrap();
        if let Some(interleave) = self.interleave.lock().unwrap().take() {
            interleave(&mut state);
        }
        let mut staged = state.clone();
        let out = f(&mut staged)?;
        *state = staged;
        Ok(out)
    }

    fn crash_if(&self, point: FailPoint) -> Result<()> {
        let mut armed = self.fail_point.lock().unwrap();
        if *armed == Some(point) {
            *armed = None;
            return Err(AppError::Internal(format!("simulated crash at {:?}", point)));
        }
        Ok(())
    }
}

#[async_trait]
impl RecoveryStore for InMemoryStore {
    async fn find_event(&self, id: Uuid) -> Result<Option<Event>> {
        Ok(self.snapshot().events.into_iter().find(|e| e.id == id))
    }

    async fn find_report(&self, id: Uuid) -> Result<Option<RecoveryReport>> {
        Ok(self.snapshot().reports.into_iter().find(|r| r.id == id))
    }

    async fn find_report_by_event(&self, event_id: Uuid) -> Result<Option<RecoveryReport>> {
        Ok(self
            .snapshot()
            .reports
            .into_iter()
            .find(|r| r.event_id == event_id))
    }

    async fn insert_report(&self, data: CreateRecoveryReport) -> Result<RecoveryReport> {
        self.write(|staged| {
            if staged.reports.iter().any(|r| r.event_id == data.event_id) {
                return Err(AppError::Conflict(
                    "A recovery report already exists for this event".to_string(),
                ));
            }

            let report = RecoveryReport {
                id: Uuid::new_v4(),
                event_id: data.event_id,
                reporter_id: data.reporter_id,
                has_food: data.has_food,
                food_quantity: data.food_quantity,
                food_description: data.food_description,
                notes: data.notes,
                photo_urls: data.photo_urls,
                status: RecoveryStatus::Pending,
                reported_at: Utc::now(),
                updated_at: Utc::now(),
            };
            staged.reports.push(report.clone());

            self.crash_if(FailPoint::AfterReportInsert)?;

            let event = staged
                .events
                .iter_mut()
                .find(|e| e.id == data.event_id && e.status.is_open_for_reporter())
                .ok_or_else(|| {
                    AppError::Conflict("Event is no longer open for reporting".to_string())
                })?;
            event.status = EventStatus::Reported;

            Ok(report)
        })
    }

    async fn list_reports(&self, filter: ReportFilter) -> Result<Vec<RecoveryReport>> {
        let mut reports: Vec<RecoveryReport> = self
            .snapshot()
            .reports
            .into_iter()
            .filter(|r| filter.status.is_none_or(|s| r.status == s))
            .filter(|r| filter.has_food.is_none_or(|h| r.has_food == h))
            .collect();
        reports.reverse();
        Ok(reports)
    }

    async fn update_report_content(
        &self,
        id: Uuid,
        changes: &ReportContentUpdate,
    ) -> Result<Option<RecoveryReport>> {
        self.write(|staged| {
            let Some(report) = staged.reports.iter_mut().find(|r| r.id == id) else {
                return Ok(None);
            };
            if changes
                .has_food
                .is_some_and(|h| h != report.has_food && report.status != RecoveryStatus::Pending)
            {
                return Ok(None);
            }

            if let Some(has_food) = changes.has_food {
                report.has_food = has_food;
            }
            if let Some(quantity) = &changes.food_quantity {
                report.food_quantity = Some(quantity.clone());
            }
            if let Some(description) = &changes.food_description {
                report.food_description = Some(description.clone());
            }
            if let Some(notes) = &changes.notes {
                report.notes = Some(notes.clone());
            }
            if let Some(urls) = &changes.photo_urls {
                report.photo_urls = urls.clone();
            }
            let updated = report.clone();

            Ok(Some(updated))
        })
    }
}

#[async_trait]
impl DeliveryStore for InMemoryStore {
    async fn find_delivery(&self, id: Uuid) -> Result<Option<Delivery>> {
        Ok(self.snapshot().deliveries.into_iter().find(|d| d.id == id))
    }

    async fn find_report(&self, id: Uuid) -> Result<Option<RecoveryReport>> {
        RecoveryStore::find_report(self, id).await
    }

    async fn find_live_delivery_for_report(&self, report_id: Uuid) -> Result<Option<Delivery>> {
        Ok(self
            .snapshot()
            .deliveries
            .into_iter()
            .find(|d| d.recovery_report_id == report_id && d.status.is_live()))
    }

    async fn partner_snapshots(&self) -> Result<Vec<PartnerSnapshot>> {
        let state = self.snapshot();
        Ok(state
            .partners
            .iter()
            .filter(|p| p.active)
            .map(|p| PartnerSnapshot {
                id: p.id,
                active: p.active,
                need_level: p.current_need_level,
                delivered_count: state
                    .deliveries
                    .iter()
                    .filter(|d| d.partner_id == p.id && d.status == DeliveryStatus::Delivered)
                    .count() as i64,
            })
            .collect())
    }

    async fn insert_accepted(&self, new: NewDelivery) -> Result<Delivery> {
        self.write(|staged| {
            let report = staged
                .reports
                .iter_mut()
                .find(|r| r.id == new.recovery_report_id && r.is_claimable())
                .ok_or_else(|| {
                    AppError::Conflict("This recovery is no longer available".to_string())
                })?;
            report.status = RecoveryStatus::Assigned;

            self.crash_if(FailPoint::AfterReportClaim)?;

            if staged
                .deliveries
                .iter()
                .any(|d| d.recovery_report_id == new.recovery_report_id && d.status.is_live())
            {
                return Err(AppError::Conflict(
                    "Delivery already exists for this recovery report".to_string(),
                ));
            }

            let delivery = Delivery {
                id: Uuid::new_v4(),
                recovery_report_id: new.recovery_report_id,
                driver_id: new.driver_id,
                partner_id: new.partner_id,
                status: DeliveryStatus::Accepted,
                pickup_time: None,
                delivery_time: None,
                pickup_photo_url: None,
                delivery_photo_url: None,
                issues: None,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            };
            staged.deliveries.push(delivery.clone());

            Ok(delivery)
        })
    }

    async fn apply_transition(&self, cmd: TransitionCommand) -> Result<Delivery> {
        let target = cmd.action.target();
        let cascade = cmd.action.cascade();
        self.write(|staged| {
            let delivery = staged
                .deliveries
                .iter_mut()
                .find(|d| d.id == cmd.delivery_id && d.status == cmd.from)
                .ok_or_else(|| {
                    AppError::Conflict(format!(
                        "Delivery {} is no longer {}",
                        cmd.delivery_id, cmd.from
                    ))
                })?;

            delivery.status = target;
            match target {
                DeliveryStatus::PickedUp => {
                    delivery.pickup_time = Some(Utc::now());
                    if cmd.photo_url.is_some() {
                        delivery.pickup_photo_url = cmd.photo_url.clone();
                    }
                }
                DeliveryStatus::Delivered => {
                    delivery.delivery_time = Some(Utc::now());
                    if cmd.photo_url.is_some() {
                        delivery.delivery_photo_url = cmd.photo_url.clone();
                    }
                }
                _ => {}
            }
            if cmd.issues.is_some() {
                delivery.issues = cmd.issues.clone();
            }
            let updated = delivery.clone();

            self.crash_if(FailPoint::AfterDeliveryWrite)?;

            let report = staged
                .reports
                .iter_mut()
                .find(|r| r.id == updated.recovery_report_id)
                .ok_or_else(|| AppError::Internal("delivery without report".to_string()))?;
            report.status = cascade.report_status;
            let event_id = report.event_id;

            self.crash_if(FailPoint::AfterReportCascade)?;

            if let Some(event_status) = cascade.event_status {
                if let Some(event) = staged.events.iter_mut().find(|e| e.id == event_id) {
                    event.status = event_status;
                }
            }

            Ok(updated)
        })
    }

    async fn list_deliveries(&self, filter: DeliveryFilter) -> Result<Vec<Delivery>> {
        let mut deliveries: Vec<Delivery> = self
            .snapshot()
            .deliveries
            .into_iter()
            .filter(|d| filter.status.is_none_or(|s| d.status == s))
            .filter(|d| filter.driver_id.is_none_or(|id| d.driver_id == id))
            .filter(|d| filter.partner_id.is_none_or(|id| d.partner_id == id))
            .collect();
        deliveries.reverse();
        Ok(deliveries)
    }
}

#[async_trait]
impl UserDirectory for InMemoryStore {
    async fn sync_identity(&self, user: &AuthenticatedUser) -> Result<()> {
        self.write(|staged| {
            staged.users.insert(user.user_id, user.role);
            Ok(())
        })
    }
}

/// Fans out to the mirrored drivers, like the Postgres dispatcher
#[async_trait]
impl NotificationDispatcher for InMemoryStore {
    async fn notify_active_drivers(&self, notice: DriverNotice) -> Result<u64> {
        self.write(|staged| {
            let drivers: Vec<Uuid> = staged
                .users
                .iter()
                .filter(|(_, role)| **role == Role::Driver)
                .map(|(id, _)| *id)
                .collect();
            for id in &drivers {
                staged.notifications.push((*id, notice.clone()));
            }
            Ok(drivers.len() as u64)
        })
    }
}

// =============================================================================
// DISPATCHERS
// =============================================================================

/// Forwards every notice to a channel the test can await
pub struct RecordingDispatcher {
    tx: mpsc::UnboundedSender<DriverNotice>,
}

impl RecordingDispatcher {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<DriverNotice>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl NotificationDispatcher for RecordingDispatcher {
    async fn notify_active_drivers(&self, notice: DriverNotice) -> Result<u64> {
        let _ = self.tx.send(notice);
        Ok(1)
    }
}

/// Always fails, and reports that it was called
pub struct FailingDispatcher {
    tx: mpsc::UnboundedSender<()>,
}

impl FailingDispatcher {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl NotificationDispatcher for FailingDispatcher {
    async fn notify_active_drivers(&self, _notice: DriverNotice) -> Result<u64> {
        let _ = self.tx.send(());
        Err(AppError::Internal("notification backend down".to_string()))
    }
}
