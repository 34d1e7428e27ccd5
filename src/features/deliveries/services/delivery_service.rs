use std::sync::Arc;

use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::deliveries::lifecycle::{next_status, DeliveryAction};
use crate::features::deliveries::models::{Delivery, DeliveryStatus};
use crate::features::deliveries::store::{
    DeliveryFilter, DeliveryStore, NewDelivery, TransitionCommand,
};
use crate::features::partners::select_partner;
use crate::features::recoveries::models::RecoveryStatus;

/// Service driving a recovery from acceptance to drop-off
pub struct DeliveryService {
    store: Arc<dyn DeliveryStore>,
}

impl DeliveryService {
    pub fn new(store: Arc<dyn DeliveryStore>) -> Self {
        Self { store }
    }

    /// A driver claims a pending recovery; the receiving partner is chosen here
    pub async fn accept(
        &self,
        driver: &AuthenticatedUser,
        report_id: Uuid,
        pickup: Option<(f64, f64)>,
    ) -> Result<Delivery> {
        let report = self
            .store
            .find_report(report_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Recovery report not found".to_string()))?;

        if !report.has_food {
            return Err(AppError::Validation(
                "This report indicates no food is available".to_string(),
            ));
        }

        if report.status != RecoveryStatus::Pending {
            return Err(AppError::Conflict(
                "This recovery is no longer available".to_string(),
            ));
        }

        if self
            .store
            .find_live_delivery_for_report(report_id)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(
                "Delivery already exists for this recovery report".to_string(),
            ));
        }

        if let Some((lat, lon)) = pickup {
            tracing::debug!("Driver {} accepting from ({}, {})", driver.user_id, lat, lon);
        }

        let partners = self.store.partner_snapshots().await?;
        let partner_id = select_partner(&partners)
            .ok_or_else(|| AppError::Unavailable("No available partners found".to_string()))?;

        let delivery = self
            .store
            .insert_accepted(NewDelivery {
                recovery_report_id: report_id,
                driver_id: driver.user_id,
                partner_id,
            })
            .await?;

        tracing::info!(
            "Delivery {} accepted by driver {} for report {}, routed to partner {}",
            delivery.id,
            driver.user_id,
            report_id,
            partner_id
        );
        Ok(delivery)
    }

    /// Move a delivery to `picked_up` or `delivered`
    pub async fn update_status(
        &self,
        id: Uuid,
        user: &AuthenticatedUser,
        target: DeliveryStatus,
        photo_url: Option<String>,
        issues: Option<String>,
    ) -> Result<Delivery> {
        let action = match DeliveryAction::toward(target) {
            Some(action @ (DeliveryAction::PickUp | DeliveryAction::Deliver)) => action,
            _ => {
                return Err(AppError::Validation(
                    "Status must be picked_up or delivered; use cancel to cancel".to_string(),
                ))
            }
        };

        self.transition(id, user, action, photo_url, issues).await
    }

    /// Cancel a delivery and put its report back in the queue
    pub async fn cancel(
        &self,
        id: Uuid,
        user: &AuthenticatedUser,
        reason: Option<String>,
    ) -> Result<Delivery> {
        self.transition(id, user, DeliveryAction::Cancel, None, reason)
            .await
    }

    async fn transition(
        &self,
        id: Uuid,
        user: &AuthenticatedUser,
        action: DeliveryAction,
        photo_url: Option<String>,
        issues: Option<String>,
    ) -> Result<Delivery> {
        let current = self.get_by_id(id).await?;

        if !user.owns_or_admin(Some(current.driver_id)) {
            return Err(AppError::Forbidden(
                "You do not have permission to update this delivery".to_string(),
            ));
        }

        if next_status(current.status, action).is_none() {
            return Err(AppError::Conflict(format!(
                "Cannot {} a delivery that is {}",
                action, current.status
            )));
        }

        let delivery = self
            .store
            .apply_transition(TransitionCommand {
                delivery_id: id,
                from: current.status,
                action,
                photo_url,
                issues,
            })
            .await?;

        tracing::info!(
            "Delivery {} moved {} -> {} by {}",
            id,
            current.status,
            delivery.status,
            user.user_id
        );
        Ok(delivery)
    }

    pub async fn list(&self, filter: DeliveryFilter) -> Result<Vec<Delivery>> {
        self.store.list_deliveries(filter).await
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Delivery> {
        self.store
            .find_delivery(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Delivery not found".to_string()))
    }
}
