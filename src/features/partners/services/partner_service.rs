use sqlx::PgPool;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::deliveries::models::Delivery;
use crate::features::partners::dtos::UpdatePartnerDto;
use crate::features::partners::models::{CreatePartner, NeedLevel, Partner, PartnerStats};

/// Service for partner organization management
pub struct PartnerService {
    pool: PgPool,
}

impl PartnerService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// List partners by organization name, optionally filtered by `active`
    pub async fn list(&self, active: Option<bool>) -> Result<Vec<Partner>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM partners
            WHERE ($1::boolean IS NULL OR active = $1)
            ORDER BY organization_name ASC
            "#,
            Partner::COLUMNS
        );

        sqlx::query_as::<_, Partner>(&sql)
            .bind(active)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list partners: {:?}", e);
                AppError::Database(e)
            })
    }

    /// Get partner by ID
    pub async fn get_by_id(&self, id: Uuid) -> Result<Partner> {
        let sql = format!("SELECT {} FROM partners WHERE id = $1", Partner::COLUMNS);

        sqlx::query_as::<_, Partner>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to get partner: {:?}", e);
                AppError::Database(e)
            })?
            .ok_or_else(|| AppError::NotFound(format!("Partner {} not found", id)))
    }

    /// Get partner together with its delivery counts
    pub async fn get_with_stats(&self, id: Uuid) -> Result<(Partner, PartnerStats)> {
        let partner = self.get_by_id(id).await?;

        let stats = sqlx::query_as::<_, PartnerStats>(
            r#"
            SELECT
                COUNT(*) AS total_deliveries,
                COUNT(*) FILTER (WHERE status = 'delivered') AS completed_deliveries
            FROM deliveries
            WHERE partner_id = $1
            "#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to load partner stats: {:?}", e);
            AppError::Database(e)
        })?;

        Ok((partner, stats))
    }

    /// Register a new partner
    pub async fn create(&self, data: CreatePartner) -> Result<Partner> {
        let sql = format!(
            r#"
            INSERT INTO partners (
                organization_name, address, latitude, longitude, contact_name,
                contact_phone, contact_email, operating_hours, food_preferences,
                delivery_instructions, current_need_level
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {}
            "#,
            Partner::COLUMNS
        );

        let partner = sqlx::query_as::<_, Partner>(&sql)
            .bind(&data.organization_name)
            .bind(&data.address)
            .bind(data.latitude)
            .bind(data.longitude)
            .bind(&data.contact_name)
            .bind(&data.contact_phone)
            .bind(&data.contact_email)
            .bind(&data.operating_hours)
            .bind(&data.food_preferences)
            .bind(&data.delivery_instructions)
            .bind(data.current_need_level)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create partner: {:?}", e);
                AppError::Database(e)
            })?;

        tracing::info!(
            "Created partner: {} ({})",
            partner.id,
            partner.organization_name
        );
        Ok(partner)
    }

    /// Partial update (admin)
    pub async fn update(&self, id: Uuid, dto: &UpdatePartnerDto) -> Result<Partner> {
        let sql = format!(
            r#"
            UPDATE partners
            SET organization_name = COALESCE($2, organization_name),
                address = COALESCE($3, address),
                latitude = COALESCE($4, latitude),
                longitude = COALESCE($5, longitude),
                contact_name = COALESCE($6, contact_name),
                contact_phone = COALESCE($7, contact_phone),
                contact_email = COALESCE($8, contact_email),
                operating_hours = COALESCE($9, operating_hours),
                food_preferences = COALESCE($10, food_preferences),
                delivery_instructions = COALESCE($11, delivery_instructions),
                current_need_level = COALESCE($12, current_need_level),
                active = COALESCE($13, active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            Partner::COLUMNS
        );

        let partner = sqlx::query_as::<_, Partner>(&sql)
            .bind(id)
            .bind(&dto.organization_name)
            .bind(&dto.address)
            .bind(dto.latitude)
            .bind(dto.longitude)
            .bind(&dto.contact_name)
            .bind(&dto.contact_phone)
            .bind(&dto.contact_email)
            .bind(&dto.operating_hours)
            .bind(&dto.food_preferences)
            .bind(&dto.delivery_instructions)
            .bind(dto.current_need_level)
            .bind(dto.active)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to update partner: {:?}", e);
                AppError::Database(e)
            })?
            .ok_or_else(|| AppError::NotFound(format!("Partner {} not found", id)))?;

        tracing::info!("Updated partner: {}", id);
        Ok(partner)
    }

    /// Record the partner's current demand; feeds the next assignment decision
    pub async fn update_need_level(&self, id: Uuid, level: NeedLevel) -> Result<Partner> {
        let sql = format!(
            r#"
            UPDATE partners
            SET current_need_level = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            Partner::COLUMNS
        );

        let partner = sqlx::query_as::<_, Partner>(&sql)
            .bind(id)
            .bind(level)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to update partner need level: {:?}", e);
                AppError::Database(e)
            })?
            .ok_or_else(|| AppError::NotFound(format!("Partner {} not found", id)))?;

        tracing::info!("Partner {} need level set to {}", id, level);
        Ok(partner)
    }

    /// Delete a partner (admin). Partners referenced by deliveries are kept.
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM partners WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::from_constraint(
                    e,
                    "Partner has deliveries; deactivate it instead of deleting",
                )
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Partner {} not found", id)));
        }

        tracing::info!("Deleted partner: {}", id);
        Ok(())
    }

    /// Deliveries routed to a partner, newest first
    pub async fn list_deliveries(&self, id: Uuid) -> Result<Vec<Delivery>> {
        self.get_by_id(id).await?;

        let sql = format!(
            r#"
            SELECT {}
            FROM deliveries
            WHERE partner_id = $1
            ORDER BY created_at DESC
            "#,
            Delivery::COLUMNS
        );

        sqlx::query_as::<_, Delivery>(&sql)
            .bind(id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list partner deliveries: {:?}", e);
                AppError::Database(e)
            })
    }
}
