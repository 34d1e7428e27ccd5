use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::events::dtos::{
    CreateEventDto, EventImportRowDto, EventListQuery, ImportEventsResultDto, ImportRowErrorDto,
    UpdateEventDto,
};
use crate::features::events::models::{CreateEvent, Event, EventStatus};

/// Service for event scheduling and reporter assignment
pub struct EventService {
    pool: PgPool,
}

impl EventService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new event
    pub async fn create(&self, data: CreateEvent) -> Result<Event> {
        let sql = format!(
            r#"
            INSERT INTO events (
                title, location, latitude, longitude, start_time, end_time,
                expected_attendees, food_type, catering_company, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {}
            "#,
            Event::COLUMNS
        );

        let event = sqlx::query_as::<_, Event>(&sql)
            .bind(&data.title)
            .bind(&data.location)
            .bind(data.latitude)
            .bind(data.longitude)
            .bind(data.start_time)
            .bind(data.end_time)
            .bind(data.expected_attendees)
            .bind(&data.food_type)
            .bind(&data.catering_company)
            .bind(&data.notes)
            .fetch_one(&self.pool)
            .await
            .map_err(event_write_error("create event"))?;

        tracing::info!("Created event: {} ({})", event.id, event.title);
        Ok(event)
    }

    /// List events ordered by start time, with the total matching count
    pub async fn list(&self, query: &EventListQuery) -> Result<(Vec<Event>, i64)> {
        let pagination = query.pagination();
        let sql = format!(
            r#"
            SELECT {}
            FROM events
            WHERE ($1::event_status IS NULL OR status = $1)
              AND ($2::timestamptz IS NULL OR start_time >= $2)
              AND ($3::timestamptz IS NULL OR start_time <= $3)
            ORDER BY start_time ASC
            LIMIT $4 OFFSET $5
            "#,
            Event::COLUMNS
        );

        let events = sqlx::query_as::<_, Event>(&sql)
            .bind(query.status)
            .bind(query.from_date)
            .bind(query.to_date)
            .bind(pagination.limit())
            .bind(pagination.offset())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list events: {:?}", e);
                AppError::Database(e)
            })?;

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM events
            WHERE ($1::event_status IS NULL OR status = $1)
              AND ($2::timestamptz IS NULL OR start_time >= $2)
              AND ($3::timestamptz IS NULL OR start_time <= $3)
            "#,
        )
        .bind(query.status)
        .bind(query.from_date)
        .bind(query.to_date)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to count events: {:?}", e);
            AppError::Database(e)
        })?;

        Ok((events, total))
    }

    /// Get event by ID
    pub async fn get_by_id(&self, id: Uuid) -> Result<Event> {
        let sql = format!("SELECT {} FROM events WHERE id = $1", Event::COLUMNS);

        sqlx::query_as::<_, Event>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to get event: {:?}", e);
                AppError::Database(e)
            })?
            .ok_or_else(|| AppError::NotFound(format!("Event {} not found", id)))
    }

    /// Partial update (admin). Cancelling is only allowed before a report is
    /// filed; the UPDATE re-checks that so a report filed meanwhile wins.
    pub async fn update(&self, id: Uuid, dto: &UpdateEventDto) -> Result<Event> {
        let current = self.get_by_id(id).await?;

        if dto.status == Some(EventStatus::Cancelled) && !current.status.is_open_for_reporter() {
            return Err(AppError::Conflict(format!(
                "Event is already {} and can no longer be cancelled",
                current.status
            )));
        }

        let sql = format!(
            r#"
            UPDATE events
            SET title = COALESCE($2, title),
                location = COALESCE($3, location),
                latitude = COALESCE($4, latitude),
                longitude = COALESCE($5, longitude),
                start_time = COALESCE($6, start_time),
                end_time = COALESCE($7, end_time),
                expected_attendees = COALESCE($8, expected_attendees),
                food_type = COALESCE($9, food_type),
                catering_company = COALESCE($10, catering_company),
                notes = COALESCE($11, notes),
                status = COALESCE($12, status),
                updated_at = NOW()
            WHERE id = $1
              AND ($12::event_status IS NULL OR status IN ('scheduled', 'assigned'))
            RETURNING {}
            "#,
            Event::COLUMNS
        );

        let updated = sqlx::query_as::<_, Event>(&sql)
            .bind(id)
            .bind(&dto.title)
            .bind(&dto.location)
            .bind(dto.latitude)
            .bind(dto.longitude)
            .bind(dto.start_time)
            .bind(dto.end_time)
            .bind(dto.expected_attendees)
            .bind(&dto.food_type)
            .bind(&dto.catering_company)
            .bind(&dto.notes)
            .bind(dto.status)
            .fetch_optional(&self.pool)
            .await
            .map_err(event_write_error("update event"))?;

        let event = match updated {
            Some(event) => event,
            None => {
                let current = self.get_by_id(id).await?;
                return Err(AppError::Conflict(format!(
                    "Event is already {} and can no longer be cancelled",
                    current.status
                )));
            }
        };

        tracing::info!("Updated event: {}", id);
        Ok(event)
    }

    /// Delete an event (admin). Events with a recovery report are kept for history.
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::from_constraint(e, "Event has a recovery report and cannot be deleted")
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Event {} not found", id)));
        }

        tracing::info!("Deleted event: {}", id);
        Ok(())
    }

    /// Import pre-parsed rows; every row is an independent create
    pub async fn import_rows(&self, rows: Vec<EventImportRowDto>) -> ImportEventsResultDto {
        let mut events = Vec::new();
        let mut errors = Vec::new();

        for (index, row) in rows.into_iter().enumerate() {
            // Row numbers follow the spreadsheet: header is row 1
            let row_number = index + 2;

            let dto = match prepare_import_row(row) {
                Ok(dto) => dto,
                Err(error) => {
                    errors.push(ImportRowErrorDto {
                        row: row_number,
                        error,
                    });
                    continue;
                }
            };

            match self.create(dto.into()).await {
                Ok(event) => events.push(event.into()),
                Err(e) => errors.push(ImportRowErrorDto {
                    row: row_number,
                    error: import_error_message(&e),
                }),
            }
        }

        tracing::info!(
            "Event import processed: inserted={}, failed={}",
            events.len(),
            errors.len()
        );

        ImportEventsResultDto {
            inserted: events.len(),
            failed: errors.len(),
            events,
            errors,
        }
    }

    /// A reporter claims an unassigned, scheduled event
    pub async fn assign_reporter(&self, id: Uuid, reporter_id: Uuid) -> Result<Event> {
        let sql = format!(
            r#"
            UPDATE events
            SET reporter_id = $2, status = 'assigned', updated_at = NOW()
            WHERE id = $1 AND reporter_id IS NULL AND status = 'scheduled'
            RETURNING {}
            "#,
            Event::COLUMNS
        );

        let assigned = sqlx::query_as::<_, Event>(&sql)
            .bind(id)
            .bind(reporter_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::from_constraint(e, "Reporter account is not registered"))?;

        match assigned {
            Some(event) => {
                tracing::info!("Reporter {} assigned to event {}", reporter_id, id);
                Ok(event)
            }
            None => {
                // Distinguish a missing event from one that is already taken
                let current = self.get_by_id(id).await?;
                Err(AppError::Conflict(match current.reporter_id {
                    Some(_) => "Event already has a reporter assigned".to_string(),
                    None => format!("Event is {} and not open for assignment", current.status),
                }))
            }
        }
    }

    /// Release the reporter; only the reporter themself or an admin, and only before a report exists
    pub async fn unassign_reporter(&self, id: Uuid, user: &AuthenticatedUser) -> Result<Event> {
        let current = self.get_by_id(id).await?;

        if !user.owns_or_admin(current.reporter_id) {
            return Err(AppError::Forbidden(
                "You can only unassign yourself or must be an admin".to_string(),
            ));
        }

        let sql = format!(
            r#"
            UPDATE events
            SET reporter_id = NULL, status = 'scheduled', updated_at = NOW()
            WHERE id = $1 AND status = 'assigned'
            RETURNING {}
            "#,
            Event::COLUMNS
        );

        let event = sqlx::query_as::<_, Event>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to unassign reporter: {:?}", e);
                AppError::Database(e)
            })?
            .ok_or_else(|| {
                AppError::Conflict(format!(
                    "Event is {} and its reporter can no longer be unassigned",
                    current.status
                ))
            })?;

        tracing::info!("Reporter unassigned from event {}", id);
        Ok(event)
    }
}

/// Map violations of the `events` CHECK constraints to the rule each encodes
fn event_write_error(op: &'static str) -> impl FnOnce(sqlx::Error) -> AppError {
    move |e| {
        if let sqlx::Error::Database(db) = &e {
            match db.constraint() {
                Some("events_time_window") => {
                    return AppError::Validation("End time must be after start time".to_string())
                }
                Some("events_reporter_status") => {
                    return AppError::Conflict(
                        "An event with an assigned reporter cannot be scheduled".to_string(),
                    )
                }
                _ => {}
            }
        }
        tracing::error!("Failed to {}: {:?}", op, e);
        AppError::Database(e)
    }
}

/// Turn a loose import row into a validated create request
fn prepare_import_row(row: EventImportRowDto) -> std::result::Result<CreateEventDto, String> {
    let dto = CreateEventDto::try_from(row)?;
    dto.validate().map_err(|e| e.to_string())?;
    Ok(dto)
}

/// Row-level error text; storage failures stay generic
fn import_error_message(error: &AppError) -> String {
    match error {
        AppError::Database(_) | AppError::Internal(_) => "Failed to store event".to_string(),
        other => other.to_string(),
    }
}
