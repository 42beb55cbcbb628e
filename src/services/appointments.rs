//! Appointment records.
//!
//! Deliberately minimal: the scheduling grid lives in another service. This
//! backend only needs enough of an appointment to check one out, which is
//! where it meets the inventory ledger.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::db::DbPool;
use crate::entities::appointment::{self, AppointmentStatus, Entity as Appointment};
use crate::errors::ServiceError;
use crate::services::inventory::fifo::round_money;

#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub customer_name: String,
    pub service_name: String,
    pub service_price: Decimal,
    pub scheduled_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct AppointmentService {
    db_pool: Arc<DbPool>,
}

impl AppointmentService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self, data))]
    pub async fn create_appointment(
        &self,
        tenant_id: Uuid,
        data: NewAppointment,
    ) -> Result<appointment::Model, ServiceError> {
        if data.service_price < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "service_price must not be negative".to_string(),
            ));
        }

        let now = Utc::now();
        let model = appointment::ActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: Set(tenant_id),
            customer_name: Set(data.customer_name),
            service_name: Set(data.service_name),
            service_price: Set(round_money(data.service_price)),
            scheduled_at: Set(data.scheduled_at),
            status: Set(AppointmentStatus::Scheduled),
            completed_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let created = model.insert(self.db_pool.as_ref()).await?;

        info!(appointment_id = %created.id, "Appointment created");
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn get_appointment(
        &self,
        tenant_id: Uuid,
        appointment_id: Uuid,
    ) -> Result<appointment::Model, ServiceError> {
        Appointment::find_by_id(appointment_id)
            .filter(appointment::Column::TenantId.eq(tenant_id))
            .one(self.db_pool.as_ref())
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Appointment {} not found", appointment_id))
            })
    }
}
