//! PostgreSQL implementation of ProfileRepository.
//!
//! Entitlement fields live in `user_profiles`, one row per user. The grant
//! is a single upsert whose `WHERE` guard skips rows already paid with the
//! same transaction, so concurrent duplicates update zero rows.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::foundation::{DomainError, ErrorCode, Timestamp, TransactionId, UserId};
use crate::domain::payment::{
    Amount, AmountUnit, ApplyOutcome, Currency, EntitlementUpdate, UserEntitlement,
};
use crate::ports::ProfileRepository;

/// PostgreSQL implementation of the ProfileRepository port.
pub struct PostgresProfileRepository {
    pool: PgPool,
}

impl PostgresProfileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies the bundled schema migrations.
    pub async fn migrate(&self) -> Result<(), DomainError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| DomainError::database(format!("Failed to run migrations: {}", e)))
    }
}

/// Database row representation of a profile's entitlement fields.
#[derive(Debug, sqlx::FromRow)]
struct ProfileRow {
    user_id: String,
    is_paid: bool,
    payment_date: Option<DateTime<Utc>>,
    payment_method: Option<String>,
    payment_amount: Option<i64>,
    payment_amount_unit: Option<String>,
    transaction_id: Option<String>,
    currency: Option<String>,
    context: Option<String>,
}

impl TryFrom<ProfileRow> for UserEntitlement {
    type Error = DomainError;

    fn try_from(row: ProfileRow) -> Result<Self, Self::Error> {
        let corrupt = |field: &str, e: String| {
            DomainError::new(ErrorCode::DatabaseError, format!("Invalid {}: {}", field, e))
        };

        let payment_amount = match (row.payment_amount, row.payment_amount_unit.as_deref()) {
            (Some(value), Some("minor")) => Some(Amount::minor(value)),
            (Some(value), _) => Some(Amount::whole(value)),
            (None, _) => None,
        };

        Ok(UserEntitlement {
            user_id: UserId::new(row.user_id).map_err(|e| corrupt("user_id", e.to_string()))?,
            is_paid: row.is_paid,
            payment_date: row.payment_date.map(Timestamp::from_datetime),
            payment_method: row.payment_method,
            payment_amount,
            transaction_id: row
                .transaction_id
                .map(TransactionId::new)
                .transpose()
                .map_err(|e| corrupt("transaction_id", e.to_string()))?,
            currency: row
                .currency
                .map(Currency::new)
                .transpose()
                .map_err(|e| corrupt("currency", e.to_string()))?,
            context: row.context,
        })
    }
}

fn unit_to_str(unit: AmountUnit) -> &'static str {
    match unit {
        AmountUnit::Major => "major",
        AmountUnit::Minor => "minor",
    }
}

#[async_trait]
impl ProfileRepository for PostgresProfileRepository {
    async fn find_entitlement(
        &self,
        user_id: &UserId,
    ) -> Result<Option<UserEntitlement>, DomainError> {
        let row: Option<ProfileRow> = sqlx::query_as(
            r#"
            SELECT user_id, is_paid, payment_date, payment_method, payment_amount,
                   payment_amount_unit, transaction_id, currency, context
            FROM user_profiles
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Failed to find profile: {}", e))
        })?;

        row.map(UserEntitlement::try_from).transpose()
    }

    async fn grant_entitlement(
        &self,
        user_id: &UserId,
        update: &EntitlementUpdate,
        payment_method: &str,
        at: Timestamp,
    ) -> Result<ApplyOutcome, DomainError> {
        let result = sqlx::query(
            r#"
            INSERT INTO user_profiles (
                user_id, is_paid, payment_date, payment_method, payment_amount,
                payment_amount_unit, transaction_id, currency, context, updated_at
            ) VALUES ($1, TRUE, $2, $3, $4, $5, $6, $7, $8, $2)
            ON CONFLICT (user_id) DO UPDATE SET
                is_paid = TRUE,
                payment_date = EXCLUDED.payment_date,
                payment_method = EXCLUDED.payment_method,
                payment_amount = EXCLUDED.payment_amount,
                payment_amount_unit = EXCLUDED.payment_amount_unit,
                transaction_id = EXCLUDED.transaction_id,
                currency = EXCLUDED.currency,
                context = COALESCE(EXCLUDED.context, user_profiles.context),
                updated_at = EXCLUDED.updated_at
            WHERE NOT (
                user_profiles.is_paid
                AND user_profiles.transaction_id IS NOT DISTINCT FROM EXCLUDED.transaction_id
            )
            "#,
        )
        .bind(user_id.as_str())
        .bind(at.as_datetime())
        .bind(payment_method)
        .bind(update.amount.value())
        .bind(unit_to_str(update.amount.unit()))
        .bind(update.transaction_id.as_str())
        .bind(update.currency.as_str())
        .bind(update.context.as_deref())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Failed to grant entitlement: {}", e))
                .with_detail("user_id", user_id.as_str())
        })?;

        if result.rows_affected() == 0 {
            Ok(ApplyOutcome::AlreadyApplied)
        } else {
            Ok(ApplyOutcome::Applied)
        }
    }
}
