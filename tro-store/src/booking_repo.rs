use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tro_booking::models::{Booking, BookingStatus, JourneyKey, PassengerSnapshot, Referral, SeatNumber};
use tro_booking::store::BookingStore;
use tro_core::payment::{PaymentMethod, PaymentRecord};
use tro_core::{CoreError, CoreResult};
use uuid::Uuid;

const BOOKING_COLUMNS: &str = "id, client_reference, passenger_name, passenger_phone, \
     emergency_contact, route_id, bus_id, travel_date, pickup, destination, bus_type, seats, \
     total_minor, referral_id, status, created_at, rejection_reason, hubtel_transaction_id, \
     payment_status, amount_paid_minor, payment_method";

pub struct PgBookingStore {
    pool: PgPool,
}

impl PgBookingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn db_err(context: &'static str) -> impl Fn(sqlx::Error) -> CoreError {
    move |e| {
        tracing::error!(error = %e, context, "database operation failed");
        CoreError::data_access(e)
    }
}

fn corrupt(msg: &str) -> CoreError {
    CoreError::DataAccess(format!("corrupt booking row: {msg}"))
}

fn booking_from_row(row: &PgRow) -> CoreResult<Booking> {
    let status_raw: String = row.try_get("status").map_err(CoreError::data_access)?;
    let status = BookingStatus::parse(&status_raw)
        .ok_or_else(|| corrupt(&format!("unknown status {status_raw:?}")))?;

    let seat_values: Vec<i32> = row.try_get("seats").map_err(CoreError::data_access)?;
    let mut seats = Vec::with_capacity(seat_values.len());
    for n in seat_values {
        let n = u32::try_from(n).map_err(|_| corrupt("negative seat number"))?;
        seats.push(SeatNumber::new(n).map_err(|_| corrupt("zero seat number"))?);
    }

    let method_raw: Option<String> = row
        .try_get("payment_method")
        .map_err(CoreError::data_access)?;
    let payment = match method_raw.as_deref() {
        None => None,
        Some("gateway") => Some(PaymentMethod::Gateway),
        Some("manual") => Some(PaymentMethod::Manual),
        Some(other) => return Err(corrupt(&format!("unknown payment method {other:?}"))),
    }
    .map(|method| -> CoreResult<PaymentRecord> {
        Ok(PaymentRecord {
            transaction_id: row
                .try_get("hubtel_transaction_id")
                .map_err(CoreError::data_access)?,
            payment_status: row
                .try_get("payment_status")
                .map_err(CoreError::data_access)?,
            amount_paid_minor: row
                .try_get("amount_paid_minor")
                .map_err(CoreError::data_access)?,
            method,
        })
    })
    .transpose()?;

    Ok(Booking {
        id: row.try_get("id").map_err(CoreError::data_access)?,
        client_reference: row
            .try_get("client_reference")
            .map_err(CoreError::data_access)?,
        passenger: PassengerSnapshot {
            name: row
                .try_get("passenger_name")
                .map_err(CoreError::data_access)?,
            phone: row
                .try_get("passenger_phone")
                .map_err(CoreError::data_access)?,
            emergency_contact: row
                .try_get("emergency_contact")
                .map_err(CoreError::data_access)?,
        },
        journey: JourneyKey {
            route_id: row.try_get("route_id").map_err(CoreError::data_access)?,
            bus_id: row.try_get("bus_id").map_err(CoreError::data_access)?,
            travel_date: row.try_get("travel_date").map_err(CoreError::data_access)?,
        },
        pickup: row.try_get("pickup").map_err(CoreError::data_access)?,
        destination: row.try_get("destination").map_err(CoreError::data_access)?,
        bus_type: row.try_get("bus_type").map_err(CoreError::data_access)?,
        seats,
        total_minor: row.try_get("total_minor").map_err(CoreError::data_access)?,
        referral_id: row.try_get("referral_id").map_err(CoreError::data_access)?,
        status,
        created_at: row.try_get("created_at").map_err(CoreError::data_access)?,
        rejection_reason: row
            .try_get("rejection_reason")
            .map_err(CoreError::data_access)?,
        payment,
    })
}

fn seat_array(seats: &[SeatNumber]) -> Vec<i32> {
    seats.iter().map(|s| s.get() as i32).collect()
}

#[async_trait]
impl BookingStore for PgBookingStore {
    async fn insert_pending(&self, booking: &Booking) -> CoreResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_err("insert_pending_begin"))?;

        // Serialize creators per journey. Under READ COMMITTED two racing
        // inserts would each evaluate NOT EXISTS against a snapshot that
        // cannot see the other's uncommitted row, and with no constraint
        // covering (journey, seat) neither insert blocks the other. The
        // advisory lock makes the check-and-insert mutually exclusive per
        // journey key; it is released at commit or rollback.
        let journey_key = format!(
            "{}:{}:{}",
            booking.journey.bus_id, booking.journey.route_id, booking.journey.travel_date
        );
        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
            .bind(&journey_key)
            .execute(&mut *tx)
            .await
            .map_err(db_err("insert_pending_lock"))?;

        // `&&` is the Postgres array-overlap operator.
        let sql = "INSERT INTO bookings \
             (id, client_reference, passenger_name, passenger_phone, emergency_contact, \
              route_id, bus_id, travel_date, pickup, destination, bus_type, seats, \
              total_minor, referral_id, status, created_at) \
             SELECT $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, 'pending', $15 \
             WHERE NOT EXISTS ( \
                 SELECT 1 FROM bookings \
                 WHERE bus_id = $7 AND route_id = $6 AND travel_date = $8 \
                   AND status IN ('pending', 'approved', 'paid') \
                   AND seats && $12 \
             )";
        let result = sqlx::query(sql)
            .bind(booking.id)
            .bind(&booking.client_reference)
            .bind(&booking.passenger.name)
            .bind(&booking.passenger.phone)
            .bind(&booking.passenger.emergency_contact)
            .bind(booking.journey.route_id)
            .bind(booking.journey.bus_id)
            .bind(booking.journey.travel_date)
            .bind(&booking.pickup)
            .bind(&booking.destination)
            .bind(&booking.bus_type)
            .bind(seat_array(&booking.seats))
            .bind(booking.total_minor)
            .bind(booking.referral_id)
            .bind(booking.created_at)
            .execute(&mut *tx)
            .await
            .map_err(db_err("insert_pending"))?;

        if result.rows_affected() == 0 {
            let wanted: Vec<String> = booking.seats.iter().map(|s| s.to_string()).collect();
            return Err(CoreError::SeatConflict(wanted.join(", ")));
        }
        tx.commit().await.map_err(db_err("insert_pending_commit"))?;
        Ok(())
    }

    async fn find(&self, id: Uuid) -> CoreResult<Option<Booking>> {
        let sql = format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err("find_booking"))?;
        row.as_ref().map(booking_from_row).transpose()
    }

    async fn find_by_client_reference(&self, reference: &str) -> CoreResult<Option<Booking>> {
        let sql = format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE client_reference = $1");
        let row = sqlx::query(&sql)
            .bind(reference)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err("find_by_client_reference"))?;
        row.as_ref().map(booking_from_row).transpose()
    }

    async fn list_by_status(&self, status: BookingStatus) -> CoreResult<Vec<Booking>> {
        let sql = format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE status = $1 ORDER BY created_at DESC"
        );
        let rows = sqlx::query(&sql)
            .bind(status.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(db_err("list_by_status"))?;
        rows.iter().map(booking_from_row).collect()
    }

    async fn list_active_for_journey(&self, journey: &JourneyKey) -> CoreResult<Vec<Booking>> {
        let sql = format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings \
             WHERE bus_id = $1 AND route_id = $2 AND travel_date = $3 \
               AND status IN ('pending', 'approved', 'paid')"
        );
        let rows = sqlx::query(&sql)
            .bind(journey.bus_id)
            .bind(journey.route_id)
            .bind(journey.travel_date)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err("list_active_for_journey"))?;
        rows.iter().map(booking_from_row).collect()
    }

    async fn update_status(
        &self,
        id: Uuid,
        from: &[BookingStatus],
        to: BookingStatus,
        reason: Option<&str>,
    ) -> CoreResult<Option<Booking>> {
        let from_values: Vec<String> = from.iter().map(|s| s.as_str().to_string()).collect();
        let reason = if to == BookingStatus::Rejected {
            reason
        } else {
            None
        };
        let sql = format!(
            "UPDATE bookings SET status = $2, rejection_reason = $4 \
             WHERE id = $1 AND status = ANY($3) \
             RETURNING {BOOKING_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .bind(to.as_str())
            .bind(from_values)
            .bind(reason)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err("update_status"))?;
        row.as_ref().map(booking_from_row).transpose()
    }

    async fn confirm_paid(
        &self,
        client_reference: &str,
        payment: &PaymentRecord,
    ) -> CoreResult<Option<Booking>> {
        let mut tx = self.pool.begin().await.map_err(db_err("confirm_paid_begin"))?;

        let sql = format!(
            "UPDATE bookings SET status = 'paid', hubtel_transaction_id = $2, \
             payment_status = $3, amount_paid_minor = $4, payment_method = $5 \
             WHERE client_reference = $1 AND status = 'pending' \
             RETURNING {BOOKING_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(client_reference)
            .bind(&payment.transaction_id)
            .bind(&payment.payment_status)
            .bind(payment.amount_paid_minor)
            .bind(payment.method.as_str())
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_err("confirm_paid_update"))?;

        let Some(row) = row else {
            // Already finalized, swept, or unknown; nothing to do.
            return Ok(None);
        };
        let booking = booking_from_row(&row)?;

        sqlx::query(
            "INSERT INTO passengers (phone, name, emergency_contact) VALUES ($1, $2, $3) \
             ON CONFLICT (phone) DO UPDATE \
             SET name = EXCLUDED.name, emergency_contact = EXCLUDED.emergency_contact",
        )
        .bind(&booking.passenger.phone)
        .bind(&booking.passenger.name)
        .bind(&booking.passenger.emergency_contact)
        .execute(&mut *tx)
        .await
        .map_err(db_err("confirm_paid_passenger_upsert"))?;

        tx.commit().await.map_err(db_err("confirm_paid_commit"))?;
        Ok(Some(booking))
    }

    async fn sweep_pending_older_than(
        &self,
        cutoff: DateTime<Utc>,
        reason: &str,
    ) -> CoreResult<u64> {
        let result = sqlx::query(
            "UPDATE bookings SET status = 'rejected', rejection_reason = $2 \
             WHERE status = 'pending' AND created_at <= $1",
        )
        .bind(cutoff)
        .bind(reason)
        .execute(&self.pool)
        .await
        .map_err(db_err("sweep_pending"))?;
        Ok(result.rows_affected())
    }

    async fn delete(&self, id: Uuid) -> CoreResult<bool> {
        let result = sqlx::query("DELETE FROM bookings WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err("delete_booking"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_passenger(&self, phone: &str) -> CoreResult<Option<PassengerSnapshot>> {
        let row = sqlx::query("SELECT phone, name, emergency_contact FROM passengers WHERE phone = $1")
            .bind(phone)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err("find_passenger"))?;
        row.map(|r| -> CoreResult<PassengerSnapshot> {
            Ok(PassengerSnapshot {
                name: r.try_get("name").map_err(CoreError::data_access)?,
                phone: r.try_get("phone").map_err(CoreError::data_access)?,
                emergency_contact: r
                    .try_get("emergency_contact")
                    .map_err(CoreError::data_access)?,
            })
        })
        .transpose()
    }

    async fn create_referral(&self, name: &str, phone: &str) -> CoreResult<Referral> {
        let referral = Referral {
            id: Uuid::new_v4(),
            name: name.to_string(),
            phone: phone.to_string(),
        };
        sqlx::query("INSERT INTO referrals (id, name, phone) VALUES ($1, $2, $3)")
            .bind(referral.id)
            .bind(&referral.name)
            .bind(&referral.phone)
            .execute(&self.pool)
            .await
            .map_err(db_err("create_referral"))?;
        Ok(referral)
    }

    async fn find_referral_by_phone(&self, phone: &str) -> CoreResult<Option<Referral>> {
        let row = sqlx::query("SELECT id, name, phone FROM referrals WHERE phone = $1")
            .bind(phone)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err("find_referral_by_phone"))?;
        row.map(|r| -> CoreResult<Referral> {
            Ok(Referral {
                id: r.try_get("id").map_err(CoreError::data_access)?,
                name: r.try_get("name").map_err(CoreError::data_access)?,
                phone: r.try_get("phone").map_err(CoreError::data_access)?,
            })
        })
        .transpose()
    }
}
