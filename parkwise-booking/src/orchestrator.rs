use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use parkwise_catalog::{PricingEngine, Resource, ResourceCatalog};
use parkwise_core::booking::{
    reference_code, Booking, CancellationRecord, PriceBreakdown, PricingTier, TimeWindow,
    VehicleIdentity,
};
use parkwise_core::{
    BookingStatus, BookingStore, PaymentGateway, PaymentRecord, PaymentStatus, ReservationError,
    ReservationResult,
};

use crate::availability::AvailabilityChecker;
use crate::lifecycle::{Actor, BookingLifecycle, LifecycleAction};
use crate::locks::ResourceLocks;
use crate::refund::RefundPolicy;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateBookingRequest {
    pub holder_id: String,
    pub resource_id: Uuid,
    pub window: TimeWindow,
    pub tier: PricingTier,
    /// Raw vehicle identity; normalized (trimmed, upper-cased) here. Blank
    /// input reads as "no vehicle supplied".
    pub vehicle: Option<String>,
    pub discount_code: Option<String>,
}

/// Changes a holder may make to a booking while it is still Pending. Omitted
/// fields keep their current value; the price is recomputed either way.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AmendBookingRequest {
    pub window: Option<TimeWindow>,
    pub tier: Option<PricingTier>,
}

/// The façade the API layer talks to. Composes availability, pricing,
/// lifecycle and refund logic; all durable reads and writes go through the
/// injected store and catalog. Holds no state of its own between calls
/// beyond the per-resource advisory locks.
pub struct ReservationOrchestrator {
    bookings: Arc<dyn BookingStore>,
    catalog: Arc<dyn ResourceCatalog>,
    gateway: Arc<dyn PaymentGateway>,
    availability: AvailabilityChecker,
    pricing: PricingEngine,
    refunds: RefundPolicy,
    lifecycle: BookingLifecycle,
    locks: ResourceLocks,
}

impl ReservationOrchestrator {
    pub fn new(
        bookings: Arc<dyn BookingStore>,
        catalog: Arc<dyn ResourceCatalog>,
        gateway: Arc<dyn PaymentGateway>,
        pricing: PricingEngine,
        refunds: RefundPolicy,
        lifecycle: BookingLifecycle,
    ) -> Self {
        let availability = AvailabilityChecker::new(bookings.clone());
        Self {
            bookings,
            catalog,
            gateway,
            availability,
            pricing,
            refunds,
            lifecycle,
            locks: ResourceLocks::new(),
        }
    }

    /// Non-binding price preview. Identical inputs always produce the same
    /// breakdown as the one frozen onto a booking at creation.
    pub async fn quote(
        &self,
        resource_id: Uuid,
        window: TimeWindow,
        tier: PricingTier,
        discount_code: Option<&str>,
    ) -> ReservationResult<PriceBreakdown> {
        validate_window(&window, None)?;
        let resource = self.load_resource(resource_id).await?;
        Ok(self.pricing.quote(&resource, &window, tier, discount_code))
    }

    pub async fn create(&self, req: CreateBookingRequest) -> ReservationResult<Booking> {
        let now = Utc::now();
        validate_window(&req.window, Some(now))?;

        let resource = self.load_resource(req.resource_id).await?;
        if !resource.is_active {
            return Err(ReservationError::ResourceInactive(resource.id));
        }
        let vehicle = req.vehicle.as_deref().and_then(VehicleIdentity::parse);

        // Hold the resource's advisory lock across check + insert so two
        // concurrent creates on overlapping windows cannot both see a free
        // spot.
        let _guard = self.locks.acquire(resource.id).await;

        let capacity = self
            .availability
            .check_capacity(&resource, &req.window, None)
            .await?;
        if !capacity.granted {
            return Err(ReservationError::CapacityExceeded {
                resource_id: resource.id,
                active: capacity.active_count,
                total: resource.total_spots,
            });
        }

        if let Some(reference) = self
            .availability
            .find_duplicate_holder_booking(&req.holder_id, resource.id, &req.window, None)
            .await?
        {
            return Err(ReservationError::DuplicateHolderBooking { reference });
        }

        if let Some(v) = &vehicle {
            if let Some(reference) = self
                .availability
                .find_vehicle_conflict(v, &req.window, None)
                .await?
            {
                return Err(ReservationError::VehicleConflict {
                    vehicle: v.to_string(),
                    reference,
                });
            }
        }

        let price = self
            .pricing
            .quote(&resource, &req.window, req.tier, req.discount_code.as_deref());
        let mut booking = Booking::new(
            resource.id,
            req.holder_id,
            req.window,
            req.tier,
            vehicle,
            req.discount_code,
            price,
        );

        // The store rejects duplicate reference codes; regenerate and retry
        // a couple of times before giving up.
        let mut attempts = 0;
        loop {
            match self.bookings.insert(&booking).await {
                Ok(()) => break,
                Err(err) if attempts < 2 => {
                    warn!(reference = %booking.reference, error = %err, "insert retry");
                    booking.reference = reference_code(now);
                    attempts += 1;
                }
                Err(err) => return Err(err.into()),
            }
        }

        info!(
            booking_id = %booking.id,
            reference = %booking.reference,
            resource_id = %resource.id,
            total_minor = booking.price.total_minor,
            "booking created"
        );
        Ok(booking)
    }

    /// Amend a Pending booking's window and/or tier; availability is
    /// re-checked with the booking itself excluded and the price recomputed
    /// with its original discount code.
    pub async fn amend(
        &self,
        booking_id: Uuid,
        holder_id: &str,
        req: AmendBookingRequest,
    ) -> ReservationResult<Booking> {
        let now = Utc::now();
        let (mut booking, resource) = self.load_booking_and_resource(booking_id).await?;

        if booking.status != BookingStatus::Pending {
            return Err(ReservationError::InvalidStateTransition {
                from: booking.status,
                action: "amend".to_string(),
            });
        }
        if booking.holder_id != holder_id {
            return Err(ReservationError::Unauthorized {
                actor: holder_id.to_string(),
                action: "amend".to_string(),
            });
        }

        let window = req.window.unwrap_or(booking.window);
        let tier = req.tier.unwrap_or(booking.tier);
        validate_window(&window, Some(now))?;

        let _guard = self.locks.acquire(resource.id).await;

        let capacity = self
            .availability
            .check_capacity(&resource, &window, Some(booking.id))
            .await?;
        if !capacity.granted {
            return Err(ReservationError::CapacityExceeded {
                resource_id: resource.id,
                active: capacity.active_count,
                total: resource.total_spots,
            });
        }
        if let Some(reference) = self
            .availability
            .find_duplicate_holder_booking(holder_id, resource.id, &window, Some(booking.id))
            .await?
        {
            return Err(ReservationError::DuplicateHolderBooking { reference });
        }
        if let Some(v) = &booking.vehicle {
            if let Some(reference) = self
                .availability
                .find_vehicle_conflict(v, &window, Some(booking.id))
                .await?
            {
                return Err(ReservationError::VehicleConflict {
                    vehicle: v.to_string(),
                    reference,
                });
            }
        }

        booking.window = window;
        booking.tier = tier;
        booking.price =
            self.pricing
                .quote(&resource, &window, tier, booking.discount_code.as_deref());
        booking.updated_at = now;
        self.bookings.update(&booking).await?;

        info!(booking_id = %booking.id, total_minor = booking.price.total_minor, "booking amended");
        Ok(booking)
    }

    pub async fn cancel(
        &self,
        booking_id: Uuid,
        actor_id: &str,
        reason: &str,
    ) -> ReservationResult<Booking> {
        let now = Utc::now();
        let (mut booking, resource) = self.load_booking_and_resource(booking_id).await?;

        self.lifecycle.apply(
            &mut booking,
            LifecycleAction::Cancel,
            &Actor::User(actor_id.to_string()),
            &resource.owner_id,
            now,
        )?;

        let hours_until_start =
            (booking.window.starts_at - now).num_seconds() as f64 / 3600.0;
        let refund_minor = self.refunds.compute_refund(
            booking.price.total_minor,
            booking.payment_completed(),
            hours_until_start,
        );
        booking.cancellation = Some(CancellationRecord {
            reason: reason.to_string(),
            cancelled_at: now,
            refund_minor,
        });
        self.bookings.update(&booking).await?;

        info!(booking_id = %booking.id, refund_minor, "booking cancelled");
        Ok(booking)
    }

    pub async fn approve(&self, booking_id: Uuid, vendor_id: &str) -> ReservationResult<Booking> {
        self.transition_by_user(booking_id, vendor_id, LifecycleAction::Approve)
            .await
    }

    pub async fn reject(
        &self,
        booking_id: Uuid,
        vendor_id: &str,
        reason: Option<&str>,
    ) -> ReservationResult<Booking> {
        let (mut booking, resource) = self.load_booking_and_resource(booking_id).await?;
        self.lifecycle.apply(
            &mut booking,
            LifecycleAction::Reject,
            &Actor::User(vendor_id.to_string()),
            &resource.owner_id,
            Utc::now(),
        )?;
        booking.rejection_reason = reason.map(str::to_string);
        self.bookings.update(&booking).await?;
        Ok(booking)
    }

    /// Payment-collaborator callback on success. Records a completed payment
    /// if the gateway never went through `process_payment`.
    pub async fn confirm_payment(&self, booking_id: Uuid) -> ReservationResult<Booking> {
        let now = Utc::now();
        let (mut booking, resource) = self.load_booking_and_resource(booking_id).await?;
        self.lifecycle.apply(
            &mut booking,
            LifecycleAction::ConfirmPayment,
            &Actor::System,
            &resource.owner_id,
            now,
        )?;
        if !booking.payment_completed() {
            booking.payment = Some(PaymentRecord {
                status: PaymentStatus::Succeeded,
                transaction_id: None,
                processed_at: now,
            });
        }
        self.bookings.update(&booking).await?;
        Ok(booking)
    }

    /// Drive the gateway for an AwaitingPayment booking. A failed charge is
    /// recorded on the booking without a status change, leaving it eligible
    /// for retry or cancellation.
    pub async fn process_payment(&self, booking_id: Uuid) -> ReservationResult<Booking> {
        let (mut booking, resource) = self.load_booking_and_resource(booking_id).await?;
        if booking.status != BookingStatus::AwaitingPayment {
            return Err(ReservationError::InvalidStateTransition {
                from: booking.status,
                action: "process payment".to_string(),
            });
        }

        let record = self
            .gateway
            .charge(booking.id, booking.price.total_minor)
            .await?;
        let succeeded = record.is_completed();
        booking.payment = Some(record);

        if succeeded {
            self.lifecycle.apply(
                &mut booking,
                LifecycleAction::ConfirmPayment,
                &Actor::System,
                &resource.owner_id,
                Utc::now(),
            )?;
        } else {
            warn!(booking_id = %booking.id, "charge failed, booking stays awaiting payment");
        }
        self.bookings.update(&booking).await?;
        Ok(booking)
    }

    pub async fn check_in(&self, booking_id: Uuid, holder_id: &str) -> ReservationResult<Booking> {
        self.transition_by_user(booking_id, holder_id, LifecycleAction::CheckIn)
            .await
    }

    pub async fn check_out(&self, booking_id: Uuid, holder_id: &str) -> ReservationResult<Booking> {
        self.transition_by_user(booking_id, holder_id, LifecycleAction::CheckOut)
            .await
    }

    /// System transition driven by an external expiry sweeper.
    pub async fn expire(&self, booking_id: Uuid) -> ReservationResult<Booking> {
        let (mut booking, resource) = self.load_booking_and_resource(booking_id).await?;
        self.lifecycle.apply(
            &mut booking,
            LifecycleAction::Expire,
            &Actor::System,
            &resource.owner_id,
            Utc::now(),
        )?;
        self.bookings.update(&booking).await?;
        Ok(booking)
    }

    async fn transition_by_user(
        &self,
        booking_id: Uuid,
        actor_id: &str,
        action: LifecycleAction,
    ) -> ReservationResult<Booking> {
        let (mut booking, resource) = self.load_booking_and_resource(booking_id).await?;
        self.lifecycle.apply(
            &mut booking,
            action,
            &Actor::User(actor_id.to_string()),
            &resource.owner_id,
            Utc::now(),
        )?;
        self.bookings.update(&booking).await?;
        Ok(booking)
    }

    async fn load_resource(&self, resource_id: Uuid) -> ReservationResult<Resource> {
        self.catalog
            .get_resource(resource_id)
            .await?
            .ok_or(ReservationError::ResourceNotFound(resource_id))
    }

    async fn load_booking_and_resource(
        &self,
        booking_id: Uuid,
    ) -> ReservationResult<(Booking, Resource)> {
        let booking = self
            .bookings
            .get(booking_id)
            .await?
            .ok_or_else(|| ReservationError::NotFound(booking_id.to_string()))?;
        let resource = self.load_resource(booking.resource_id).await?;
        Ok((booking, resource))
    }
}

fn validate_window(
    window: &TimeWindow,
    not_before: Option<DateTime<Utc>>,
) -> ReservationResult<()> {
    if !window.is_well_formed() {
        return Err(ReservationError::InvalidWindow(
            "start must be strictly before end".to_string(),
        ));
    }
    if let Some(now) = not_before {
        if window.starts_at < now {
            return Err(ReservationError::InvalidWindow(
                "start must not be in the past".to_string(),
            ));
        }
    }
    Ok(())
}
