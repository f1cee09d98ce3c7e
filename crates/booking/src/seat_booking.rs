//! Seat booking saga constants.

/// The saga type identifier for seat bookings.
pub const SAGA_TYPE: &str = "SeatBooking";

/// Step name: Persist a pending reservation.
pub const STEP_CREATE_RESERVATION: &str = "create_reservation";

/// Step name: Atomically take seats from the event inventory.
pub const STEP_RESERVE_INVENTORY: &str = "reserve_inventory";

/// Step name: Capture payment for the seats.
pub const STEP_CAPTURE_PAYMENT: &str = "capture_payment";

/// Step name: Mark the reservation as confirmed.
pub const STEP_CONFIRM_RESERVATION: &str = "confirm_reservation";

/// Compensation: Return reserved seats to the event.
pub const COMPENSATE_RELEASE_INVENTORY: &str = "release_inventory";

/// Compensation: Mark the reservation as cancelled.
pub const COMPENSATE_CANCEL_RESERVATION: &str = "cancel_reservation";
