// ============================================================================
// Domain Layer - Business Logic
// ============================================================================
//
// Cancellation cascade and stock reconciliation for sales orders. Reads and
// writes go through the ports in `crate::gateway`; nothing here talks to a
// database or broker directly.
//
// ============================================================================

pub mod cancels;
