//! Formal verification specifications and test harnesses for the OCPP-J
//! Central System runtime.
//!
//! This crate models the per-session call-correlation discipline implemented
//! by `ocpp-central`'s router and correlation engine — the `call_lock` and
//! Pending-Call Table that together guarantee at most one outbound
//! server-initiated `Call` is in flight per session, and that the table is
//! empty once a session disconnects — and exercises it exhaustively with
//! [`stateright`].

pub mod call_model;
