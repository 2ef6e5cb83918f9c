/*
SPDX-FileCopyrightText: Copyright 2026 IFPE
SPDX-License-Identifier: MIT
*/

//! Semaforo – peak-aware traffic-signal controller
//!
//! Module layout:
//!
//! ```text
//! lib.rs
//! ├── config/     – site description: topics, lamp wiring
//! ├── window      – time-of-day values + peak-window membership
//! ├── timing      – live timing record + shared store
//! ├── signal      – phases, lamp boundary, published events
//! ├── clock       – wall-clock trait + bootstrap sync gate
//! ├── ingress     – inbound config messages → store updates
//! └── scheduler/  – the Green/Amber/Red control loop
//! ```

pub mod clock;
pub mod config;
pub mod ingress;
pub mod scheduler;
pub mod signal;
pub mod timing;
pub mod window;
