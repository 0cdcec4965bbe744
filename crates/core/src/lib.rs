//! Madrigal core: the device-facing engine of a control panel for the
//! Apogee Quartet USB audio interface.
//!
//! Everything in here is platform-agnostic. The USB transport itself is a
//! trait; the `rusb`-backed implementation lives in `madrigal-infra`.

pub mod domain;
