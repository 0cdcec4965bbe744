//! USB transport implementations
//!
//! Two transports back the [`UsbTransport`] trait from the core crate:
//! - [`RusbTransport`] talks to real hardware over vendor control transfers
//! - [`OfflineTransport`] simulates a device in memory for use without one
//!
//! [`UsbTransport`]: madrigal_core::domain::device::UsbTransport

pub mod offline;
pub mod rusb_backend;

pub use offline::OfflineTransport;
pub use rusb_backend::RusbTransport;
