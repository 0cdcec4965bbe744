//! Infrastructure layer: USB transports for Madrigal

pub mod usb;
