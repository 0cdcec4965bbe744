//! Integration tests for the Madrigal workspace

#[cfg(test)]
mod mixer_integration;
