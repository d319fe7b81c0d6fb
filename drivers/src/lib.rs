//! Hardware drivers for the Helios loader: the local APIC (the only
//! interrupt controller this crate programs — each core touches its own
//! window exclusively) and the 8254 PIT used as the calibration reference.

#![no_std]

pub mod apic;
pub mod pit;
