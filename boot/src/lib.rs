//! Boot orchestration for the Helios loader: the bootstrap-core and
//! additional-core phase sequences, the multi-core rendezvous, and the
//! function-pointer seams to the collaborators outside this workspace.

#![no_std]

pub mod orchestrator;
pub mod services;
pub mod smp;

pub use orchestrator::{fatal, run_ap, run_bsp};
pub use services::LoaderServices;
