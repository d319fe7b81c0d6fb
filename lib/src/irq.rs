//! Interrupt-vector seam.
//!
//! The IDT itself belongs to the boot crate's table collaborator; drivers
//! that need to borrow a vector temporarily (timer calibration, timed waits)
//! go through a registered swap function instead of touching IDT memory.
//! [`ScopedVector`] restores the previous handler on every exit path.

use core::sync::atomic::{AtomicPtr, Ordering};

use crate::klog_warn;

/// Raw interrupt handler as installed behind an IDT stub.
pub type IrqHandler = extern "C" fn();

/// Swap the handler for `vector`, returning the previous one. `None`
/// uninstalls the handler and leaves the stub pointing at a no-op.
pub type SwapGateFn = fn(u8, Option<IrqHandler>) -> Option<IrqHandler>;

static SWAP_GATE: AtomicPtr<()> = AtomicPtr::new(core::ptr::null_mut());

/// Register the IDT's gate-swap function. Called once by the table
/// collaborator before any driver needs a vector.
pub fn register_swap_gate(f: SwapGateFn) {
    SWAP_GATE.store(f as *mut (), Ordering::Release);
}

/// Swap the handler bound to `vector`, returning the previous binding.
pub fn swap_gate(vector: u8, handler: Option<IrqHandler>) -> Option<IrqHandler> {
    let ptr = SWAP_GATE.load(Ordering::Acquire);
    if ptr.is_null() {
        klog_warn!("IRQ: no gate-swap function registered, vector 0x{:x} unchanged", vector);
        return None;
    }
    // SAFETY: only `register_swap_gate` stores into SWAP_GATE, and it stores
    // a valid `SwapGateFn`.
    let swap: SwapGateFn = unsafe { core::mem::transmute(ptr) };
    swap(vector, handler)
}

/// Scoped ownership of one interrupt vector.
///
/// Installs `handler` on construction and puts the previous handler back
/// when dropped, including on early-return paths.
pub struct ScopedVector {
    vector: u8,
    previous: Option<IrqHandler>,
}

impl ScopedVector {
    pub fn install(vector: u8, handler: IrqHandler) -> Self {
        let previous = swap_gate(vector, Some(handler));
        Self { vector, previous }
    }
}

impl Drop for ScopedVector {
    fn drop(&mut self) {
        swap_gate(self.vector, self.previous);
    }
}
