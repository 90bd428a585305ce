//! A RAL-like module to support DMA register access
//!
//! There's no RAL for these parts that we'd like to depend on, and the
//! vendor headers describe descriptors as anonymous bitfields. This module
//! spells out the register blocks and fields we need as `#[repr(C)]`
//! structs plus field modules, so that we can keep using the RAL macros.

#![allow(
    non_snake_case,         // Compatibility with RAL
    non_upper_case_globals, // Field modules use `offset` and `mask`
    unused,                 // Prototyping convenience
)]

/// Defines a register field for use with the RAL macros.
///
/// `field!(NAME, offset, width)` creates a module `NAME` with `offset`,
/// `mask`, and the empty `R` / `W` / `RW` value modules the macros import.
/// Trailing `VALUE = n` pairs become named values in `RW`.
macro_rules! field {
    ($name:ident, $offset:expr, $width:expr $(, $value:ident = $raw:expr)* $(,)?) => {
        pub mod $name {
            pub const offset: u32 = $offset;
            pub const mask: u32 = (((1u64 << $width) - 1) as u32) << offset;
            pub mod R {}
            pub mod W {}
            pub mod RW {
                $(pub const $value: u32 = $raw;)*
            }
        }
    };
}

pub mod descriptor;
pub mod i2c;
pub mod ldma;
pub mod msc;
pub mod udma;

pub use ral_registers::{modify_reg, read_reg, write_reg};
use ral_registers::{RORegister, RWRegister, WORegister};

cfg_if::cfg_if! {
    if #[cfg(feature = "ldma")] {
        /// The DMA controller register block for this build.
        pub(crate) type Controller = ldma::RegisterBlock;
    } else {
        /// The DMA controller register block for this build.
        pub(crate) type Controller = udma::RegisterBlock;
    }
}

//
// Helper types for static memory
//
// Similar to the RAL's `Instance` type, but more copy.
//

pub(crate) struct Static<T>(pub(crate) *const T);
impl<T> core::ops::Deref for Static<T> {
    type Target = T;
    fn deref(&self) -> &Self::Target {
        // Safety: pointer points to static memory (peripheral memory, or
        // a control block that lives for the whole program)
        unsafe { &*self.0 }
    }
}
impl<T> Clone for Static<T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<T> Copy for Static<T> {}
