//! uDMA (PL230) controller registers, as found on Series 0 parts.
//!
//! Most channel state is spread across set / clear register pairs. Reading
//! the "set" register returns the state; writing a channel bit to the "clear"
//! register resets it.

use super::{RORegister, RWRegister, WORegister};

/// uDMA registers.
#[repr(C)]
pub struct RegisterBlock {
    /// DMA Status Registers
    pub STATUS: RORegister<u32>,
    /// DMA Configuration Register
    pub CONFIG: WORegister<u32>,
    /// Channel Control Data Base Pointer Register
    pub CTRLBASE: RWRegister<u32>,
    /// Channel Alternate Control Data Base Pointer Register
    pub ALTCTRLBASE: RORegister<u32>,
    /// Channel Wait on Request Status Register
    pub CHWAITSTATUS: RORegister<u32>,
    /// Channel Software Request Register
    pub CHSWREQ: WORegister<u32>,
    /// Channel Useburst Set Register
    pub CHUSEBURSTS: RWRegister<u32>,
    /// Channel Useburst Clear Register
    pub CHUSEBURSTC: WORegister<u32>,
    /// Channel Request Mask Set Register
    pub CHREQMASKS: RWRegister<u32>,
    /// Channel Request Mask Clear Register
    pub CHREQMASKC: WORegister<u32>,
    /// Channel Enable Set Register
    pub CHENS: RWRegister<u32>,
    /// Channel Enable Clear Register
    pub CHENC: WORegister<u32>,
    /// Channel Alternate Set Register
    pub CHALTS: RWRegister<u32>,
    /// Channel Alternate Clear Register
    pub CHALTC: WORegister<u32>,
    /// Channel Priority Set Register
    pub CHPRIS: RWRegister<u32>,
    /// Channel Priority Clear Register
    pub CHPRIC: WORegister<u32>,
    _reserved0: [u32; 3],
    /// Bus Error Clear Register
    pub ERRORC: RWRegister<u32>,
    _reserved1: [u32; 880],
    /// Channel Request Status
    pub CHREQSTATUS: RORegister<u32>,
    _reserved2: [u32; 1],
    /// Channel Single Request Status
    pub CHSREQSTATUS: RORegister<u32>,
    _reserved3: [u32; 121],
    /// Interrupt Flag Register
    pub IF: RORegister<u32>,
    /// Interrupt Flag Set Register
    pub IFS: WORegister<u32>,
    /// Interrupt Flag Clear Register
    pub IFC: WORegister<u32>,
    /// Interrupt Enable register
    pub IEN: RWRegister<u32>,
    /// DMA Control Register
    pub CTRL: RWRegister<u32>,
    /// DMA Retain Descriptor State
    pub RDS: RWRegister<u32>,
    _reserved4: [u32; 2],
    /// Channel 0 Loop Register
    pub LOOP0: RWRegister<u32>,
    /// Channel 1 Loop Register
    pub LOOP1: RWRegister<u32>,
    _reserved5: [u32; 14],
    /// Channel 0 Rectangle Register
    pub RECT0: RWRegister<u32>,
    _reserved6: [u32; 39],
    /// Channel Control Registers
    pub CH: [ChannelRegisters; CHANNELS],
}

/// The most channels a uDMA controller implements.
pub const CHANNELS: usize = 12;

/// Per-channel signal selection.
#[repr(C)]
pub struct ChannelRegisters {
    /// Channel Control Register
    pub CTRL: RWRegister<u32>,
}

// Did I calculate my reservations correctly?
const _: () = assert!(core::mem::offset_of!(RegisterBlock, ERRORC) == 0x04C);
const _: () = assert!(core::mem::offset_of!(RegisterBlock, CHREQSTATUS) == 0xE10);
const _: () = assert!(core::mem::offset_of!(RegisterBlock, IF) == 0x1000);
const _: () = assert!(core::mem::offset_of!(RegisterBlock, LOOP0) == 0x1020);
const _: () = assert!(core::mem::offset_of!(RegisterBlock, RECT0) == 0x1060);
const _: () = assert!(core::mem::offset_of!(RegisterBlock, CH) == 0x1100);

pub mod CONFIG {
    field!(EN, 0, 1);
    field!(CHPROT, 5, 1);
}

pub mod ERRORC {
    field!(ERRORC, 0, 1);
}

pub mod IF {
    field!(DONE, 0, 12);
    field!(ERR, 31, 1);
}

pub mod IEN {
    field!(DONE, 0, 12);
    field!(ERR, 31, 1);
}

pub mod LOOP0 {
    field!(WIDTH, 0, 10);
    field!(EN, 16, 1);
}

pub mod LOOP1 {
    field!(WIDTH, 0, 10);
    field!(EN, 16, 1);
}

/// Channel control register fields.
///
/// `SOURCESEL` and `SIGSEL` are packed the same way as the vendor's
/// `DMAREQ_*` constants, so a full request value is written as-is.
pub mod CTRL {
    field!(SIGSEL, 0, 4);
    field!(SOURCESEL, 16, 6);
}
