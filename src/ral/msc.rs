//! Memory System Controller registers.

use super::{RORegister, RWRegister, WORegister};

/// MSC registers.
#[repr(C)]
pub struct RegisterBlock {
    /// Memory System Control Register
    pub CTRL: RWRegister<u32>,
    /// Read Control Register
    pub READCTRL: RWRegister<u32>,
    /// Write Control Register
    pub WRITECTRL: RWRegister<u32>,
    /// Write Command Register
    pub WRITECMD: WORegister<u32>,
    /// Page Erase/Write Address Buffer
    pub ADDRB: RWRegister<u32>,
    _reserved0: [u32; 1],
    /// Write Data Register
    pub WDATA: RWRegister<u32>,
    /// Status Register
    pub STATUS: RORegister<u32>,
    _reserved1: [u32; 3],
    /// Interrupt Flag Register
    pub IF: RORegister<u32>,
    /// Interrupt Flag Set Register
    pub IFS: WORegister<u32>,
    /// Interrupt Flag Clear Register
    pub IFC: WORegister<u32>,
    /// Interrupt Enable Register
    pub IEN: RWRegister<u32>,
    /// Configuration Lock Register
    pub LOCK: RWRegister<u32>,
}

const _: () = assert!(core::mem::offset_of!(RegisterBlock, STATUS) == 0x01C);
const _: () = assert!(core::mem::offset_of!(RegisterBlock, LOCK) == 0x03C);

pub mod WRITECTRL {
    field!(WREN, 0, 1);
    field!(IRQERASEABORT, 1, 1);
}

pub mod WRITECMD {
    field!(LADDRIM, 0, 1);
    field!(ERASEPAGE, 1, 1);
    field!(WRITEEND, 2, 1);
    field!(WRITEONCE, 3, 1);
    field!(WRITETRIG, 4, 1);
    field!(ERASEABORT, 5, 1);
}

pub mod STATUS {
    field!(BUSY, 0, 1);
    field!(LOCKED, 1, 1);
    field!(INVADDR, 2, 1);
    field!(WDATAREADY, 3, 1);
    field!(WORDTIMEOUT, 4, 1);
    field!(ERASEABORTED, 5, 1);
}

pub mod LOCK {
    field!(LOCKKEY, 0, 16, LOCK = 0, UNLOCK = 0x1B71);
}
