//! I2C registers.

use super::{RORegister, RWRegister, WORegister};

/// I2C registers.
#[repr(C)]
pub struct RegisterBlock {
    /// Control Register
    pub CTRL: RWRegister<u32>,
    /// Command Register
    pub CMD: WORegister<u32>,
    /// State Register
    pub STATE: RORegister<u32>,
    /// Status Register
    pub STATUS: RORegister<u32>,
    /// Clock Division Register
    pub CLKDIV: RWRegister<u32>,
    /// Slave Address Register
    pub SADDR: RWRegister<u32>,
    /// Slave Address Mask Register
    pub SADDRMASK: RWRegister<u32>,
    /// Receive Buffer Data Register
    pub RXDATA: RORegister<u32>,
    /// Receive Buffer Double Data Register
    pub RXDOUBLE: RORegister<u32>,
    /// Receive Buffer Data Peek Register
    pub RXDATAP: RORegister<u32>,
    /// Receive Buffer Double Data Peek Register
    pub RXDOUBLEP: RORegister<u32>,
    /// Transmit Buffer Data Register
    pub TXDATA: WORegister<u32>,
    /// Transmit Buffer Double Data Register
    pub TXDOUBLE: WORegister<u32>,
    /// Interrupt Flag Register
    pub IF: RORegister<u32>,
    /// Interrupt Flag Set Register
    pub IFS: WORegister<u32>,
    /// Interrupt Flag Clear Register
    pub IFC: WORegister<u32>,
    /// Interrupt Enable Register
    pub IEN: RWRegister<u32>,
}

const _: () = assert!(core::mem::offset_of!(RegisterBlock, TXDATA) == 0x02C);
const _: () = assert!(core::mem::offset_of!(RegisterBlock, IEN) == 0x040);

pub mod CTRL {
    field!(EN, 0, 1);
    field!(SLAVE, 1, 1);
    field!(AUTOACK, 2, 1);
}

pub mod CMD {
    field!(START, 0, 1);
    field!(STOP, 1, 1);
    field!(ACK, 2, 1);
    field!(NACK, 3, 1);
    field!(CONT, 4, 1);
    field!(ABORT, 5, 1);
    field!(CLEARTX, 6, 1);
    field!(CLEARPC, 7, 1);
}

pub mod SADDR {
    field!(ADDR, 1, 7);
}

pub mod SADDRMASK {
    field!(MASK, 1, 7);
}

/// Interrupt flag bits. Shared by `IF`, `IFS`, `IFC` and `IEN`.
pub mod IF {
    field!(ADDR, 2, 1);
    field!(RXDATAV, 5, 1);
    field!(ACK, 6, 1);
    field!(NACK, 7, 1);
    field!(ARBLOST, 9, 1);
    field!(BUSERR, 10, 1);
    field!(SSTOP, 16, 1);
}

pub use IF as IFC;
pub use IF as IEN;
