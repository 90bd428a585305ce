//! An I2C follower that serves a register file
//!
//! A bus leader addresses us, writes a target index, then either writes
//! bytes starting at that index, or restarts and reads bytes from it. The
//! index auto-increments.
//!
//! [`RegisterFile`] is the protocol state machine. It doesn't touch
//! hardware, so you can drive it from any I2C peripheral. [`Follower`]
//! drives it from the I2C interrupt flags.
//!
//! ```no_run
//! use efm32_dma::i2c::{Follower, RegisterFile};
//! # const I2C0: *const () = 0x4000_A000 as _;
//!
//! let mut follower = unsafe { Follower::new(I2C0, RegisterFile::new([0u8; 10])) };
//! follower.init(0x71);
//! // From the I2C0 interrupt handler:
//! follower.on_interrupt();
//! ```

use crate::ral::{self, i2c, Static};

/// Byte returned when the leader reads past the end of the file.
pub const IDLE_BYTE: u8 = 0xFF;

/// Something that happened on the bus.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    /// The leader addressed us. `read` is the direction bit.
    Address { read: bool },
    /// The leader wrote a byte.
    Data(u8),
    /// The leader acknowledged the byte we sent, and wants another.
    LeaderAck,
    /// Stop condition.
    Stop,
    /// Bus error or lost arbitration.
    Fault,
}

/// What to tell the leader.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    Ack,
    Nack,
}

/// The follower's response to an [`Event`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Reply {
    /// Acknowledge, or not, the address or byte.
    pub command: Option<Command>,
    /// The next byte to send to the leader.
    pub transmit: Option<u8>,
}

impl Reply {
    const NONE: Reply = Reply {
        command: None,
        transmit: None,
    };
    const ACK: Reply = Reply {
        command: Some(Command::Ack),
        transmit: None,
    };
    const NACK: Reply = Reply {
        command: Some(Command::Nack),
        transmit: None,
    };
}

/// A buffer of `N` bytes, served with target-index addressing.
#[derive(Debug)]
pub struct RegisterFile<const N: usize> {
    buffer: [u8; N],
    index: usize,
    have_index: bool,
    busy: bool,
}

impl<const N: usize> RegisterFile<N> {
    /// Serve `buffer`. The index starts at zero.
    pub const fn new(buffer: [u8; N]) -> Self {
        RegisterFile {
            buffer,
            index: 0,
            have_index: false,
            busy: false,
        }
    }

    /// The current index.
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Returns `true` between an address match and a stop.
    pub const fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.buffer
    }

    /// Advance the state machine.
    pub fn handle(&mut self, event: Event) -> Reply {
        match event {
            Event::Address { read } => {
                self.busy = true;
                if read {
                    Reply {
                        command: Some(Command::Ack),
                        transmit: Some(self.next_byte()),
                    }
                } else {
                    self.have_index = false;
                    Reply::ACK
                }
            }
            Event::Data(byte) if !self.have_index => {
                if (byte as usize) < N {
                    self.index = byte as usize;
                    self.have_index = true;
                    Reply::ACK
                } else {
                    Reply::NACK
                }
            }
            Event::Data(byte) => match self.buffer.get_mut(self.index) {
                Some(slot) => {
                    *slot = byte;
                    self.index += 1;
                    Reply::ACK
                }
                None => Reply::NACK,
            },
            Event::LeaderAck => Reply {
                command: None,
                transmit: Some(self.next_byte()),
            },
            Event::Stop | Event::Fault => {
                self.busy = false;
                self.have_index = false;
                Reply::NONE
            }
        }
    }

    fn next_byte(&mut self) -> u8 {
        match self.buffer.get(self.index) {
            Some(&byte) => {
                self.index += 1;
                byte
            }
            None => IDLE_BYTE,
        }
    }
}

/// Interrupt flags the follower handles.
const INTERRUPTS: u32 = i2c::IF::ADDR::mask
    | i2c::IF::RXDATAV::mask
    | i2c::IF::ACK::mask
    | i2c::IF::SSTOP::mask
    | i2c::IF::BUSERR::mask
    | i2c::IF::ARBLOST::mask;

/// An I2C peripheral serving a [`RegisterFile`].
pub struct Follower<const N: usize> {
    registers: Static<i2c::RegisterBlock>,
    file: RegisterFile<N>,
}

impl<const N: usize> Follower<N> {
    /// Create the follower.
    ///
    /// # Safety
    ///
    /// `registers` must point at an I2C register block, and there may only
    /// be one driver for that peripheral.
    pub const unsafe fn new(registers: *const (), file: RegisterFile<N>) -> Self {
        Follower {
            registers: Static(registers.cast()),
            file,
        }
    }

    /// Respond to the 7-bit `address`, and enable the peripheral.
    ///
    /// The I2C clock and pins must already be configured. You still need to
    /// unmask the I2C interrupt in the NVIC.
    pub fn init(&mut self, address: u8) {
        let regs = &self.registers;
        ral::write_reg!(i2c, regs, SADDR, ADDR: address as u32);
        // Match the exact address.
        ral::write_reg!(i2c, regs, SADDRMASK, MASK: 0x7F);
        regs.IFC.write(u32::MAX);
        regs.IEN.write(INTERRUPTS);
        ral::write_reg!(i2c, regs, CTRL, EN: 1, SLAVE: 1);
    }

    pub fn file(&self) -> &RegisterFile<N> {
        &self.file
    }

    pub fn file_mut(&mut self) -> &mut RegisterFile<N> {
        &mut self.file
    }

    /// Handle the I2C interrupt.
    pub fn on_interrupt(&mut self) {
        let pending = self.registers.IF.read();

        if pending & (i2c::IF::BUSERR::mask | i2c::IF::ARBLOST::mask) != 0 {
            #[cfg(feature = "defmt")]
            defmt::warn!("I2C fault {=u32:#X}", pending);
            self.file.handle(Event::Fault);
            self.registers.IFC.write(pending & INTERRUPTS);
            return;
        }

        if pending & i2c::IF::ADDR::mask != 0 {
            let read = self.registers.RXDATA.read() & 1 != 0;
            self.respond(Event::Address { read });
            self.registers
                .IFC
                .write(i2c::IF::ADDR::mask | i2c::IF::RXDATAV::mask);
        } else if pending & i2c::IF::RXDATAV::mask != 0 {
            let byte = self.registers.RXDATA.read() as u8;
            self.respond(Event::Data(byte));
            self.registers.IFC.write(i2c::IF::RXDATAV::mask);
        }

        if pending & i2c::IF::ACK::mask != 0 {
            self.respond(Event::LeaderAck);
            self.registers.IFC.write(i2c::IF::ACK::mask);
        }

        if pending & i2c::IF::SSTOP::mask != 0 {
            self.file.handle(Event::Stop);
            self.registers.IFC.write(i2c::IF::SSTOP::mask);
        }
    }

    fn respond(&mut self, event: Event) {
        let reply = self.file.handle(event);
        match reply.command {
            Some(Command::Ack) => ral::write_reg!(i2c, self.registers, CMD, ACK: 1),
            Some(Command::Nack) => ral::write_reg!(i2c, self.registers, CMD, NACK: 1),
            None => {}
        }
        if let Some(byte) = reply.transmit {
            self.registers.TXDATA.write(byte as u32);
        }
    }
}
