//! Command frames for XY Screens projector screens and lifts.
//!
//! Every command is a short fixed frame:
//!
//! ```text
//! FF <address bytes> <opcode>
//! ```
//!
//! The address sits at offset 1 and is one to three bytes long. Screens ship
//! with the factory address `AA EE EE` from the XY Screens RS-485 command
//! table; bus setups that re-address receivers often use a single byte.
//!
//! | Operation | Opcode |
//! |-----------|--------|
//! | Up | `DD` |
//! | Down | `EE` |
//! | Stop | `CC` |
//! | Program | `AA` |
//! | Set channel *n* | `B0 + (n - 1)` |
//!
//! # Example
//!
//! ```rust
//! use xyscreens::{Address, CommandSet};
//!
//! let commands = CommandSet::new(Address::from(0x01));
//! assert_eq!(commands.up().as_slice(), &[0xFF, 0x01, 0xDD]);
//!
//! let factory = CommandSet::default();
//! assert_eq!(factory.stop().as_slice(), &[0xFF, 0xAA, 0xEE, 0xEE, 0xCC]);
//! ```

use heapless::Vec;

use crate::error::ValidationError;

/// Longest address the frame layout supports.
pub const MAX_ADDRESS_LEN: usize = 3;

/// Longest frame: preamble, address, opcode.
pub const MAX_FRAME_LEN: usize = MAX_ADDRESS_LEN + 2;

/// Leading byte of every frame.
pub const PREAMBLE: u8 = 0xFF;

/// Address every screen ships with.
pub const FACTORY_ADDRESS: [u8; MAX_ADDRESS_LEN] = [0xAA, 0xEE, 0xEE];

/// Highest selectable channel.
pub const MAX_CHANNEL: u8 = 16;

/// An encoded command ready for the wire.
pub type Frame = Vec<u8, MAX_FRAME_LEN>;

/// Device address embedded in every frame.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "std::vec::Vec<u8>", into = "std::vec::Vec<u8>"))]
pub struct Address(Vec<u8, MAX_ADDRESS_LEN>);

impl Address {
    /// Build an address from raw bytes.
    ///
    /// Rejects empty input and anything longer than [`MAX_ADDRESS_LEN`].
    pub fn new(bytes: &[u8]) -> Result<Self, ValidationError> {
        if bytes.is_empty() {
            return Err(ValidationError::AddressLength(0));
        }
        Vec::from_slice(bytes)
            .map(Address)
            .map_err(|_| ValidationError::AddressLength(bytes.len()))
    }

    /// Raw address bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl Default for Address {
    fn default() -> Self {
        Address(Vec::from_slice(&FACTORY_ADDRESS).unwrap_or_default())
    }
}

impl From<u8> for Address {
    fn from(byte: u8) -> Self {
        let mut bytes = Vec::new();
        let _ = bytes.push(byte);
        Address(bytes)
    }
}

impl TryFrom<std::vec::Vec<u8>> for Address {
    type Error = ValidationError;

    fn try_from(bytes: std::vec::Vec<u8>) -> Result<Self, Self::Error> {
        Address::new(&bytes)
    }
}

impl From<Address> for std::vec::Vec<u8> {
    fn from(address: Address) -> Self {
        address.0.to_vec()
    }
}

/// Receiver channel number, validated to `1..=16`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Channel(u8);

impl Channel {
    /// Validate a channel number.
    pub fn new(n: u8) -> Result<Self, ValidationError> {
        if (1..=MAX_CHANNEL).contains(&n) {
            Ok(Channel(n))
        } else {
            Err(ValidationError::Channel(n))
        }
    }

    /// The channel number.
    pub const fn get(self) -> u8 {
        self.0
    }
}

/// A logical screen command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    /// Retract the screen.
    Up,
    /// Extend the screen.
    Down,
    /// Halt wherever it is.
    Stop,
    /// Put the receiver in pairing mode.
    Program,
    /// Switch the receiver to another channel.
    SetChannel(Channel),
}

impl Operation {
    /// Opcode byte for this operation.
    pub const fn opcode(self) -> u8 {
        match self {
            Operation::Up => 0xDD,
            Operation::Down => 0xEE,
            Operation::Stop => 0xCC,
            Operation::Program => 0xAA,
            Operation::SetChannel(channel) => 0xB0 + (channel.0 - 1),
        }
    }

    /// Lowercase name for logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Operation::Up => "up",
            Operation::Down => "down",
            Operation::Stop => "stop",
            Operation::Program => "program",
            Operation::SetChannel(_) => "set_channel",
        }
    }
}

/// Encode `operation` for the screen at `address`.
pub fn encode(operation: Operation, address: &Address) -> Frame {
    let mut frame = Frame::new();
    // Capacity is MAX_ADDRESS_LEN + 2, which always fits.
    let _ = frame.push(PREAMBLE);
    let _ = frame.extend_from_slice(address.as_bytes());
    let _ = frame.push(operation.opcode());
    frame
}

/// Command table bound to one address.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommandSet {
    address: Address,
}

impl CommandSet {
    /// Commands for the screen at `address`.
    pub fn new(address: Address) -> Self {
        Self { address }
    }

    /// The bound address.
    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Encode any operation.
    pub fn encode(&self, operation: Operation) -> Frame {
        encode(operation, &self.address)
    }

    /// Up frame.
    pub fn up(&self) -> Frame {
        self.encode(Operation::Up)
    }

    /// Down frame.
    pub fn down(&self) -> Frame {
        self.encode(Operation::Down)
    }

    /// Stop frame.
    pub fn stop(&self) -> Frame {
        self.encode(Operation::Stop)
    }

    /// Program frame.
    pub fn program(&self) -> Frame {
        self.encode(Operation::Program)
    }

    /// Channel selection frame.
    pub fn set_channel(&self, channel: Channel) -> Frame {
        self.encode(Operation::SetChannel(channel))
    }
}
