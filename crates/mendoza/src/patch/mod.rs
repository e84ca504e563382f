//! Mendoza patch tapes.
//!
//! A patch is a flat JSON array of opcodes interleaved with their operands,
//! read strictly left to right:
//!
//! ```text
//! [6, 0,  0, 2,  15]
//!  │  │   │  │   └─ ReturnIntoObjectSameKeyPop
//!  │  │   │  └─ literal 2
//!  │  │   └─ Value
//!  │  └─ key index 0
//!  └─ PushField
//! ```

pub mod builder;
pub mod opcode;
pub mod raw;

pub use builder::PatchBuilder;
pub use opcode::Opcode;
pub use raw::{PatchReader, RawPatch};
