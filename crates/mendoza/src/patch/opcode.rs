//! Wire opcodes of the patch instruction tape.
//!
//! The numbering is the position of each operation in the encoder's
//! instruction table. Composite opcodes (10–18) are shorthands for the
//! sequences noted next to them.

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    /// `literal`: push a wrapped literal on the output stack.
    Value = 0,
    /// Push the current input node on the output stack, unchanged.
    Copy = 1,
    /// Push an empty output entry.
    Blank = 2,
    ReturnIntoArray = 3,
    /// `key`
    ReturnIntoObject = 4,
    ReturnIntoObjectSameKey = 5,
    /// `key index` into the sorted keys of the current input object.
    PushField = 6,
    /// `index`
    PushElement = 7,
    PushParent = 8,
    Pop = 9,
    /// PushField + Copy
    PushFieldCopy = 10,
    /// PushField + Blank
    PushFieldBlank = 11,
    /// PushElement + Copy
    PushElementCopy = 12,
    /// PushElement + Blank
    PushElementBlank = 13,
    /// ReturnIntoObject + Pop
    ReturnIntoObjectPop = 14,
    /// ReturnIntoObjectSameKey + Pop
    ReturnIntoObjectSameKeyPop = 15,
    /// ReturnIntoArray + Pop
    ReturnIntoArrayPop = 16,
    /// Value + ReturnIntoObject (`literal`, `key`)
    ObjectSetFieldValue = 17,
    /// PushField + Copy + ReturnIntoObjectSameKey + Pop
    ObjectCopyField = 18,
    /// `key index`
    ObjectDeleteField = 19,
    /// `literal`
    ArrayAppendValue = 20,
    /// `left`, `right`
    ArrayAppendSlice = 21,
    /// `literal string`
    StringAppendString = 22,
    /// `left`, `right` in UTF-8 bytes
    StringAppendSlice = 23,
}

impl Opcode {
    pub fn from_u64(v: u64) -> Option<Self> {
        match v {
            0 => Some(Self::Value),
            1 => Some(Self::Copy),
            2 => Some(Self::Blank),
            3 => Some(Self::ReturnIntoArray),
            4 => Some(Self::ReturnIntoObject),
            5 => Some(Self::ReturnIntoObjectSameKey),
            6 => Some(Self::PushField),
            7 => Some(Self::PushElement),
            8 => Some(Self::PushParent),
            9 => Some(Self::Pop),
            10 => Some(Self::PushFieldCopy),
            11 => Some(Self::PushFieldBlank),
            12 => Some(Self::PushElementCopy),
            13 => Some(Self::PushElementBlank),
            14 => Some(Self::ReturnIntoObjectPop),
            15 => Some(Self::ReturnIntoObjectSameKeyPop),
            16 => Some(Self::ReturnIntoArrayPop),
            17 => Some(Self::ObjectSetFieldValue),
            18 => Some(Self::ObjectCopyField),
            19 => Some(Self::ObjectDeleteField),
            20 => Some(Self::ArrayAppendValue),
            21 => Some(Self::ArrayAppendSlice),
            22 => Some(Self::StringAppendString),
            23 => Some(Self::StringAppendSlice),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        self as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip() {
        for v in 0..24u64 {
            let op = Opcode::from_u64(v).unwrap();
            assert_eq!(op.code() as u64, v);
        }
        assert_eq!(Opcode::from_u64(24), None);
        assert_eq!(Opcode::from_u64(u64::MAX), None);
    }
}
