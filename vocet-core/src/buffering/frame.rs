//! Typed output unit of the encoder: one compressed frame as unpacked bits.

use serde::de::{self, SeqAccess, Visitor};
use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::bits::{pack_frame_bits, unpack_frame_bits};
use crate::codec::{FRAME_BITS, PAYLOAD_BYTES};
use crate::error::{Result, VocetError};

/// One compressed speech frame as an ordered sequence of 50 unpacked bits.
///
/// Each element is `0` or `1`; element 0 is the MSB of the first payload
/// byte. Created fresh per encoded frame, written once, then owned by
/// downstream consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitFrame {
    bits: [u8; FRAME_BITS],
}

// Default cannot be derived: std only provides it for arrays up to 32
// elements.
impl Default for BitFrame {
    fn default() -> Self {
        Self {
            bits: [0; FRAME_BITS],
        }
    }
}

impl BitFrame {
    /// Unpack a 7-byte compressed payload into its 50-bit frame.
    pub fn from_payload(payload: &[u8; PAYLOAD_BYTES]) -> Self {
        Self {
            bits: unpack_frame_bits(payload),
        }
    }

    /// Build a frame from already-unpacked bits.
    ///
    /// # Errors
    /// `ContractViolation` if any element is not `0` or `1` — the wire
    /// contract is strictly binary.
    pub fn from_bits(bits: [u8; FRAME_BITS]) -> Result<Self> {
        if let Some(pos) = bits.iter().position(|&b| b > 1) {
            return Err(VocetError::ContractViolation {
                expected: 1,
                got: bits[pos] as usize,
            });
        }
        Ok(Self { bits })
    }

    /// The unpacked bits, element 0 first.
    pub fn bits(&self) -> &[u8; FRAME_BITS] {
        &self.bits
    }

    /// Repack into the 7-byte payload (final 6 bits zero-padded).
    pub fn to_payload(&self) -> [u8; PAYLOAD_BYTES] {
        pack_frame_bits(&self.bits)
    }
}

// serde has no derive for 50-element arrays, so the frame serialises as a
// plain sequence of 0/1 integers and validates on the way back in.

impl Serialize for BitFrame {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(FRAME_BITS))?;
        for bit in &self.bits {
            seq.serialize_element(bit)?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for BitFrame {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct BitFrameVisitor;

        impl<'de> Visitor<'de> for BitFrameVisitor {
            type Value = BitFrame;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "a sequence of {FRAME_BITS} bits (0 or 1)")
            }

            fn visit_seq<A: SeqAccess<'de>>(
                self,
                mut seq: A,
            ) -> std::result::Result<BitFrame, A::Error> {
                let mut bits = [0u8; FRAME_BITS];
                for (i, slot) in bits.iter_mut().enumerate() {
                    let bit: u8 = seq
                        .next_element()?
                        .ok_or_else(|| de::Error::invalid_length(i, &self))?;
                    if bit > 1 {
                        return Err(de::Error::custom(format!(
                            "bit {i} is {bit}, expected 0 or 1"
                        )));
                    }
                    *slot = bit;
                }
                if seq.next_element::<u8>()?.is_some() {
                    return Err(de::Error::invalid_length(FRAME_BITS + 1, &self));
                }
                Ok(BitFrame { bits })
            }
        }

        deserializer.deserialize_seq(BitFrameVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_payload_matches_unpacker() {
        let payload = [0b1011_0100u8, 0, 0, 0, 0, 0, 0];
        let frame = BitFrame::from_payload(&payload);
        assert_eq!(&frame.bits()[..8], &[1, 0, 1, 1, 0, 1, 0, 0]);
        assert_eq!(frame.to_payload(), payload);
    }

    #[test]
    fn from_bits_rejects_non_binary_elements() {
        let mut bits = [0u8; FRAME_BITS];
        bits[13] = 2;
        assert!(BitFrame::from_bits(bits).is_err());
    }

    #[test]
    fn default_frame_is_all_zero() {
        assert_eq!(BitFrame::default().to_payload(), [0u8; PAYLOAD_BYTES]);
    }

    #[test]
    fn serde_round_trip() {
        let payload = [0xA5, 0x3C, 0x01, 0xFE, 0x80, 0x7F, 0b0100_0000];
        let frame = BitFrame::from_payload(&payload);

        let json = serde_json::to_string(&frame).expect("serialize frame");
        let back: BitFrame = serde_json::from_str(&json).expect("deserialize frame");
        assert_eq!(back, frame);
    }

    #[test]
    fn deserialize_rejects_wrong_length_and_values() {
        let short = serde_json::to_string(&vec![0u8; FRAME_BITS - 1]).unwrap();
        assert!(serde_json::from_str::<BitFrame>(&short).is_err());

        let long = serde_json::to_string(&vec![0u8; FRAME_BITS + 1]).unwrap();
        assert!(serde_json::from_str::<BitFrame>(&long).is_err());

        let mut values = vec![0u8; FRAME_BITS];
        values[0] = 7;
        let invalid = serde_json::to_string(&values).unwrap();
        assert!(serde_json::from_str::<BitFrame>(&invalid).is_err());
    }
}
