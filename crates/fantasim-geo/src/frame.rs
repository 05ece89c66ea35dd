// SPDX-License-Identifier: Apache-2.0
//! Reference-frame composition for frame-aware velocity queries (§4.7).

use fantasim_core::{FantaSimError, PlateId};

/// One link in a custom reference-frame transform chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum FrameLink {
    /// Subtract the named plate's velocity at this point in the chain.
    AnchorTo(PlateId),
    /// Compose with the mantle (absolute rotation) frame.
    Mantle,
}

/// A reference frame a velocity can be expressed in (§4.7).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Frame {
    /// Absolute rotation against the mantle.
    MantleFrame,
    /// Equals [`Frame::MantleFrame`]: no true polar wander is modeled.
    AbsoluteFrame,
    /// Velocity relative to the named plate (zero for that plate itself).
    PlateAnchor {
        /// The anchor plate.
        plate_id: PlateId,
    },
    /// An ordered chain of links composing transforms.
    CustomFrame {
        /// The chain, applied in order.
        chain: Vec<FrameLink>,
    },
}

/// Validates that a custom frame chain contains no repeated anchor, which
/// this engine treats as a cycle (§4.7, `CyclicFrameReference`).
///
/// # Errors
/// Returns [`FantaSimError::CyclicFrameReference`] if `chain` anchors to the
/// same plate more than once.
pub fn validate_chain(chain: &[FrameLink]) -> Result<(), FantaSimError> {
    let mut seen = Vec::new();
    for link in chain {
        if let FrameLink::AnchorTo(plate_id) = link {
            if seen.contains(plate_id) {
                return Err(FantaSimError::CyclicFrameReference {
                    frame_id: format!("{plate_id}"),
                    tick: fantasim_core::Tick::GENESIS,
                });
            }
            seen.push(*plate_id);
        }
    }
    Ok(())
}
