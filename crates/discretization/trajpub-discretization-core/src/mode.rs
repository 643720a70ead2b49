//! Which quantities a target publishes.

use std::fmt;

use serde::{Deserialize, Serialize};

bitflags::bitflags! {
    /// Set of enabled computations. Registration only ever widens it.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct ComputationMode: u8 {
        const POSITION = 0b001;
        const DERIVATIVE = 0b010;
        /// Accepted on targets but only the whole-body channel carries it.
        const ACCELERATION = 0b100;
        const POSITION_AND_DERIVATIVE = Self::POSITION.bits() | Self::DERIVATIVE.bits();
    }
}

impl ComputationMode {
    pub const NONE: ComputationMode = ComputationMode::empty();

    /// Union of both modes.
    pub fn merge(self, other: ComputationMode) -> ComputationMode {
        self | other
    }
}

impl fmt::Display for ComputationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        let mut first = true;
        for (bit, name) in [
            (Self::POSITION, "position"),
            (Self::DERIVATIVE, "derivative"),
            (Self::ACCELERATION, "acceleration"),
        ] {
            if self.contains(bit) {
                if !first {
                    f.write_str("|")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_only_widens() {
        let mut mode = ComputationMode::POSITION;
        mode |= ComputationMode::DERIVATIVE;
        assert_eq!(mode, ComputationMode::POSITION_AND_DERIVATIVE);
        mode = mode.merge(ComputationMode::POSITION);
        assert_eq!(mode, ComputationMode::POSITION_AND_DERIVATIVE);
        assert!(mode.contains(ComputationMode::POSITION));
        assert!(!mode.contains(ComputationMode::ACCELERATION));
    }

    #[test]
    fn truncates_unknown_bits() {
        assert_eq!(ComputationMode::from_bits_truncate(0xff).bits(), 0b111);
        assert!(ComputationMode::from_bits(0b1000).is_none());
    }

    #[test]
    fn display_lists_bits() {
        assert_eq!(ComputationMode::NONE.to_string(), "none");
        assert_eq!(
            (ComputationMode::POSITION | ComputationMode::ACCELERATION).to_string(),
            "position|acceleration"
        );
    }

    #[test]
    fn serializes_as_flag_names() {
        let json = serde_json::to_string(&ComputationMode::POSITION_AND_DERIVATIVE).unwrap();
        let back: ComputationMode = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ComputationMode::POSITION_AND_DERIVATIVE);

        let parsed: ComputationMode = serde_json::from_str("\"POSITION | ACCELERATION\"").unwrap();
        assert_eq!(parsed, ComputationMode::POSITION | ComputationMode::ACCELERATION);
    }
}
