//! Receiver switch thresholds keyed by device type
//!
//! A receiver reports a raw status word. For known receiver types one value
//! of that word means "off"; any other value means "on". Types not listed
//! here get no switch update at all.

use crate::contracts::SwitchStatus;

/// A group of receiver types sharing one "off" status value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiverThreshold {
    pub type_ids: &'static [&'static str],
    pub off_value: i64,
}

impl ReceiverThreshold {
    pub fn classify(&self, status: i64) -> SwitchStatus {
        if status == self.off_value {
            SwitchStatus::Off
        } else {
            SwitchStatus::On
        }
    }
}

pub const RECEIVER_THRESHOLDS: &[ReceiverThreshold] = &[
    ReceiverThreshold {
        type_ids: &["040B09050101", "040B09050111", "040B09050201"],
        off_value: 256,
    },
    ReceiverThreshold {
        type_ids: &["040B09050102", "040B09050112", "040B09050202"],
        off_value: 768,
    },
    ReceiverThreshold {
        type_ids: &["040B09050103", "040B09050113", "040B09050203"],
        off_value: 1792,
    },
];

/// Threshold group for a device type id
pub fn receiver_threshold(type_id: &str) -> Option<&'static ReceiverThreshold> {
    RECEIVER_THRESHOLDS
        .iter()
        .find(|group| group.type_ids.contains(&type_id))
}

/// Switch state implied by a receiver status, if the type is known
pub fn receiver_switch(type_id: &str, status: i64) -> Option<SwitchStatus> {
    receiver_threshold(type_id).map(|group| group.classify(status))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_each_type_switches_off_exactly_at_threshold() {
        let cases = [
            ("040B09050101", 256),
            ("040B09050111", 256),
            ("040B09050201", 256),
            ("040B09050102", 768),
            ("040B09050112", 768),
            ("040B09050202", 768),
            ("040B09050103", 1792),
            ("040B09050113", 1792),
            ("040B09050203", 1792),
        ];

        for (type_id, off_value) in cases {
            assert_eq!(receiver_switch(type_id, off_value), Some(SwitchStatus::Off));
            assert_eq!(receiver_switch(type_id, off_value + 1), Some(SwitchStatus::On));
            assert_eq!(receiver_switch(type_id, 0), Some(SwitchStatus::On));
        }
    }

    #[test]
    fn test_thresholds_do_not_leak_across_groups() {
        assert_eq!(receiver_switch("040B09050101", 768), Some(SwitchStatus::On));
        assert_eq!(receiver_switch("040B09050102", 256), Some(SwitchStatus::On));
        assert_eq!(receiver_switch("040B09050103", 256), Some(SwitchStatus::On));
    }

    #[test]
    fn test_unknown_type_has_no_switch() {
        assert_eq!(receiver_switch("040B09050104", 256), None);
        assert_eq!(receiver_switch("", 256), None);
        assert_eq!(receiver_switch("x", 1792), None);
    }

    #[test]
    fn test_type_ids_are_unique() {
        let mut ids: Vec<_> = RECEIVER_THRESHOLDS
            .iter()
            .flat_map(|g| g.type_ids.iter())
            .collect();
        let total = ids.len();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), total);
    }

    proptest! {
        #[test]
        fn prop_known_types_are_on_unless_at_threshold(
            group in 0usize..3,
            member in 0usize..3,
            status in any::<i64>(),
        ) {
            let threshold = &RECEIVER_THRESHOLDS[group];
            let type_id = threshold.type_ids[member];
            let expected = if status == threshold.off_value {
                SwitchStatus::Off
            } else {
                SwitchStatus::On
            };
            prop_assert_eq!(receiver_switch(type_id, status), Some(expected));
        }
    }
}
