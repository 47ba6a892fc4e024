use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::db::DatabaseError;

/// Macro to generate enum with as_str + std::str::FromStr pattern.
/// The string form is also the serde wire form and the stored column value.
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

str_enum!(WalkStatus {
    Scheduled => "scheduled",
    Completed => "completed",
    Cancelled => "cancelled",
});

str_enum!(TimeSlot {
    Am => "AM",
    Pm => "PM",
});

str_enum!(DogSize {
    Small => "small",
    Medium => "medium",
    Large => "large",
    ExtraLarge => "extra_large",
});

str_enum!(AssessmentStatus {
    Pending => "pending",
    Scheduled => "scheduled",
    Completed => "completed",
});

str_enum!(DogWalkStatus {
    Pending => "pending",
    PickedUp => "picked_up",
    DroppedOff => "dropped_off",
    Absent => "absent",
});

impl TimeSlot {
    /// Coarse AM/PM bucket for a start time.
    pub fn from_start_time(time: NaiveTime) -> Self {
        if time.hour() < 12 {
            TimeSlot::Am
        } else {
            TimeSlot::Pm
        }
    }
}

// AM sorts before PM.
impl PartialOrd for TimeSlot {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TimeSlot {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.as_str().cmp(other.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn walk_status_round_trips_through_str() {
        for status in [WalkStatus::Scheduled, WalkStatus::Completed, WalkStatus::Cancelled] {
            assert_eq!(WalkStatus::from_str(status.as_str()).unwrap(), status);
        }
    }

    #[test]
    fn unknown_value_is_invalid_enum() {
        let err = DogWalkStatus::from_str("lost").unwrap_err();
        assert!(matches!(err, DatabaseError::InvalidEnum { .. }));
        assert!(err.to_string().contains("DogWalkStatus"));
    }

    #[test]
    fn time_slot_splits_at_noon() {
        let morning = NaiveTime::from_hms_opt(11, 59, 0).unwrap();
        let noon = NaiveTime::from_hms_opt(12, 0, 0).unwrap();
        assert_eq!(TimeSlot::from_start_time(morning), TimeSlot::Am);
        assert_eq!(TimeSlot::from_start_time(noon), TimeSlot::Pm);
    }

    #[test]
    fn serde_uses_wire_strings() {
        let json = serde_json::to_string(&DogWalkStatus::PickedUp).unwrap();
        assert_eq!(json, "\"picked_up\"");
        let slot: TimeSlot = serde_json::from_str("\"PM\"").unwrap();
        assert_eq!(slot, TimeSlot::Pm);
        assert!(serde_json::from_str::<TimeSlot>("\"noon\"").is_err());
    }
}
