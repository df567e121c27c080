// Domain records shared by the resolver, the saved-list engine and the ports

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};

pub type UserId = i64;

// A single travel option as returned by the provider or persisted in the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trip {
    pub id: String,
    pub origin: String,
    pub destination: String,
    #[serde(serialize_with = "serialize_cost")]
    pub cost: f64,
    // minutes
    pub duration: u32,
    #[serde(rename = "type")]
    pub kind: String,
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
}

// One saved trip in a user's list, unique by (user_id, trip_id)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedListEntry {
    pub user_id: UserId,
    pub trip_id: String,
    pub created_at: DateTime<Utc>,
}

/// A saved-list entry joined with its trip for the duration of one request.
///
/// `trip` is `None` when the entry points at a trip the batch query did not
/// return; the item is still listed, just without trip fields.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedListItem {
    pub entry: SavedListEntry,
    pub trip: Option<Trip>,
}

impl MergedListItem {
    pub fn new(entry: SavedListEntry, trip: Option<Trip>) -> Self {
        Self { entry, trip }
    }

    pub fn cost(&self) -> Option<f64> {
        self.trip.as_ref().map(|t| t.cost)
    }

    pub fn duration(&self) -> Option<f64> {
        self.trip.as_ref().map(|t| f64::from(t.duration))
    }

    pub fn project(&self) -> ListItem {
        let trip = self.trip.as_ref();
        ListItem {
            id: trip.map_or_else(|| self.entry.trip_id.clone(), |t| t.id.clone()),
            origin: trip.map(|t| t.origin.clone()),
            destination: trip.map(|t| t.destination.clone()),
            cost: trip.map(|t| t.cost),
            duration: trip.map(|t| t.duration),
            kind: trip.map(|t| t.kind.clone()),
            display_name: trip.map(|t| t.display_name.clone()),
            added_date: self.entry.created_at,
        }
    }
}

// Outward shape of a saved-list item, used by both the list page and exports.
// Field order is the CSV column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListItem {
    pub id: String,
    pub origin: Option<String>,
    pub destination: Option<String>,
    #[serde(serialize_with = "serialize_optional_cost")]
    pub cost: Option<f64>,
    pub duration: Option<u32>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub display_name: Option<String>,
    pub added_date: DateTime<Utc>,
}

// Whole costs go out as integers, the way the provider sends them
fn serialize_cost<S: Serializer>(cost: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if cost.fract() == 0.0 && cost.abs() < i64::MAX as f64 {
        serializer.serialize_i64(*cost as i64)
    } else {
        serializer.serialize_f64(*cost)
    }
}

fn serialize_optional_cost<S: Serializer>(cost: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error> {
    match cost {
        Some(cost) => serialize_cost(cost, serializer),
        None => serializer.serialize_none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn entry(trip_id: &str) -> SavedListEntry {
        SavedListEntry {
            user_id: 1,
            trip_id: trip_id.to_string(),
            created_at: Utc.with_ymd_and_hms(2024, 11, 24, 10, 18, 52).unwrap(),
        }
    }

    #[test]
    fn trip_mode_uses_type_on_the_wire() {
        let raw = r#"{"id":"1","origin":"CAN","destination":"BOM","cost":812,"duration":13,"type":"train","display_name":"from CAN to BOM by train"}"#;
        let trip: Trip = serde_json::from_str(raw).unwrap();
        assert_eq!(trip.kind, "train");
        assert_eq!(trip.cost, 812.0);

        let value = serde_json::to_value(&trip).unwrap();
        assert_eq!(value["type"], "train");
        assert!(value.get("kind").is_none());
    }

    #[test]
    fn whole_costs_serialize_as_integers() {
        let mut trip: Trip = serde_json::from_str(
            r#"{"id":"1","origin":"CAN","destination":"BOM","cost":812,"duration":13,"type":"train","display_name":"x"}"#,
        )
        .unwrap();
        assert_eq!(serde_json::to_string(&trip.cost).unwrap(), "812.0");
        assert_eq!(serde_json::to_value(&trip).unwrap()["cost"].to_string(), "812");

        trip.cost = 812.5;
        assert_eq!(serde_json::to_value(&trip).unwrap()["cost"].to_string(), "812.5");

        let item = MergedListItem::new(entry("1"), Some(trip)).project();
        assert_eq!(serde_json::to_value(&item).unwrap()["cost"].to_string(), "812.5");
        let missing = MergedListItem::new(entry("2"), None).project();
        assert!(serde_json::to_value(&missing).unwrap()["cost"].is_null());
    }

    #[test]
    fn projection_of_missing_trip_keeps_id_and_date() {
        let item = MergedListItem::new(entry("42"), None);
        let projected = item.project();

        assert_eq!(projected.id, "42");
        assert_eq!(projected.origin, None);
        assert_eq!(projected.cost, None);
        assert_eq!(projected.added_date, item.entry.created_at);
    }
}
