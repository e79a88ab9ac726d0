//! Taxi zone lookup table keyed by location id.

use std::collections::HashMap;

use serde::Serialize;

use crate::error::IntegrityFault;

/// One row of the zone lookup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Zone {
    pub location_id: i64,
    pub borough: Option<String>,
    pub zone: Option<String>,
    pub service_zone: Option<String>,
}

/// Position of a zone inside its [`ZoneTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ZoneRef(usize);

/// Zones in input order with an index on `location_id`.
#[derive(Debug, Default)]
pub struct ZoneTable {
    zones: Vec<Zone>,
    index: HashMap<i64, ZoneRef>,
}

impl ZoneTable {
    /// Builds the table, rejecting duplicate location ids.
    pub fn new(zones: Vec<Zone>) -> Result<Self, IntegrityFault> {
        let mut index = HashMap::with_capacity(zones.len());
        for (i, zone) in zones.iter().enumerate() {
            if index.insert(zone.location_id, ZoneRef(i)).is_some() {
                return Err(IntegrityFault(format!(
                    "duplicate zone location id {}",
                    zone.location_id
                )));
            }
        }
        Ok(Self { zones, index })
    }

    pub fn lookup(&self, location_id: i64) -> Option<ZoneRef> {
        self.index.get(&location_id).copied()
    }

    pub fn get(&self, zone: ZoneRef) -> &Zone {
        &self.zones[zone.0]
    }

    pub fn borough(&self, zone: Option<ZoneRef>) -> Option<&str> {
        zone.and_then(|z| self.get(z).borough.as_deref())
    }

    pub fn zone_name(&self, zone: Option<ZoneRef>) -> Option<&str> {
        zone.and_then(|z| self.get(z).zone.as_deref())
    }

    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zone(id: i64, borough: &str, name: &str) -> Zone {
        Zone {
            location_id: id,
            borough: Some(borough.to_string()),
            zone: Some(name.to_string()),
            service_zone: Some("Yellow Zone".to_string()),
        }
    }

    #[test]
    fn test_lookup_found_and_missing() {
        let table = ZoneTable::new(vec![
            zone(132, "Queens", "JFK Airport"),
            zone(161, "Manhattan", "Midtown Center"),
        ])
        .unwrap();

        let jfk = table.lookup(132).unwrap();
        assert_eq!(table.get(jfk).zone.as_deref(), Some("JFK Airport"));
        assert_eq!(table.borough(Some(jfk)), Some("Queens"));
        assert!(table.lookup(999).is_none());
        assert_eq!(table.zone_name(None), None);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_duplicate_location_id_rejected() {
        let err = ZoneTable::new(vec![
            zone(1, "EWR", "Newark Airport"),
            zone(1, "Queens", "Jamaica Bay"),
        ])
        .unwrap_err();

        assert_eq!(err.0, "duplicate zone location id 1");
    }
}
