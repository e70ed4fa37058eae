//! Snapshot normalization
//!
//! Turns the nested facility tree into independent flat tables. Nested
//! collections become their own tables with the owning record's identifier
//! injected as a foreign key:
//!
//! | Table | Source | Foreign key |
//! |---|---|---|
//! | facilities | top level, left-joined with `FACILITYADDRESS` | |
//! | activities | `ACTIVITY` | `FacilityID` |
//! | events | `EVENT` | `FacilityID` |
//! | campsites | `CAMPSITE` | `FacilityID` |
//! | permitted_equipment | `CAMPSITE[].PERMITTEDEQUIPMENT` | `CampsiteID` |
//! | campsite_attributes | `CAMPSITE[].ATTRIBUTES` | `CampsiteID` |
//!
//! Every output column is scalar or null.

pub mod facility;
pub mod table;

pub use table::FlatTable;

use lord_common::record::{child_records, valid_id, CAMPSITE_ID, FACILITY_ID};
use lord_common::Record;
use serde_json::Value;
use tracing::{debug, info, warn};

const ACTIVITY: &str = "ACTIVITY";
const EVENT: &str = "EVENT";
const CAMPSITE: &str = "CAMPSITE";
const FACILITY_ADDRESS: &str = "FACILITYADDRESS";
const PERMITTED_EQUIPMENT: &str = "PERMITTEDEQUIPMENT";
const ATTRIBUTES: &str = "ATTRIBUTES";

const ADDRESS_SUFFIX: &str = "_address";

/// Nested collections removed from facilities before the address join
const FACILITY_COLLECTIONS: &[&str] = &[ACTIVITY, CAMPSITE, EVENT, FACILITY_ADDRESS];

const FACILITY_DROP: &[&str] = &[
    "FacilityAccessibilityText",
    "Enabled",
    "LINK",
    "MEDIA",
    "ORGANIZATION",
    "PERMITENTRANCE",
    "RECAREA",
    "TOUR",
    "FacilityAddressType",
    "LastUpdatedDate_address",
];

const CAMPSITE_DROP: &[&str] = &["ENTITYMEDIA", PERMITTED_EQUIPMENT, ATTRIBUTES, "CreatedDate"];

const ACTIVITY_DROP: &[&str] = &["FacilityActivityFeeDescription"];

/// Facility filters applied before flattening
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizeOptions {
    /// Skip facilities at `(0, 0)` or without coordinates
    pub drop_unknown_locations: bool,

    /// Keep only facilities whose ADA code carries the accessible marker
    pub ada_only: bool,
}

impl NormalizeOptions {
    fn keeps(&self, record: &Record) -> bool {
        (!self.drop_unknown_locations || facility::has_known_location(record))
            && (!self.ada_only || facility::is_ada_accessible(record))
    }
}

/// Output of one normalization pass
#[derive(Debug, Clone, Default)]
pub struct NormalizedTables {
    pub facilities: FlatTable,
    pub activities: FlatTable,
    pub events: FlatTable,
    pub campsites: FlatTable,
    pub permitted_equipment: FlatTable,
    pub campsite_attributes: FlatTable,
}

impl NormalizedTables {
    /// All tables in export order
    pub fn tables(&self) -> [&FlatTable; 6] {
        [
            &self.facilities,
            &self.activities,
            &self.events,
            &self.campsites,
            &self.permitted_equipment,
            &self.campsite_attributes,
        ]
    }
}

#[derive(Default)]
struct Accumulators {
    activities: Vec<Record>,
    events: Vec<Record>,
    campsites: Vec<Record>,
    permitted_equipment: Vec<Record>,
    campsite_attributes: Vec<Record>,
    addresses: Vec<Record>,
    campsites_without_id: usize,
}

impl Accumulators {
    fn collect(&mut self, facility: &Record, facility_id: &Value) {
        self.activities
            .extend(with_foreign_key(facility, ACTIVITY, FACILITY_ID, facility_id));
        self.events
            .extend(with_foreign_key(facility, EVENT, FACILITY_ID, facility_id));

        for campsite in child_records(facility, CAMPSITE) {
            let Some(campsite_id) = valid_id(campsite, CAMPSITE_ID) else {
                self.campsites_without_id += 1;
                continue;
            };

            self.permitted_equipment.extend(with_foreign_key(
                campsite,
                PERMITTED_EQUIPMENT,
                CAMPSITE_ID,
                campsite_id,
            ));
            self.campsite_attributes
                .extend(with_foreign_key(campsite, ATTRIBUTES, CAMPSITE_ID, campsite_id));

            let mut row = campsite.clone();
            row.insert(FACILITY_ID.to_string(), facility_id.clone());
            self.campsites.push(row);
        }

        self.addresses.extend(with_foreign_key(
            facility,
            FACILITY_ADDRESS,
            FACILITY_ID,
            facility_id,
        ));
    }
}

/// Copy the children under `collection`, stamping `fk_name = fk_value` on each
fn with_foreign_key<'a>(
    parent: &'a Record,
    collection: &'a str,
    fk_name: &'a str,
    fk_value: &'a Value,
) -> impl Iterator<Item = Record> + 'a {
    child_records(parent, collection).map(move |child| {
        let mut row = child.clone();
        row.insert(fk_name.to_string(), fk_value.clone());
        row
    })
}

/// Flattens snapshot facilities into [`NormalizedTables`]
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    options: NormalizeOptions,
}

impl Normalizer {
    pub fn new(options: NormalizeOptions) -> Self {
        Self { options }
    }

    /// Flatten `facilities`; the input is left untouched
    pub fn normalize(&self, facilities: &[Record]) -> NormalizedTables {
        let kept: Vec<Record> = facilities
            .iter()
            .filter(|f| self.options.keeps(f))
            .cloned()
            .collect();
        if kept.len() < facilities.len() {
            info!(
                filtered = facilities.len() - kept.len(),
                options = ?self.options,
                "Filtered facilities before flattening"
            );
        }

        let mut acc = Accumulators::default();
        for record in &kept {
            // Facilities without an identifier still get a row, but nothing
            // can reference them
            if let Some(facility_id) = valid_id(record, FACILITY_ID) {
                acc.collect(record, facility_id);
            }
        }
        if acc.campsites_without_id > 0 {
            warn!(count = acc.campsites_without_id, "Skipped campsites without CampsiteID");
        }

        let mut facilities = FlatTable::from_records("facilities", kept);
        facilities.drop_columns(FACILITY_COLLECTIONS);
        facilities.map_column(facility::GEOJSON, facility::encode_geojson);

        let addresses = FlatTable::from_records("facility_addresses", acc.addresses);
        let (mut facilities, multi_address) =
            facilities.left_join(&addresses, FACILITY_ID, ADDRESS_SUFFIX);
        if multi_address > 0 {
            warn!(
                facilities = multi_address,
                "Facilities with several addresses appear once per address"
            );
        }
        facilities.drop_columns(FACILITY_DROP);

        let mut activities = FlatTable::from_records("activities", acc.activities);
        activities.drop_columns(ACTIVITY_DROP);

        let mut campsites = FlatTable::from_records("campsites", acc.campsites);
        campsites.drop_columns(CAMPSITE_DROP);

        let mut tables = NormalizedTables {
            facilities,
            activities,
            events: FlatTable::from_records("events", acc.events),
            campsites,
            permitted_equipment: FlatTable::from_records("permitted_equipment", acc.permitted_equipment),
            campsite_attributes: FlatTable::from_records("campsite_attributes", acc.campsite_attributes),
        };

        for table in [
            &mut tables.facilities,
            &mut tables.activities,
            &mut tables.events,
            &mut tables.campsites,
            &mut tables.permitted_equipment,
            &mut tables.campsite_attributes,
        ] {
            let dropped = table.drop_nested_columns();
            if !dropped.is_empty() {
                debug!(table = table.name(), ?dropped, "Dropped nested columns");
            }
            info!(table = table.name(), rows = table.len(), columns = table.columns().len(), "Built table");
        }

        tables
    }
}
