/// Column names of the tab-delimited observation source.
///
/// Defaults match the headers of the eBird basic dataset export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservationColumns {
    pub common_name: String,
    pub scientific_name: String,
    pub date: String,
    pub latitude: String,
    pub longitude: String,
    pub region: String,
}

impl ObservationColumns {
    /// All columns kept from the source, in output order.
    pub fn all(&self) -> [&str; 6] {
        [
            &self.common_name,
            &self.scientific_name,
            &self.date,
            &self.latitude,
            &self.longitude,
            &self.region,
        ]
    }
}

impl Default for ObservationColumns {
    fn default() -> Self {
        Self {
            common_name: "COMMON NAME".to_string(),
            scientific_name: "SCIENTIFIC NAME".to_string(),
            date: "OBSERVATION DATE".to_string(),
            latitude: "LATITUDE".to_string(),
            longitude: "LONGITUDE".to_string(),
            region: "STATE".to_string(),
        }
    }
}
