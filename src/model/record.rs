use serde::Serialize;

/// Label written in the first column for siblings discovered next to a result.
pub const RELATED_LABEL: &str = "Relacionado";

/// One output row. Missing fields are always empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ListingRecord {
    pub queried_as: String,
    pub name: String,
    pub address: String,
    pub phone: String,
    pub website: String,
    pub maps_url: String,
    pub category: String,
}

impl ListingRecord {
    pub fn new(queried_as: impl Into<String>) -> Self {
        Self {
            queried_as: queried_as.into(),
            ..Default::default()
        }
    }

    pub fn not_found(queried_as: impl Into<String>, sentinel: &str) -> Self {
        let mut record = Self::new(queried_as);
        record.mark_not_found(sentinel);
        record
    }

    /// Replaces the name with `sentinel` and drops every other field already read.
    pub fn mark_not_found(&mut self, sentinel: &str) {
        self.name = sentinel.to_string();
        self.address.clear();
        self.phone.clear();
        self.website.clear();
        self.maps_url.clear();
        self.category.clear();
    }

    pub fn is_not_found(&self, sentinel: &str) -> bool {
        self.name == sentinel
    }

    pub fn related_label(locality: Option<&str>) -> String {
        match locality {
            Some(locality) if !locality.is_empty() => format!("{} ({})", RELATED_LABEL, locality),
            _ => RELATED_LABEL.to_string(),
        }
    }

    /// Cells in output column order.
    pub fn cells(&self) -> [&str; 7] {
        [
            &self.queried_as,
            &self.name,
            &self.address,
            &self.phone,
            &self.website,
            &self.maps_url,
            &self.category,
        ]
    }
}

/// How a row is presented in the artifact. Carries no behaviour of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RowTag {
    PrimaryOk,
    PrimaryNotFound,
    Related,
}

impl RowTag {
    pub fn for_primary(record: &ListingRecord, sentinel: &str) -> Self {
        if record.is_not_found(sentinel) {
            RowTag::PrimaryNotFound
        } else {
            RowTag::PrimaryOk
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SENTINEL: &str = "No se encontró esta empresa en España";

    #[test]
    fn test_mark_not_found_clears_every_other_field() {
        let mut record = ListingRecord {
            queried_as: "Acme".to_string(),
            name: "Acme SL".to_string(),
            address: "Rue 1, Paris, France".to_string(),
            phone: "+33 1 00 00 00 00".to_string(),
            website: "https://acme.fr".to_string(),
            maps_url: "https://maps/acme".to_string(),
            category: "Fábrica".to_string(),
        };

        record.mark_not_found(SENTINEL);

        assert_eq!(record.queried_as, "Acme");
        assert_eq!(record.name, SENTINEL);
        assert!(record.address.is_empty());
        assert!(record.phone.is_empty());
        assert!(record.website.is_empty());
        assert!(record.maps_url.is_empty());
        assert!(record.category.is_empty());
        assert_eq!(RowTag::for_primary(&record, SENTINEL), RowTag::PrimaryNotFound);
    }

    #[test]
    fn test_related_label() {
        assert_eq!(ListingRecord::related_label(None), "Relacionado");
        assert_eq!(ListingRecord::related_label(Some("")), "Relacionado");
        assert_eq!(
            ListingRecord::related_label(Some("Tudela")),
            "Relacionado (Tudela)"
        );
    }
}
