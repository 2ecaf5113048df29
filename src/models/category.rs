use serde::{Deserialize, Serialize};

/// Service-catalog entry. Catalog management lives in a collaborator
/// system; the dispatcher only resolves names and reads base prices.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceCategory {
    pub name: String,
    pub base_price: f64,
    pub description: String,
}

pub fn default_categories() -> Vec<ServiceCategory> {
    [
        ("towing", 150.0, "Vehicle towing to a garage or location of choice"),
        ("mechanic", 80.0, "On-site mechanical diagnosis and repair"),
        ("vulcanizing", 40.0, "Tyre patching and replacement"),
        ("parts", 60.0, "Emergency spare-part delivery"),
        ("washing", 30.0, "Mobile vehicle washing"),
    ]
    .into_iter()
    .map(|(name, base_price, description)| ServiceCategory {
        name: name.to_string(),
        base_price,
        description: description.to_string(),
    })
    .collect()
}
