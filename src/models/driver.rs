use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Driver {
    pub driver_number: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub broadcast_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_acronym: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_colour: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headshot_url: Option<String>,
}

impl Driver {
    pub fn display_name(&self) -> String {
        self.broadcast_name
            .clone()
            .or_else(|| self.full_name.clone())
            .or_else(|| self.name_acronym.clone())
            .unwrap_or_else(|| format!("Driver {}", self.driver_number))
    }
}
