use serde::{Deserialize, Serialize};

use crate::models::schedule::WeeklyAvailability;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Usd,
    Eur,
    Gbp,
    Sar,
    Aed,
}

// A barber offering services on a weekly schedule
#[derive(Debug, Clone, Serialize)]
pub struct Provider {
    pub id: String,
    pub user_id: String,
    pub display_name: String,
    pub bio: Option<String>,
    pub is_active: bool,
    pub is_verified: bool,
    pub availability: WeeklyAvailability,
    pub service_ids: Vec<String>,
}

impl Provider {
    pub fn is_bookable(&self) -> bool {
        self.is_active && self.is_verified
    }

    pub fn offers(&self, service_id: &str) -> bool {
        self.service_ids.iter().any(|id| id == service_id)
    }
}

// An entry of the service catalog
#[derive(Debug, Clone, Serialize)]
pub struct Service {
    pub id: String,
    pub name: String,
    pub description: String,
    pub duration_minutes: u16,
    pub price_cents: u64,
    pub currency: Currency,
    pub is_active: bool,
    pub provider_ids: Vec<String>,
}

pub const MIN_SERVICE_DURATION: u16 = 15;
pub const MAX_SERVICE_DURATION: u16 = 300;
