use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use validator::validate_email;

use crate::errors::FieldErrors;

/// Indian mobile numbers: ten digits, leading digit 6-9.
pub static MOBILE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[6-9][0-9]{9}$").expect("mobile pattern"));

/// Indian PIN codes: six digits, no leading zero.
pub static POSTAL_CODE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[1-9][0-9]{5}$").expect("postal code pattern"));

const MAX_NAME_LENGTH: usize = 120;
const MAX_ADDRESS_FIELD_LENGTH: usize = 120;
const MAX_EMAIL_LENGTH: usize = 254;

/// Administrative regions a shipping address may select.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[strum(ascii_case_insensitive)]
pub enum Region {
    #[strum(serialize = "Andhra Pradesh")]
    AndhraPradesh,
    #[strum(serialize = "Arunachal Pradesh")]
    ArunachalPradesh,
    Assam,
    Bihar,
    Chhattisgarh,
    Goa,
    Gujarat,
    Haryana,
    #[strum(serialize = "Himachal Pradesh")]
    HimachalPradesh,
    Jharkhand,
    Karnataka,
    Kerala,
    #[strum(serialize = "Madhya Pradesh")]
    MadhyaPradesh,
    Maharashtra,
    Manipur,
    Meghalaya,
    Mizoram,
    Nagaland,
    Odisha,
    Punjab,
    Rajasthan,
    Sikkim,
    #[strum(serialize = "Tamil Nadu")]
    TamilNadu,
    Telangana,
    Tripura,
    #[strum(serialize = "Uttar Pradesh")]
    UttarPradesh,
    Uttarakhand,
    #[strum(serialize = "West Bengal")]
    WestBengal,
    #[strum(serialize = "Andaman and Nicobar Islands")]
    AndamanAndNicobarIslands,
    Chandigarh,
    #[strum(serialize = "Dadra and Nagar Haveli and Daman and Diu")]
    DadraAndNagarHaveliAndDamanAndDiu,
    Delhi,
    #[strum(serialize = "Jammu and Kashmir")]
    JammuAndKashmir,
    Ladakh,
    Lakshadweep,
    Puducherry,
}

// Serialized as the human-readable name so the wire format matches what the
// backend and postal lookups exchange ("Tamil Nadu", not "TamilNadu").
impl Serialize for Region {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Region {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Mutable address draft owned by the checkout session until the shipping
/// phase is confirmed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    pub line1: String,
    #[serde(default)]
    pub line2: Option<String>,
    pub city: String,
    #[serde(default)]
    pub region: Option<Region>,
    pub postal_code: String,
    #[serde(default = "default_country")]
    pub country: String,
}

fn default_country() -> String {
    "IN".to_string()
}

impl Default for ShippingAddress {
    fn default() -> Self {
        Self {
            name: String::new(),
            phone: String::new(),
            email: None,
            line1: String::new(),
            line2: None,
            city: String::new(),
            region: None,
            postal_code: String::new(),
            country: default_country(),
        }
    }
}

impl ShippingAddress {
    pub fn has_valid_postal_code(&self) -> bool {
        POSTAL_CODE_PATTERN.is_match(&self.postal_code)
    }

    /// Field-level validation. Every failing field is reported so the host
    /// can highlight all of them at once.
    pub fn validate_fields(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();

        let name = self.name.trim();
        if name.is_empty() {
            errors.push("name", "Name is required");
        } else if name.len() > MAX_NAME_LENGTH {
            errors.push("name", "Name is too long");
        }

        if !MOBILE_PATTERN.is_match(self.phone.trim()) {
            errors.push("phone", "Enter a valid 10-digit mobile number");
        }

        if let Some(email) = self.email.as_deref().map(str::trim).filter(|e| !e.is_empty()) {
            if email.len() > MAX_EMAIL_LENGTH || !validate_email(email) {
                errors.push("email", "Enter a valid email address");
            }
        }

        if self.line1.trim().is_empty() {
            errors.push("line1", "Address is required");
        } else if self.line1.len() > MAX_ADDRESS_FIELD_LENGTH {
            errors.push("line1", "Address line is too long");
        }

        if self.city.trim().is_empty() {
            errors.push("city", "City is required");
        }

        if self.region.is_none() {
            errors.push("region", "Select a state");
        }

        if !self.has_valid_postal_code() {
            errors.push("postal_code", "Enter a valid 6-digit PIN code");
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
